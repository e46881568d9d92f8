//! Remote statistics store over HTTP.
//!
//! Documents live at `{endpoint}/statistics/{user_id}`. `GET` returns the
//! document (404 when absent) and `PATCH` merges the sent fields into it.

use reqwest::{Client, StatusCode};

use super::{StatsRecord, DEFAULT_RECORD};
use crate::error::ExportError;

pub struct HttpStatsStore {
    endpoint: String,
    http_client: Client,
}

impl HttpStatsStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }

    fn url(&self, user_id: &str) -> String {
        format!("{}/statistics/{}", self.endpoint, user_id)
    }

    pub async fn fetch(&self, user_id: &str) -> Result<Option<StatsRecord>, ExportError> {
        let resp = self.http_client.get(self.url(user_id)).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let doc: serde_json::Value = resp.json().await?;
        if doc.is_null() {
            return Ok(None);
        }
        Ok(Some(StatsRecord {
            total_time_studied: doc
                .get("totalTimeStudied")
                .and_then(|v| v.as_str())
                .unwrap_or("00:00:00")
                .to_string(),
        }))
    }

    pub async fn merge(&self, user_id: &str, record: &StatsRecord) -> Result<(), ExportError> {
        let resp = self
            .http_client
            .patch(self.url(user_id))
            .json(record)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Same two steps as [`super::export_completion`], against the remote
    /// store.
    pub async fn export_completion(
        &self,
        user_id: &str,
        record: &StatsRecord,
        elapsed_secs: u64,
    ) -> Result<StatsRecord, ExportError> {
        self.merge(user_id, record).await?;

        let previous = self
            .fetch(DEFAULT_RECORD)
            .await?
            .map(|r| r.secs())
            .unwrap_or(0);
        let aggregate = StatsRecord::from_secs(previous.saturating_add(elapsed_secs));
        self.merge(DEFAULT_RECORD, &aggregate).await?;
        tracing::info!(user_id, total = %record.total_time_studied, "statistics exported");
        Ok(aggregate)
    }
}
