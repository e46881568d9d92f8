//! Analytics export.
//!
//! After every completed session a `{ "totalTimeStudied": "HH:MM:SS" }`
//! record is merged into the user's statistics document (other fields in
//! the document are left alone). A shared `default` document accumulates
//! elapsed time across sessions.
//!
//! [`StatsStore`] is implemented by the local [`Database`]; the optional
//! remote store lives in [`http`].

pub mod http;

pub use http::HttpStatsStore;

use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, ExportError};
use crate::stats::format::{format_hms, parse_hms};
use crate::storage::Database;

/// Aggregate document every completed session adds to.
pub const DEFAULT_RECORD: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    #[serde(rename = "totalTimeStudied")]
    pub total_time_studied: String,
}

impl StatsRecord {
    pub fn from_secs(total_secs: u64) -> Self {
        Self {
            total_time_studied: format_hms(total_secs),
        }
    }

    pub fn secs(&self) -> u64 {
        parse_hms(&self.total_time_studied)
    }
}

/// A keyed store of statistics documents.
pub trait StatsStore {
    /// Current record for `user_id`, if any.
    fn fetch(&self, user_id: &str) -> Result<Option<StatsRecord>, ExportError>;

    /// Merge `record`'s fields into the document for `user_id`, creating it
    /// if needed.
    fn merge(&self, user_id: &str, record: &StatsRecord) -> Result<(), ExportError>;
}

/// Export one completed session: the user's running total, then the
/// `default` aggregate (previous value + `elapsed_secs`).
pub fn export_completion<S: StatsStore + ?Sized>(
    store: &S,
    user_id: &str,
    record: &StatsRecord,
    elapsed_secs: u64,
) -> Result<StatsRecord, ExportError> {
    store.merge(user_id, record)?;

    let previous = store.fetch(DEFAULT_RECORD)?.map(|r| r.secs()).unwrap_or(0);
    let aggregate = StatsRecord::from_secs(previous.saturating_add(elapsed_secs));
    store.merge(DEFAULT_RECORD, &aggregate)?;
    Ok(aggregate)
}

/// Merge the fields of `record` into `doc` (a JSON object, or absent).
pub(crate) fn merge_document(
    user_id: &str,
    doc: Option<&str>,
    record: &StatsRecord,
) -> Result<serde_json::Value, ExportError> {
    let mut doc = match doc {
        Some(raw) => serde_json::from_str(raw)?,
        None => serde_json::Value::Object(serde_json::Map::new()),
    };
    let fields = serde_json::to_value(record)?;
    let (Some(target), Some(fields)) = (doc.as_object_mut(), fields.as_object()) else {
        return Err(ExportError::MalformedRecord {
            user_id: user_id.to_string(),
        });
    };
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
    Ok(doc)
}

impl StatsStore for Database {
    fn fetch(&self, user_id: &str) -> Result<Option<StatsRecord>, ExportError> {
        let Some(raw) = self.statistics_get(user_id).map_err(DatabaseError::from)? else {
            return Ok(None);
        };
        let doc: serde_json::Value = serde_json::from_str(&raw)?;
        // Documents without the field read as zero time.
        Ok(Some(StatsRecord {
            total_time_studied: doc
                .get("totalTimeStudied")
                .and_then(|v| v.as_str())
                .unwrap_or("00:00:00")
                .to_string(),
        }))
    }

    fn merge(&self, user_id: &str, record: &StatsRecord) -> Result<(), ExportError> {
        let existing = self
            .statistics_get(user_id)
            .map_err(DatabaseError::from)?;
        let doc = merge_document(user_id, existing.as_deref(), record)?;
        self.statistics_put(user_id, &doc.to_string())
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}
