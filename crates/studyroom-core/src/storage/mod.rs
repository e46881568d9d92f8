mod config;
pub mod database;

pub use config::{AnalyticsConfig, ChannelConfig, Config, TimerConfig, VoiceConfig};
pub use database::{Database, PersistedState, SessionRecord, ViewState};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `STUDYROOM_HOME` overrides the location entirely. Otherwise
/// `~/.config/studyroom[-dev]/`, with `STUDYROOM_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("STUDYROOM_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studyroom-dev")
            } else {
                base_dir.join("studyroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
