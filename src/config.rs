use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::services::activity_service::ActivityServiceOptions;
use crate::services::ratio_tracker::DEFAULT_RECENT_LOGS_LIMIT;
use crate::utils::logger::LoggingOptions;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    #[serde(default = "default_database_file")]
    pub database_file: String,
    #[serde(default = "default_recent_logs_limit")]
    pub recent_logs_limit: usize,
    #[serde(default = "default_seed")]
    pub seed_default_activities: bool,
    /// Overrides the built-in log filter when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_directives: Option<String>,
    #[serde(default = "default_console_log")]
    pub console_log: bool,
}

fn default_database_file() -> String {
    "ratio_tracker.sqlite".to_string()
}

fn default_recent_logs_limit() -> usize {
    DEFAULT_RECENT_LOGS_LIMIT
}

fn default_seed() -> bool {
    true
}

fn default_console_log() -> bool {
    true
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            recent_logs_limit: default_recent_logs_limit(),
            seed_default_activities: default_seed(),
            log_directives: None,
            console_log: default_console_log(),
        }
    }
}

impl TrackerConfig {
    /// Reads `config.json` from `data_dir`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load(data_dir: &Path) -> Self {
        let path = config_path(data_dir);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    target: "app::config",
                    path = %path.display(),
                    error = %err,
                    "invalid config file, using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }

    /// Logs go to `<data_dir>/logs`.
    pub fn logging_options(&self, data_dir: &Path) -> LoggingOptions {
        LoggingOptions {
            directives: self.log_directives.clone(),
            console: self.console_log,
            ..LoggingOptions::new(data_dir.join("logs"))
        }
    }

    pub fn service_options(&self) -> ActivityServiceOptions {
        ActivityServiceOptions {
            seed_default_activities: self.seed_default_activities,
            recent_logs_limit: self.recent_logs_limit,
        }
    }
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}
