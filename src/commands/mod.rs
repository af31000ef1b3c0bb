pub mod activity;
pub mod logs;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::error;

use crate::db::store::{SqliteTrackerStore, TrackerStore};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::activity_service::{ActivityService, ActivityServiceOptions};

#[derive(Clone)]
pub struct AppState {
    activity_service: Arc<ActivityService>,
}

impl AppState {
    pub fn new(db_pool: DbPool, options: ActivityServiceOptions) -> AppResult<Self> {
        let store: Arc<dyn TrackerStore> = Arc::new(SqliteTrackerStore::new(db_pool));
        let activity_service = Arc::new(ActivityService::load(store, options)?);

        Ok(Self { activity_service })
    }

    pub fn activities(&self) -> Arc<ActivityService> {
        Arc::clone(&self.activity_service)
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::InvalidActivity { message } => {
                CommandError::new("INVALID_ACTIVITY", message, None)
            }
            AppError::NotFound => CommandError::new("NOT_FOUND", "请求的资源不存在", None),
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "序列化失败", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "文件系统读写失败", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_activity_maps_to_its_own_code() {
        let error: CommandError = AppError::invalid_activity("活动比例必须大于 0").into();
        assert_eq!(error.code, "INVALID_ACTIVITY");
        assert_eq!(error.message, "活动比例必须大于 0");
        assert!(error.details.is_none());
    }

    #[test]
    fn not_found_serializes_without_details() {
        let error: CommandError = AppError::not_found().into();
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("details").is_none());
    }
}
