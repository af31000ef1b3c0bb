use crate::models::activity::{ActivityLog, LogRow};

use super::{AppState, CommandError, CommandResult};

pub fn activity_log(state: &AppState, name: String) -> CommandResult<ActivityLog> {
    state
        .activities()
        .log_activity(&name)
        .map_err(CommandError::from)
}

pub fn logs_recent(state: &AppState, limit: Option<usize>) -> CommandResult<Vec<LogRow>> {
    state
        .activities()
        .recent_log_rows(limit)
        .map_err(CommandError::from)
}

pub fn logs_search(
    state: &AppState,
    query: String,
    limit: Option<usize>,
) -> CommandResult<Vec<LogRow>> {
    state
        .activities()
        .search_log_rows(&query, limit)
        .map_err(CommandError::from)
}

pub fn logs_delete(state: &AppState, id: String) -> CommandResult<ActivityLog> {
    state
        .activities()
        .delete_log(&id)
        .map_err(CommandError::from)
}

pub fn logs_purge_all(state: &AppState) -> CommandResult<usize> {
    state
        .activities()
        .purge_all_logs()
        .map_err(CommandError::from)
}
