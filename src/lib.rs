pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::path::Path;

use tracing::info;

use crate::commands::AppState;
use crate::config::TrackerConfig;
use crate::error::AppResult;

/// Builds the application state rooted at `data_dir`: config, logging,
/// database and the loaded tracker.
pub fn bootstrap(data_dir: &Path) -> AppResult<AppState> {
    std::fs::create_dir_all(data_dir)?;

    let config = TrackerConfig::load(data_dir);
    crate::utils::logger::init_logging(&config.logging_options(data_dir))?;

    let pool = crate::db::DbPool::new(config.database_path(data_dir))?;
    let state = AppState::new(pool, config.service_options())?;
    info!(data_dir = %data_dir.display(), "ratio tracker ready");

    Ok(state)
}
