use std::sync::Arc;

use ratio_tracker_lib::bootstrap;
use ratio_tracker_lib::config::config_path;
use ratio_tracker_lib::db::repositories::storage_repository::StorageRepository;
use ratio_tracker_lib::db::store::{SqliteTrackerStore, TrackerStore, KEY_ACTIVITIES, KEY_ACTIVITY_LOGS};
use ratio_tracker_lib::db::DbPool;
use ratio_tracker_lib::error::AppResult;
use ratio_tracker_lib::models::activity::ActivityDraft;
use ratio_tracker_lib::services::activity_service::{ActivityService, ActivityServiceOptions};
use tempfile::TempDir;

#[test]
fn bootstrap_seeds_and_reloads_state() -> AppResult<()> {
    let temp_dir = TempDir::new()?;

    let state = bootstrap(temp_dir.path())?;
    let service = state.activities();
    let activities = service.list_activities()?;
    assert_eq!(activities.len(), 3);
    assert_eq!(activities[0].name, "Gaming");
    assert_eq!(activities[0].ratio, 1);
    assert_eq!(activities[1].ratio, 2);
    assert_eq!(activities[2].ratio, 3);

    service.log_activity("Gaming")?;
    service.delete_activity(&activities[1].id)?;
    drop(state);

    let reopened = bootstrap(temp_dir.path())?;
    let service = reopened.activities();
    assert_eq!(service.list_activities()?.len(), 2);
    assert_eq!(service.recent_logs(None)?.len(), 1);
    assert!(temp_dir.path().join("ratio_tracker.sqlite").exists());

    Ok(())
}

#[test]
fn corrupt_collections_fall_back_to_empty() -> AppResult<()> {
    let temp_dir = TempDir::new()?;
    let pool = DbPool::new(temp_dir.path().join("corrupt.sqlite"))?;
    pool.with_connection(|conn| {
        StorageRepository::upsert(conn, KEY_ACTIVITIES, "not json")?;
        StorageRepository::upsert(conn, KEY_ACTIVITY_LOGS, r#"[{"id": 1}]"#)
    })?;

    let store = Arc::new(SqliteTrackerStore::new(pool));
    let service = ActivityService::load(
        store.clone(),
        ActivityServiceOptions {
            seed_default_activities: false,
            ..Default::default()
        },
    )?;
    assert!(service.list_activities()?.is_empty());
    assert!(service.recent_logs(None)?.is_empty());

    // the next mutation rewrites the damaged entry
    service.create_activity(ActivityDraft {
        name: "Reading".to_string(),
        ratio: 1,
        color: None,
    })?;
    assert_eq!(store.load_activities()?.len(), 1);

    Ok(())
}

#[test]
fn config_file_controls_seeding_and_database_name() -> AppResult<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        config_path(temp_dir.path()),
        r#"{ "databaseFile": "custom.sqlite", "seedDefaultActivities": false, "recentLogsLimit": 1 }"#,
    )?;

    let state = bootstrap(temp_dir.path())?;
    let service = state.activities();
    assert!(service.list_activities()?.is_empty());
    assert!(temp_dir.path().join("custom.sqlite").exists());

    service.log_activity("Walk")?;
    service.log_activity("Walk")?;
    assert_eq!(service.recent_logs(None)?.len(), 1);

    Ok(())
}
