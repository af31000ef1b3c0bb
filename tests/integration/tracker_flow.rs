use ratio_tracker_lib::commands::activity::{
    activities_create, activities_delete, activities_list, activities_update, activity_counts,
    activity_overview, activity_suggestion, ActivityCreatePayload, ActivityUpdatePayload,
};
use ratio_tracker_lib::commands::logs::{activity_log, logs_purge_all, logs_recent, logs_search};
use ratio_tracker_lib::commands::AppState;
use ratio_tracker_lib::db::DbPool;
use ratio_tracker_lib::services::activity_service::ActivityServiceOptions;
use tempfile::tempdir;

fn setup_state() -> (AppState, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("flow.sqlite")).expect("db pool");
    let state = AppState::new(
        pool,
        ActivityServiceOptions {
            seed_default_activities: false,
            ..Default::default()
        },
    )
    .expect("app state");
    (state, dir)
}

fn create(state: &AppState, name: &str, ratio: i64) -> String {
    let payload: ActivityCreatePayload =
        serde_json::from_value(serde_json::json!({ "name": name, "ratio": ratio }))
            .expect("payload");
    activities_create(state, payload).expect("create activity").id
}

#[test]
fn suggestion_follows_the_largest_deficit() {
    let (state, _dir) = setup_state();
    create(&state, "A", 1);
    create(&state, "B", 1);

    assert!(activity_suggestion(&state).expect("suggestion").is_none());

    for _ in 0..3 {
        activity_log(&state, "B".to_string()).expect("log");
    }

    let counts = activity_counts(&state).expect("counts");
    assert_eq!(counts[0].target_count, 2);
    assert_eq!(counts[1].target_count, 2);
    assert_eq!(counts[0].deficit, 2);

    let suggested = activity_suggestion(&state).expect("suggestion").expect("some");
    assert_eq!(suggested.name, "A");

    activity_log(&state, "A".to_string()).expect("log");
    activity_log(&state, "A".to_string()).expect("log");
    // 5 logs: targets ceil(5/2) = 3 each, A=2 and B=3
    let overview = activity_overview(&state).expect("overview");
    assert_eq!(overview.total_logs, 5);
    assert_eq!(overview.suggested.map(|a| a.name), Some("A".to_string()));
}

#[test]
fn balanced_history_has_no_suggestion() {
    let (state, _dir) = setup_state();
    for (name, ratio) in [("A", 1), ("B", 2), ("C", 3)] {
        create(&state, name, ratio);
    }
    for (name, times) in [("A", 1), ("B", 2), ("C", 3)] {
        for _ in 0..times {
            activity_log(&state, name.to_string()).expect("log");
        }
    }

    let overview = activity_overview(&state).expect("overview");
    assert!(overview.balanced);
    assert!(overview.suggested.is_none());
    assert!(overview.counts.iter().all(|count| count.is_on_target));
}

#[test]
fn delete_activity_cascades_logs() {
    let (state, _dir) = setup_state();
    let gaming = create(&state, "Gaming", 1);
    create(&state, "Music Making", 2);
    activity_log(&state, "Gaming".to_string()).expect("log");
    activity_log(&state, "Music Making".to_string()).expect("log");

    activities_delete(&state, gaming.clone()).expect("delete");

    let remaining = logs_recent(&state, None).expect("recent");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].log.activity_name, "Music Making");

    let err = activities_delete(&state, gaming).unwrap_err();
    assert_eq!(err.code, "NOT_FOUND");
}

#[test]
fn update_validates_and_preserves_position() {
    let (state, _dir) = setup_state();
    create(&state, "A", 1);
    let b = create(&state, "B", 1);
    create(&state, "C", 1);

    let bad: ActivityUpdatePayload =
        serde_json::from_value(serde_json::json!({ "ratio": 0 })).expect("payload");
    let err = activities_update(&state, b.clone(), bad).unwrap_err();
    assert_eq!(err.code, "INVALID_ACTIVITY");

    let good: ActivityUpdatePayload =
        serde_json::from_value(serde_json::json!({ "name": "Bee", "color": "#DDA0DD" }))
            .expect("payload");
    activities_update(&state, b, good).expect("update");

    let names: Vec<String> = activities_list(&state)
        .expect("list")
        .into_iter()
        .map(|activity| activity.name)
        .collect();
    assert_eq!(names, vec!["A", "Bee", "C"]);
}

#[test]
fn logging_and_searching_history() {
    let (state, _dir) = setup_state();
    create(&state, "Music Making", 2);

    let first = activity_log(&state, "Music Making".to_string()).expect("log");
    let unknown = activity_log(&state, "Unlisted".to_string()).expect("log");

    let latest = logs_recent(&state, Some(1)).expect("recent");
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].log, unknown);

    let hits = logs_search(&state, "music".to_string(), None).expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].log, first);

    assert_eq!(logs_purge_all(&state).expect("purge"), 2);
    assert!(logs_recent(&state, None).expect("recent").is_empty());
}
