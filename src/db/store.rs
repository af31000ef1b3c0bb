use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::db::repositories::storage_repository::StorageRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::activity::{Activity, ActivityLog};

pub const KEY_ACTIVITIES: &str = "saved_activities";
pub const KEY_ACTIVITY_LOGS: &str = "saved_activity_logs";

/// Durable home of the two tracker collections.
///
/// Loads are fail-soft: a missing or undecodable entry comes back as an empty
/// collection. Only failures of the backing store itself are errors.
pub trait TrackerStore: Send + Sync {
    fn load_activities(&self) -> AppResult<Vec<Activity>>;
    fn load_logs(&self) -> AppResult<Vec<ActivityLog>>;
    fn save_activities(&self, activities: &[Activity]) -> AppResult<()>;
    fn save_logs(&self, logs: &[ActivityLog]) -> AppResult<()>;
}

pub struct SqliteTrackerStore {
    db: DbPool,
}

impl SqliteTrackerStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    fn read(&self, key: &str) -> AppResult<Option<String>> {
        let row = self
            .db
            .with_connection(|conn| StorageRepository::get(conn, key))?;
        Ok(row.map(|row| row.value))
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        self.db
            .with_connection(|conn| StorageRepository::upsert(conn, key, value))
    }
}

impl TrackerStore for SqliteTrackerStore {
    fn load_activities(&self) -> AppResult<Vec<Activity>> {
        Ok(decode_collection(KEY_ACTIVITIES, self.read(KEY_ACTIVITIES)?))
    }

    fn load_logs(&self) -> AppResult<Vec<ActivityLog>> {
        Ok(decode_collection(
            KEY_ACTIVITY_LOGS,
            self.read(KEY_ACTIVITY_LOGS)?,
        ))
    }

    fn save_activities(&self, activities: &[Activity]) -> AppResult<()> {
        self.write(KEY_ACTIVITIES, &encode_collection(activities)?)
    }

    fn save_logs(&self, logs: &[ActivityLog]) -> AppResult<()> {
        self.write(KEY_ACTIVITY_LOGS, &encode_collection(logs)?)
    }
}

/// Keeps the serialized collections in process memory.
#[derive(Default)]
pub struct MemoryTrackerStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTrackerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw value under `key`, bypassing serialization.
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) -> AppResult<()> {
        self.entries
            .lock()
            .map_err(|_| AppError::other("存储锁已损坏"))?
            .insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn raw(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| AppError::other("存储锁已损坏"))?
            .get(key)
            .cloned())
    }
}

impl TrackerStore for MemoryTrackerStore {
    fn load_activities(&self) -> AppResult<Vec<Activity>> {
        Ok(decode_collection(KEY_ACTIVITIES, self.raw(KEY_ACTIVITIES)?))
    }

    fn load_logs(&self) -> AppResult<Vec<ActivityLog>> {
        Ok(decode_collection(
            KEY_ACTIVITY_LOGS,
            self.raw(KEY_ACTIVITY_LOGS)?,
        ))
    }

    fn save_activities(&self, activities: &[Activity]) -> AppResult<()> {
        self.insert_raw(KEY_ACTIVITIES, encode_collection(activities)?)
    }

    fn save_logs(&self, logs: &[ActivityLog]) -> AppResult<()> {
        self.insert_raw(KEY_ACTIVITY_LOGS, encode_collection(logs)?)
    }
}

fn encode_collection<T: Serialize>(items: &[T]) -> AppResult<String> {
    Ok(serde_json::to_string(items)?)
}

fn decode_collection<T: DeserializeOwned>(key: &str, raw: Option<String>) -> Vec<T> {
    let Some(raw) = raw else {
        debug!(target: "app::store", key, "no stored collection");
        return Vec::new();
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => items,
        Err(err) => {
            warn!(
                target: "app::store",
                key,
                error = %err,
                "stored collection could not be decoded, starting empty"
            );
            Vec::new()
        }
    }
}
