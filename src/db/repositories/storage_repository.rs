use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct StorageRow {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

impl TryFrom<&Row<'_>> for StorageRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            key: row.get("key")?,
            value: row.get("value")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Key-value rows holding serialized collections.
pub struct StorageRepository;

impl StorageRepository {
    pub fn get(conn: &Connection, key: &str) -> AppResult<Option<StorageRow>> {
        let mut stmt =
            conn.prepare("SELECT key, value, updated_at FROM app_storage WHERE key = ?1")?;

        let row = stmt
            .query_row([key], |row| StorageRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn upsert(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO app_storage (key, value)
                VALUES (:key, :value)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {":key": key, ":value": value},
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("../schema.sql")).unwrap();
        conn
    }

    #[test]
    fn upsert_overwrites_existing_value() {
        let conn = setup();
        StorageRepository::upsert(&conn, "saved_activities", "[]").unwrap();
        StorageRepository::upsert(&conn, "saved_activities", "[1]").unwrap();

        let row = StorageRepository::get(&conn, "saved_activities")
            .unwrap()
            .unwrap();
        assert_eq!(row.key, "saved_activities");
        assert_eq!(row.value, "[1]");
        assert!(!row.updated_at.is_empty());
    }

    #[test]
    fn missing_key_is_none() {
        let conn = setup();
        StorageRepository::upsert(&conn, "saved_activities", "[]").unwrap();
        assert!(StorageRepository::get(&conn, "saved_activity_logs")
            .unwrap()
            .is_none());
    }
}
