use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use super::KeyValueStore;
use crate::config::app_data_dir;
use crate::error::StorageError;

pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    pub fn open_default() -> Result<Self> {
        let path = default_db_path()?;
        Self::open(path)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create db dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("failed to open db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteKv {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, text],
        )?;
        Ok(())
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
PRAGMA journal_mode=WAL;
CREATE TABLE IF NOT EXISTS kv (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
"#,
    )
    .context("failed to initialize schema")?;
    Ok(())
}

fn default_db_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("state.sqlite"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sqlite_kv_round_trip() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut kv = SqliteKv::open(tmp.path()).unwrap();

        assert!(kv.load("appState").unwrap().is_none());
        kv.save("appState", &json!({"todos": []})).unwrap();
        kv.save("appState", &json!({"todos": [1]})).unwrap();
        assert_eq!(kv.load("appState").unwrap(), Some(json!({"todos": [1]})));
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.sqlite");
        {
            let mut kv = SqliteKv::open(&path).unwrap();
            kv.save("appStateFilters", &json!({"all": false, "open": true, "done": false}))
                .unwrap();
        }
        let kv = SqliteKv::open(&path).unwrap();
        let loaded = kv.load("appStateFilters").unwrap().unwrap();
        assert_eq!(loaded["open"], true);
    }

    #[test]
    fn corrupt_value_is_a_serde_error() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let kv = SqliteKv::open(tmp.path()).unwrap();
        kv.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES ('appState', 'not json {{{')",
                [],
            )
            .unwrap();
        assert!(matches!(kv.load("appState"), Err(StorageError::Serde(_))));
    }
}
