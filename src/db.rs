use std::{collections::HashMap, fs, path::Path, path::PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;

const DB_FILE_NAME: &str = "dairy.sqlite";

/// String-keyed blob storage. The ledger keeps one JSON value per collection.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

pub fn db_path(data_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)?;
    Ok(data_dir.join(DB_FILE_NAME))
}

pub fn open_connection(data_dir: &Path) -> Result<Connection> {
    let path = db_path(data_dir)?;
    Ok(Connection::open(path)?)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL,
          updated_ts_utc INTEGER NOT NULL
        );",
    )?;
    Ok(())
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let conn = open_connection(data_dir)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_ts_utc) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_ts_utc = excluded.updated_ts_utc",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM kv", [])?;
        Ok(())
    }
}

/// Volatile store for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
