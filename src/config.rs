//! Connection configuration applied as PRAGMAs right after a database is opened.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    Off,
    Normal,
    Full,
    Extra,
}

impl Synchronous {
    pub fn as_str(&self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
            Synchronous::Extra => "EXTRA",
        }
    }
}

/// Options for opening a [`Database`](crate::Database).
///
/// Every field has a default, so a partial JSON object such as
/// `{"foreignKeys": false}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseConfig {
    pub journal_mode: JournalMode,
    pub synchronous: Synchronous,
    /// Negative values are KiB, positive values are pages.
    pub cache_size: i64,
    pub temp_store_memory: bool,
    pub mmap_size: u64,
    pub foreign_keys: bool,
    pub busy_timeout_ms: Option<u64>,
    pub read_only: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            journal_mode: JournalMode::Wal,
            synchronous: Synchronous::Normal,
            cache_size: -64000,
            temp_store_memory: true,
            mmap_size: 268_435_456,
            foreign_keys: true,
            busy_timeout_ms: None,
            read_only: false,
        }
    }
}

impl DatabaseConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::Config(e.to_string()))
    }

    /// PRAGMA batch for a freshly opened connection.
    ///
    /// Journal and mmap settings only make sense for writable on-disk databases.
    pub fn pragmas(&self, in_memory: bool) -> String {
        let mut sql = String::new();
        if !in_memory && !self.read_only {
            let _ = writeln!(sql, "PRAGMA journal_mode = {};", self.journal_mode.as_str());
            let _ = writeln!(sql, "PRAGMA mmap_size = {};", self.mmap_size);
        }
        let _ = writeln!(sql, "PRAGMA synchronous = {};", self.synchronous.as_str());
        let _ = writeln!(sql, "PRAGMA cache_size = {};", self.cache_size);
        if self.temp_store_memory {
            sql.push_str("PRAGMA temp_store = MEMORY;\n");
        }
        let _ = writeln!(
            sql,
            "PRAGMA foreign_keys = {};",
            if self.foreign_keys { "ON" } else { "OFF" }
        );
        sql
    }
}
