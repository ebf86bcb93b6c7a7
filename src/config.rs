//! Open-time configuration for a SQLite connection

use serde::{Deserialize, Serialize};

/// SQLite journal modes accepted by `PRAGMA journal_mode`
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

/// Settings applied each time a connection opens its database
///
/// # Examples
///
/// ```
/// use sqlite_driver::{ConnectionConfig, JournalMode};
///
/// let config = ConnectionConfig {
///     journal_mode: Some(JournalMode::Wal),
///     ..Default::default()
/// };
/// assert!(config.extended_result_codes);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Report extended result codes instead of the primary ones
    ///
    /// Default: true
    pub extended_result_codes: bool,

    /// How long SQLite retries on a locked database before failing
    ///
    /// Default: None (fail immediately)
    pub busy_timeout_ms: Option<u32>,

    /// Enforce foreign key constraints
    ///
    /// Default: false
    pub foreign_keys: bool,

    /// Journal mode to switch to after opening
    ///
    /// Default: None (SQLite's own default)
    pub journal_mode: Option<JournalMode>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            extended_result_codes: true,
            busy_timeout_ms: None,
            foreign_keys: false,
            journal_mode: None,
        }
    }
}

impl ConnectionConfig {
    /// PRAGMA statements to run once the handle is open
    pub(crate) fn pragmas(&self) -> Vec<String> {
        let mut pragmas = Vec::new();
        if self.foreign_keys {
            pragmas.push("PRAGMA foreign_keys = ON".to_string());
        }
        if let Some(mode) = self.journal_mode {
            pragmas.push(format!("PRAGMA journal_mode = {}", mode.as_str()));
        }
        pragmas
    }
}
