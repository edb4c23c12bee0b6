//! Runtime configuration values.
//!
//! # Responsibility
//! - Carry logging, connection and table-naming settings as plain values.
//! - Validate user-supplied names at the boundary.
//!
//! # Invariants
//! - A constructed `TableName` always satisfies `TABLE_NAME_PATTERN`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Alphanumeric, starting with a letter, 3 to 63 characters.
pub const TABLE_NAME_PATTERN: &str = "^[A-Za-z][A-Za-z0-9]{2,62}$";

const DEFAULT_MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_LOG_FILES: usize = 5;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TABLE_NAME_PATTERN).expect("table name pattern is valid"));

/// Rolling file logger settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error` (case-insensitive).
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    pub max_file_bytes: u64,
    pub max_files: usize,
}

impl LoggingConfig {
    pub fn new(level: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: level.into(),
            log_dir: log_dir.into(),
            max_file_bytes: DEFAULT_MAX_LOG_FILE_SIZE_BYTES,
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }
}

/// SQLite connection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbConfig {
    pub busy_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Invalid table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNameError(pub String);

impl Display for TableNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid table name `{}`; expected {TABLE_NAME_PATTERN}",
            self.0
        )
    }
}

impl Error for TableNameError {}

/// Validated logical table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self, TableNameError> {
        let name = name.into();
        if TABLE_NAME_RE.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(TableNameError(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{DbConfig, LoggingConfig, TableName};
    use std::time::Duration;

    #[test]
    fn table_name_accepts_alphanumeric_names() {
        assert_eq!(
            TableName::new("Customers2024").unwrap().as_str(),
            "Customers2024"
        );
    }

    #[test]
    fn table_name_rejects_bad_shapes() {
        let too_long = "x".repeat(64);
        for bad in ["ab", "1abc", "has-dash", "", too_long.as_str()] {
            assert!(TableName::new(bad).is_err(), "`{bad}` should be rejected");
        }
    }

    #[test]
    fn defaults_are_stable() {
        let logging = LoggingConfig::new("info", "/tmp/logs");
        assert_eq!(logging.max_files, 5);
        assert_eq!(logging.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(DbConfig::default().busy_timeout, Duration::from_secs(5));
    }
}
