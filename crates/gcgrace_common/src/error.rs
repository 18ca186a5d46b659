use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error classification for retry decisions.
///
/// - `UserError`: the database rejected the statement or the table; retrying
///   the same statement will fail the same way
/// - `Transient`: connection loss or timeout; the caller MAY retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserError,
    Transient,
}

/// A descriptor that cannot be applied. Always fatal: raised before any
/// statement reaches the cluster.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("keyspace name is empty")]
    EmptyKeyspace,

    #[error("keyspace '{0}' is not a valid CQL identifier")]
    InvalidKeyspace(String),

    #[error("descriptor contains no alterations")]
    NoAlterations,

    #[error("alteration #{index}: table name is empty")]
    EmptyTableName { index: usize },

    #[error("alteration #{index}: table '{table}' is not a valid CQL identifier")]
    InvalidTableName { index: usize, table: String },

    #[error("alteration #{index}: table '{table}' already declared by alteration #{first}")]
    DuplicateTable {
        index: usize,
        table: String,
        first: usize,
    },

    #[error("alteration #{index} ({table}): unknown compaction class '{class}'")]
    UnknownCompactionClass {
        index: usize,
        table: String,
        class: String,
    },

    #[error("alteration #{index} ({table}): min_threshold must be >= 1, got {value}")]
    MinThresholdTooSmall {
        index: usize,
        table: String,
        value: i64,
    },

    #[error("alteration #{index} ({table}): {field} {value} exceeds the CQL int range")]
    OutOfRange {
        index: usize,
        table: String,
        field: &'static str,
        value: i64,
    },

    #[error(
        "alteration #{index} ({table}): max_threshold {max} must be >= 2 and >= min_threshold {min}"
    )]
    MaxThresholdBelowMin {
        index: usize,
        table: String,
        min: i64,
        max: i64,
    },

    #[error("alteration #{index} ({table}): gc_grace_seconds must be >= 0, got {value}")]
    NegativeGcGrace {
        index: usize,
        table: String,
        value: i64,
    },

    #[error("alteration #{index} ({table}): tombstone_threshold must be within 0.0..=1.0, got {value}")]
    TombstoneThresholdOutOfRange {
        index: usize,
        table: String,
        value: String,
    },
}

/// Failure to obtain a descriptor from a file or the embedded default.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read descriptor {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse TOML descriptor: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("cannot parse JSON descriptor: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid descriptor: {0}")]
    Validation(#[from] ValidationError),
}

/// Per-table execution failure. Recorded on the table's result; never aborts
/// the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("statement timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("statement rejected: {0}")]
    Rejected(String),
}

impl ApplyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) | Self::Timeout(_) => ErrorKind::Transient,
            Self::Rejected(_) => ErrorKind::UserError,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}
