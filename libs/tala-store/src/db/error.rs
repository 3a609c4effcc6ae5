//! Database error types.

use tala_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaDowngrade { found: i32, supported: i32 },

    #[error("cannot upgrade to schema version {requested}: store is configured for version {configured}")]
    VersionMismatch { requested: i32, configured: i32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl DbError {
    /// Whether the error came from a SQLite constraint (UNIQUE, NOT NULL, CHECK, trigger).
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::DuplicateEmail(_) => true,
            Self::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}
