//! Store configuration.

use crate::db::schema::{DATABASE_FILE_NAME, SCHEMA_VERSION};
use std::path::{Path, PathBuf};
use tala_core::PasswordHasher;
use thiserror::Error;

/// Environment variable naming the database file (`:memory:` for a
/// transient database).
pub const ENV_DB_PATH: &str = "TALA_DB_PATH";
/// Environment variable overriding the schema version.
pub const ENV_SCHEMA_VERSION: &str = "TALA_SCHEMA_VERSION";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid TALA_SCHEMA_VERSION {0:?}: expected a positive integer")]
    InvalidSchemaVersion(String),

    #[error("TALA_DB_PATH is set but empty")]
    EmptyDbPath,
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    /// Private to one connection. Closing the store discards it.
    InMemory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub schema_version: i32,
    pub password_hasher: PasswordHasher,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl StoreConfig {
    /// File-backed store at the current schema version.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            location: StoreLocation::File(path.as_ref().to_path_buf()),
            schema_version: SCHEMA_VERSION,
            password_hasher: PasswordHasher::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::InMemory,
            schema_version: SCHEMA_VERSION,
            password_hasher: PasswordHasher::default(),
        }
    }

    pub fn with_schema_version(mut self, schema_version: i32) -> Self {
        self.schema_version = schema_version;
        self
    }

    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self
    }

    /// Per-user data directory, falling back to the current directory.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tala")
            .join(DATABASE_FILE_NAME)
    }

    /// Build from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_DB_PATH) {
            Some(path) if path.trim().is_empty() => return Err(ConfigError::EmptyDbPath),
            Some(path) if path.trim() == ":memory:" => Self::in_memory(),
            Some(path) => Self::new(path.trim()),
            None => Self::default(),
        };

        if let Some(raw) = lookup(ENV_SCHEMA_VERSION) {
            config.schema_version = raw
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigError::InvalidSchemaVersion(raw))?;
        }

        Ok(config)
    }
}
