//! Local persistence for Tala accounts and calendar events.
//!
//! Provides:
//! - SQLite schema and its destructive version upgrade
//! - Fallible repositories for users and events
//! - The fail-safe [`Store`] facade used by application code
//! - Configuration and tracing setup

pub mod config;
pub mod db;
pub mod store;
pub mod telemetry;

pub use config::{ConfigError, StoreConfig, StoreLocation};
pub use db::schema::{DATABASE_FILE_NAME, SCHEMA_VERSION};
pub use db::{AccountRepository, DbError, EventRepository, SqliteRepository};
pub use store::Store;
pub use telemetry::init_tracing;
