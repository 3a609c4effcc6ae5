//! Common test utilities and fixtures for integration tests.
//!
//! Provides a `TestContext` holding a file-backed store in a temporary
//! directory, plus small helpers for dates and accounts.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use tala_core::{PasswordHasher, UserId};
use tala_store::{Store, StoreConfig};
use tempfile::TempDir;

/// Cheap hashing so tests stay fast.
pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::with_cost(1024, 1).expect("valid argon2 cost")
}

pub fn date(s: &str) -> NaiveDate {
    tala_core::parse_date(s).expect("valid test date")
}

/// A store backed by a database file that lives as long as the context.
pub struct TestContext {
    pub store: Store,
    dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_schema_version(tala_store::SCHEMA_VERSION)
    }

    pub fn with_schema_version(version: i32) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = Store::new(Self::config_for(&dir, version));
        Self { store, dir }
    }

    fn config_for(dir: &TempDir, version: i32) -> StoreConfig {
        StoreConfig::new(dir.path().join(tala_store::DATABASE_FILE_NAME))
            .with_schema_version(version)
            .with_password_hasher(test_hasher())
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join(tala_store::DATABASE_FILE_NAME)
    }

    /// A second store on the same file, as a later app launch would see it.
    pub fn reopen(&self, version: i32) -> Store {
        Store::new(Self::config_for(&self.dir, version))
    }

    /// Register a user and log them in, returning their id.
    pub fn sign_up(&self, email: &str, username: &str, password: &str) -> UserId {
        assert!(self.store.create_user(email, username, password));
        self.store
            .get_user_id(email, password)
            .expect("freshly created user logs in")
    }
}
