//! The application-facing store.
//!
//! `Store` owns the single database connection for the process. It opens
//! the connection lazily on first use and holds it until [`Store::close`]
//! or drop. Each operation takes the lock for one unit of work.
//!
//! Every operation resolves to a value the caller can branch on. Storage
//! failures are logged and reported like a miss: `false`, `None` or an
//! empty list. Use [`Store::with_repository`] for the underlying error.

use crate::config::{StoreConfig, StoreLocation};
use crate::db::{AccountRepository, DbError, EventRepository, SqliteRepository};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::Mutex;
use tala_core::{Event, NewEvent, User, UserId};
use tracing::{error, info, warn};

pub struct Store {
    config: StoreConfig,
    repository: Mutex<Option<SqliteRepository>>,
}

impl Store {
    /// Create a store. Nothing is opened until the first operation.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            repository: Mutex::new(None),
        }
    }

    /// Transient store, mostly for tests.
    pub fn in_memory() -> Self {
        Self::new(StoreConfig::in_memory())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether the connection is currently open.
    pub fn is_open(&self) -> bool {
        self.repository
            .lock()
            .map(|repo| repo.is_some())
            .unwrap_or(false)
    }

    /// Release the connection. The next operation reopens it.
    pub fn close(&self) {
        match self.repository.lock() {
            Ok(mut repo) => {
                if repo.take().is_some() {
                    info!("Closed store");
                }
            }
            Err(_) => error!("Store lock poisoned while closing"),
        }
    }

    fn open_repository(config: &StoreConfig) -> Result<SqliteRepository, DbError> {
        let conn = match &config.location {
            StoreLocation::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
            StoreLocation::InMemory => Connection::open_in_memory()?,
        };

        let repo = SqliteRepository::from_connection(
            conn,
            config.password_hasher.clone(),
            config.schema_version,
        )?;
        info!(location = ?config.location, version = config.schema_version, "Opened store");
        Ok(repo)
    }

    /// Run `f` against the open repository, opening it first if needed.
    pub fn with_repository<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&SqliteRepository) -> Result<T, DbError>,
    {
        let mut guard = self.repository.lock().map_err(|_| DbError::LockPoisoned)?;
        if guard.is_none() {
            *guard = Some(Self::open_repository(&self.config)?);
        }
        match guard.as_ref() {
            Some(repo) => f(repo),
            None => Err(DbError::InvalidData("store is not open".to_string())),
        }
    }

    fn report<T>(&self, operation: &'static str, result: Result<T, DbError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) if err.is_constraint_violation() => {
                warn!(operation, error = %err, "Store write rejected");
                None
            }
            Err(err) => {
                error!(operation, error = %err, "Store operation failed");
                None
            }
        }
    }

    /// Create both tables if they are missing.
    pub fn initialize(&self) -> bool {
        let result = self.with_repository(|repo| repo.initialize());
        self.report("initialize", result).is_some()
    }

    /// Drop and recreate both tables, recording `new_version`.
    ///
    /// `new_version` must be the configured schema version. Recording any
    /// other version would make the next open upgrade again or refuse the
    /// file as a downgrade.
    pub fn upgrade(&self, old_version: i32, new_version: i32) -> bool {
        let configured = self.config.schema_version;
        let result = if new_version == configured {
            self.with_repository(|repo| repo.upgrade(old_version, new_version))
        } else {
            Err(DbError::VersionMismatch {
                requested: new_version,
                configured,
            })
        };
        self.report("upgrade", result).is_some()
    }

    pub fn schema_version(&self) -> Option<i32> {
        let result = self.with_repository(|repo| repo.schema_version());
        self.report("schema_version", result)
    }

    /// Register an account. `false` when the email is taken or on failure.
    pub fn create_user(&self, email: &str, username: &str, password: &str) -> bool {
        let result = self.with_repository(|repo| repo.create_user(email, username, password));
        self.report("create_user", result).is_some()
    }

    pub fn email_exists(&self, email: &str) -> bool {
        let result = self.with_repository(|repo| repo.email_exists(email));
        self.report("email_exists", result).unwrap_or(false)
    }

    pub fn check_credentials(&self, email: &str, password: &str) -> bool {
        self.get_user_id(email, password).is_some()
    }

    pub fn get_user_id(&self, email: &str, password: &str) -> Option<UserId> {
        let result = self.with_repository(|repo| repo.find_user_id(email, password));
        self.report("get_user_id", result).flatten()
    }

    pub fn get_user(&self, user_id: UserId) -> Option<User> {
        if !user_id.is_valid() {
            return None;
        }
        let result = self.with_repository(|repo| repo.get_user(user_id));
        self.report("get_user", result).flatten()
    }

    pub fn get_username(&self, user_id: UserId) -> Option<String> {
        self.get_user(user_id).map(|user| user.username)
    }

    pub fn get_email(&self, user_id: UserId) -> Option<String> {
        self.get_user(user_id).map(|user| user.email)
    }

    /// Schedule an event for `user_id`. The user is not required to exist.
    pub fn create_event(&self, user_id: UserId, event: &NewEvent) -> bool {
        let result = self.with_repository(|repo| repo.create_event(user_id, event));
        self.report("create_event", result).is_some()
    }

    pub fn events_on_date(&self, user_id: UserId, date: NaiveDate) -> Vec<Event> {
        let result = self.with_repository(|repo| repo.events_on_date(user_id, date));
        self.report("events_on_date", result).unwrap_or_default()
    }

    pub fn has_event_on_date(&self, user_id: UserId, date: NaiveDate) -> bool {
        let result = self.with_repository(|repo| repo.has_event_on_date(user_id, date));
        self.report("has_event_on_date", result).unwrap_or(false)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("location", &self.config.location)
            .field("schema_version", &self.config.schema_version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::SCHEMA_VERSION;
    use tala_core::PasswordHasher;

    fn store() -> Store {
        Store::new(
            StoreConfig::in_memory()
                .with_password_hasher(PasswordHasher::with_cost(1024, 1).unwrap()),
        )
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_store_is_shareable() {
        assert_send_sync::<Store>();
    }

    #[test]
    fn test_opens_lazily() {
        let store = store();
        assert!(!store.is_open());
        assert!(!store.email_exists("a@example.com"));
        assert!(store.is_open());
    }

    #[test]
    fn test_close_releases_connection() {
        let store = store();
        assert!(store.create_user("a@example.com", "A", "pw"));
        store.close();
        assert!(!store.is_open());

        // In-memory contents go away with the connection.
        assert!(!store.email_exists("a@example.com"));
        assert!(store.is_open());
    }

    #[test]
    fn test_invalid_user_id_short_circuits() {
        let store = store();
        assert_eq!(store.get_username(UserId::INVALID), None);
        assert_eq!(store.get_email(UserId(0)), None);
        assert!(!store.is_open());
    }

    #[test]
    fn test_open_failure_reports_negative_results() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file.
        let store = Store::new(StoreConfig::new(dir.path()));

        assert!(!store.create_user("a@example.com", "A", "pw"));
        assert!(!store.email_exists("a@example.com"));
        assert_eq!(store.get_user_id("a@example.com", "pw"), None);
        assert_eq!(store.schema_version(), None);
        assert!(!store.is_open());
    }

    #[test]
    fn test_with_repository_exposes_errors() {
        let store = store();
        store
            .with_repository(|repo| repo.create_user("a@example.com", "A", "pw"))
            .unwrap();

        let err = store
            .with_repository(|repo| repo.create_user("a@example.com", "B", "pw"))
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateEmail(_)));
    }

    #[test]
    fn test_upgrade_to_other_version_is_refused() {
        let store = store();
        assert!(store.create_user("a@example.com", "A", "pw"));

        assert!(!store.upgrade(SCHEMA_VERSION, SCHEMA_VERSION + 1));

        assert_eq!(store.schema_version(), Some(SCHEMA_VERSION));
        assert!(store.email_exists("a@example.com"));
    }

    #[test]
    fn test_debug_omits_hasher() {
        let rendered = format!("{:?}", store());
        assert!(rendered.contains("InMemory"));
        assert!(!rendered.contains("params"));
    }
}
