//! Repository pattern for database access.
//!
//! Every method here is fallible and reports the precise [`DbError`]. The
//! [`crate::Store`] facade turns these into the negative results callers
//! branch on.

use crate::db::error::DbError;
use crate::db::migrations;
use crate::db::schema::{CONNECTION_PRAGMAS, SCHEMA_VERSION, TABLE_EVENTS, TABLE_USERS};
use chrono::NaiveDate;
use rusqlite::{ffi, params, Connection, OptionalExtension};
use std::path::Path;
use tala_core::{format_date, parse_date, Event, EventId, NewEvent, PasswordHasher, User, UserId};
use tracing::{debug, warn};

type Result<T> = std::result::Result<T, DbError>;

/// Rows of `user_id` covering the date in `?2`. Stored dates must be
/// canonical `YYYY-MM-DD`, so both event queries see the same rows.
const EVENTS_ON_DATE_FILTER: &str = "user_id = ?1
    AND ?2 BETWEEN start_date AND end_date
    AND date(start_date) IS start_date
    AND date(end_date) IS end_date";

/// Repository for account operations.
pub trait AccountRepository {
    /// Insert a user, hashing `password`. Fails with
    /// [`DbError::DuplicateEmail`] when the email is taken.
    fn create_user(&self, email: &str, username: &str, password: &str) -> Result<UserId>;
    fn email_exists(&self, email: &str) -> Result<bool>;
    /// Id of the user whose email matches and whose password verifies.
    fn find_user_id(&self, email: &str, password: &str) -> Result<Option<UserId>>;
    fn get_user(&self, user_id: UserId) -> Result<Option<User>>;
}

/// Repository for calendar event operations.
pub trait EventRepository {
    fn create_event(&self, user_id: UserId, event: &NewEvent) -> Result<EventId>;
    /// Events of `user_id` whose inclusive date range contains `date`.
    fn events_on_date(&self, user_id: UserId, date: NaiveDate) -> Result<Vec<Event>>;
    fn has_event_on_date(&self, user_id: UserId, date: NaiveDate) -> Result<bool>;
}

/// Event row as stored, dates still in text form.
struct EventRow {
    event_id: i64,
    user_id: i64,
    title: String,
    start_date: String,
    end_date: String,
    start_time: String,
    end_time: String,
}

impl EventRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            event_id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            start_date: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            end_date: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            start_time: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            end_time: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        })
    }

    fn into_event(self) -> Result<Event> {
        Ok(Event {
            event_id: EventId(self.event_id),
            user_id: UserId(self.user_id),
            title: self.title,
            start_date: parse_date(&self.start_date)?,
            end_date: parse_date(&self.end_date)?,
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }
}

/// SQLite implementation of repositories.
pub struct SqliteRepository {
    conn: Connection,
    hasher: PasswordHasher,
}

impl SqliteRepository {
    /// Open database at path, creating the file and schema if necessary.
    pub fn open<P: AsRef<Path>>(
        path: P,
        hasher: PasswordHasher,
        schema_version: i32,
    ) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, hasher, schema_version)
    }

    /// Open in-memory database at the current schema version (for testing).
    pub fn open_in_memory(hasher: PasswordHasher) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, hasher, SCHEMA_VERSION)
    }

    /// Configure `conn` and bring its schema to `schema_version`.
    pub fn from_connection(
        conn: Connection,
        hasher: PasswordHasher,
        schema_version: i32,
    ) -> Result<Self> {
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        migrations::run_migrations(&conn, schema_version)?;
        Ok(Self { conn, hasher })
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> Result<i32> {
        migrations::user_version(&self.conn)
    }

    /// Create both tables if missing.
    pub fn initialize(&self) -> Result<()> {
        migrations::initialize(&self.conn)
    }

    /// Destructive upgrade: every row in both tables is discarded.
    pub fn upgrade(&self, old_version: i32, new_version: i32) -> Result<()> {
        migrations::upgrade(&self.conn, old_version, new_version)
    }

    /// Column names of `table`, empty when it does not exist.
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        migrations::table_columns(&self.conn, table)
    }

    /// Number of rows in `table`.
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let sql = match table {
            TABLE_USERS => "SELECT COUNT(*) FROM users",
            TABLE_EVENTS => "SELECT COUNT(*) FROM events",
            other => return Err(DbError::InvalidData(format!("unknown table: {}", other))),
        };
        self.conn.query_row(sql, [], |row| row.get(0)).map_err(Into::into)
    }
}

impl AccountRepository for SqliteRepository {
    fn create_user(&self, email: &str, username: &str, password: &str) -> Result<UserId> {
        let password_hash = self.hasher.hash(password)?;
        let inserted = self.conn.execute(
            "INSERT INTO users (email, username, password) VALUES (?1, ?2, ?3)",
            params![email, username, password_hash],
        );

        match inserted {
            Ok(_) => {
                let user_id = UserId(self.conn.last_insert_rowid());
                debug!(%user_id, "Created user");
                Ok(user_id)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(DbError::DuplicateEmail(email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn email_exists(&self, email: &str) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                params![email],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    fn find_user_id(&self, email: &str, password: &str) -> Result<Option<UserId>> {
        let row: Option<(i64, Option<String>)> = self
            .conn
            .query_row(
                "SELECT user_id, password FROM users WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.and_then(|(user_id, stored)| {
            stored
                .filter(|stored| self.hasher.verify(password, stored))
                .map(|_| UserId(user_id))
        }))
    }

    fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        if !user_id.is_valid() {
            return Ok(None);
        }

        self.conn
            .query_row(
                "SELECT user_id, email, username FROM users WHERE user_id = ?1",
                params![user_id.0],
                |row| {
                    Ok(User {
                        user_id: UserId(row.get(0)?),
                        email: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        username: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

impl EventRepository for SqliteRepository {
    fn create_event(&self, user_id: UserId, event: &NewEvent) -> Result<EventId> {
        self.conn.execute(
            "INSERT INTO events (user_id, title, start_date, end_date, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id.0,
                event.title,
                format_date(event.start_date),
                format_date(event.end_date),
                event.start_time,
                event.end_time,
            ],
        )?;
        let event_id = EventId(self.conn.last_insert_rowid());
        debug!(%user_id, %event_id, "Created event");
        Ok(event_id)
    }

    fn events_on_date(&self, user_id: UserId, date: NaiveDate) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT event_id, user_id, title, start_date, end_date, start_time, end_time
             FROM events
             WHERE {}
             ORDER BY start_date, start_time, event_id",
            EVENTS_ON_DATE_FILTER
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params![user_id.0, format_date(date)], EventRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let events = rows
            .into_iter()
            .filter_map(|row| {
                let event_id = row.event_id;
                match row.into_event() {
                    Ok(event) => Some(event),
                    Err(err) => {
                        warn!(event_id, error = %err, "Skipping event with unreadable dates");
                        None
                    }
                }
            })
            .collect();

        Ok(events)
    }

    fn has_event_on_date(&self, user_id: UserId, date: NaiveDate) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM events WHERE {})",
            EVENTS_ON_DATE_FILTER
        );
        self.conn
            .query_row(
                &sql,
                params![user_id.0, format_date(date)],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
