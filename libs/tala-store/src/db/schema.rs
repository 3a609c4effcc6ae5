//! SQLite schema definitions.

/// File name of the on-device database.
pub const DATABASE_FILE_NAME: &str = "Tala.db";

/// Current schema version. Recorded in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

pub const TABLE_USERS: &str = "users";
pub const TABLE_EVENTS: &str = "events";

/// Connection settings applied on every open.
///
/// The bundled SQLite enables foreign key enforcement by default. The
/// `events.user_id` reference is declared only, so enforcement is off.
pub const CONNECTION_PRAGMAS: &str = r#"
PRAGMA foreign_keys = OFF;
"#;

/// Complete schema for the local database.
pub const SCHEMA: &str = r#"
-- Accounts
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT UNIQUE,
    username TEXT,
    password TEXT
);

-- Calendar events, dates as YYYY-MM-DD
CREATE TABLE IF NOT EXISTS events (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    title TEXT,
    start_date TEXT,
    end_date TEXT,
    start_time TEXT,
    end_time TEXT,
    FOREIGN KEY(user_id) REFERENCES users(user_id)
);
"#;

/// Destructive reset used by schema upgrades.
pub const DROP_ALL: &str = r#"
DROP TABLE IF EXISTS events;
DROP TABLE IF EXISTS users;
"#;
