//! Core calendar library shared by the local store and its callers.
//!
//! Provides:
//! - Shared types (User, Event, NewEvent, ids)
//! - ISO-8601 date parsing and formatting
//! - Argon2id password hashing

pub mod credentials;
pub mod dates;
pub mod error;
pub mod types;

pub use credentials::PasswordHasher;
pub use dates::{format_date, parse_date, DATE_FORMAT};
pub use error::{CoreError, Result};
pub use types::{Event, EventId, NewEvent, User, UserId};
