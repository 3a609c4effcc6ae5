//! Error types for tala-core.

use thiserror::Error;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the domain helpers.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<argon2::password_hash::Error> for CoreError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(err.to_string())
    }
}
