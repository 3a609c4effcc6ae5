//! ISO-8601 calendar date helpers.
//!
//! Dates are persisted as `YYYY-MM-DD` text. That format sorts the same way
//! as the dates themselves, so range checks can compare the text directly.

use crate::error::{CoreError, Result};
use chrono::NaiveDate;

/// Storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` string.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| CoreError::InvalidDate {
        value: value.to_string(),
    })
}

/// Format a date for storage and queries.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
