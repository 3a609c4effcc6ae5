//! Core types for the calendar application.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a user row.
///
/// Ids are assigned by the store and are always positive. Anything else,
/// including [`UserId::INVALID`], never matches a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Placeholder for "no logged-in user".
    pub const INVALID: UserId = UserId(-1);

    /// Whether this id could have been assigned by the store.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered account. The password hash is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    pub username: String,
}

/// Event fields supplied by the caller when scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

impl NewEvent {
    /// Create an event spanning `start_date..=end_date`.
    ///
    /// Date order is not checked; a reversed range is stored as given and
    /// simply never matches a date.
    pub fn new(
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            start_date,
            end_date,
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Single-day event.
    pub fn on_day(
        title: impl Into<String>,
        date: NaiveDate,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self::new(title, date, date, start_time, end_time)
    }
}

/// A stored calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub user_id: UserId,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

impl Event {
    /// Whether `date` falls inside the event's inclusive date range.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Number of calendar days covered, zero for a reversed range.
    pub fn span_days(&self) -> i64 {
        let days = (self.end_date - self.start_date).num_days();
        if days < 0 {
            0
        } else {
            days + 1
        }
    }
}
