//! Reservation domain entity

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::portal::{Site, Span};

/// Date format used for target dates and due dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One desired contiguous span on the target day plus preferred court names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleBook {
    pub start_time_sec: i64,
    pub duration_sec: i64,
    #[serde(default)]
    pub court_name_preference: Vec<String>,
}

impl SingleBook {
    pub fn span(&self) -> Span {
        Span::new(self.start_time_sec, self.start_time_sec + self.duration_sec)
    }
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub date: NaiveDate,
    pub site: Site,
    /// Tried in order; the first preference that books anything wins.
    pub preferences: Vec<SingleBook>,
    /// Lower values are attempted first within an account.
    pub priority: i32,
}

/// Reservation status code, persisted as `0/1/2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ReservationStatusCode {
    Pending,
    Success,
    Failed,
}

impl From<ReservationStatusCode> for i32 {
    fn from(code: ReservationStatusCode) -> Self {
        match code {
            ReservationStatusCode::Pending => 0,
            ReservationStatusCode::Success => 1,
            ReservationStatusCode::Failed => 2,
        }
    }
}

impl TryFrom<i32> for ReservationStatusCode {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Success),
            2 => Ok(Self::Failed),
            other => Err(format!("unknown reservation status code {other}")),
        }
    }
}

/// Outcome of a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationStatus {
    pub code: ReservationStatusCode,
    pub msg: String,
    /// Booked time label -> court name.
    pub court_time: BTreeMap<String, String>,
}

impl ReservationStatus {
    pub fn pending() -> Self {
        Self {
            code: ReservationStatusCode::Pending,
            msg: String::new(),
            court_time: BTreeMap::new(),
        }
    }

    pub fn success(court_time: BTreeMap<String, String>) -> Self {
        Self {
            code: ReservationStatusCode::Success,
            msg: String::new(),
            court_time,
        }
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self {
            code: ReservationStatusCode::Failed,
            msg: msg.into(),
            court_time: BTreeMap::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.code != ReservationStatusCode::Pending
    }
}

/// A reservation about to be stored as Pending.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub net_id: String,
    pub secret: String,
    pub reservation: Reservation,
    pub reserve_on: NaiveDate,
}

/// A Pending reservation whose due date has arrived.
#[derive(Debug, Clone)]
pub struct DueReservation {
    pub id: i64,
    pub net_id: String,
    pub secret: String,
    pub reservation: Reservation,
}

/// A stored reservation as listed back to its owner.
#[derive(Debug, Clone)]
pub struct ReservationRecord {
    pub id: i64,
    pub reservation: Reservation,
    pub reserve_on: NaiveDate,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}
