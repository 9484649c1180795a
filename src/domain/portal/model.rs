//! Slots as the portal reports them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open time range `[start, end)` in seconds since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Touching spans (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Portal identifier of one bookable inventory item (one court for one
    /// time range). The unit of reservation.
    StockId
);
string_id!(
    /// Portal identifier of a physical court.
    CourtId
);
string_id!(
    /// Venue identifier the portal uses to scope queries.
    Site
);

/// One available (court, time range) pair returned by a slot query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub stock_id: StockId,
    pub court_id: CourtId,
    pub court_name: String,
    /// Display label such as `"08:00-09:00"`, used as the key of the booked map.
    pub time_label: String,
    pub span: Span,
}

/// Stock ids submitted in a single reserve call, each mapped to its court.
pub type BookingUnit = BTreeMap<StockId, CourtId>;
