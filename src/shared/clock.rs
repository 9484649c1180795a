//! Wall-clock source.
//!
//! All scheduling is done in one fixed local offset. Injecting the clock lets
//! tests pin "now" to an exact instant around the booking window.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

pub type SharedClock = Arc<dyn Clock>;

/// System time rendered in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Converts a configured offset in minutes east of UTC.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

#[cfg(test)]
pub use manual::ManualClock;
