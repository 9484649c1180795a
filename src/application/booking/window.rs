//! Daily booking window arithmetic.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};

use crate::config::ScheduleConfig;

/// The three daily instants that drive booking, in one fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct BookingWindow {
    offset: FixedOffset,
    wake: NaiveTime,
    open: NaiveTime,
    close: NaiveTime,
}

impl BookingWindow {
    pub fn new(offset: FixedOffset, wake: NaiveTime, open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            offset,
            wake,
            open,
            close,
        }
    }

    /// Returns `None` when the configured offset is out of range.
    pub fn from_config(config: &ScheduleConfig) -> Option<Self> {
        Some(Self::new(
            config.offset()?,
            config.wake_time,
            config.booking_open,
            config.booking_close,
        ))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date of `now`.
    pub fn today(&self, now: DateTime<FixedOffset>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    pub fn activation_at(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        self.at(date, self.wake)
    }

    pub fn opens_at(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        self.at(date, self.open)
    }

    pub fn closes_at(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        self.at(date, self.close)
    }

    /// Today's activation instant, or tomorrow's if today's has already passed.
    pub fn next_activation(&self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let target = self.activation_at(self.today(now));
        if now > target {
            target + Duration::days(1)
        } else {
            target
        }
    }

    fn at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<FixedOffset> {
        let utc = date.and_time(time) - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, self.offset)
    }
}
