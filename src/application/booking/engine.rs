//! Booking engine
//!
//! Drives one reservation from "window about to open" to a terminal status:
//!
//! 1. wait until the booking window opens,
//! 2. query available slots, retrying in place while the portal is not open,
//! 3. walk the preferences in order; the first one that books anything wins.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use super::matcher::choose_slots;
use super::splitter::{split_court_ranges, SplitConfig};
use super::window::BookingWindow;
use crate::domain::{
    BookingUnit, CaptchaSolver, PortalSession, Reservation, ReservationStatus,
    ReservationStatusCode, ReserveError, Site, Slot, StockId,
};
use crate::shared::observability::{BOOKINGS_TOTAL, BOOKING_DURATION_SECONDS, UNITS_TOTAL};
use crate::shared::{retry_with_backoff, RetryConfig, SharedClock};

pub const ALL_COURTS_UNAVAILABLE: &str = "All courts are unavailable";
pub const WINDOW_CLOSED: &str = "booking window closed";

pub struct BookingEngine {
    clock: SharedClock,
    window: BookingWindow,
    split: SplitConfig,
    open_poll: Duration,
    transient_retry: Duration,
}

impl BookingEngine {
    pub fn new(clock: SharedClock, window: BookingWindow, split: SplitConfig) -> Self {
        Self {
            clock,
            window,
            split,
            open_poll: Duration::from_secs(1),
            transient_retry: Duration::from_secs(1),
        }
    }

    pub fn with_polling(mut self, open_poll: Duration, transient_retry: Duration) -> Self {
        self.open_poll = open_poll;
        self.transient_retry = transient_retry;
        self
    }

    pub fn window(&self) -> &BookingWindow {
        &self.window
    }

    /// Book `reservation` with an authenticated session. Never fails: every
    /// outcome is expressed as a terminal [`ReservationStatus`].
    pub async fn book_now(
        &self,
        session: &dyn PortalSession,
        reservation: &Reservation,
        solver: &dyn CaptchaSolver,
    ) -> ReservationStatus {
        let today = self.window.today(self.clock.now());
        self.wait_for_open(today).await;

        let started = Instant::now();
        let status = self.drive(session, reservation, solver, today).await;

        let outcome = match status.code {
            ReservationStatusCode::Success => "success",
            _ => "failed",
        };
        counter!(BOOKINGS_TOTAL, "status" => outcome).increment(1);
        histogram!(BOOKING_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        status
    }

    async fn wait_for_open(&self, today: NaiveDate) {
        let opens = self.window.opens_at(today);
        if self.clock.now() < opens {
            debug!(%opens, "Waiting for booking window to open");
        }
        while self.clock.now() < opens {
            tokio::time::sleep(self.open_poll).await;
        }
    }

    async fn drive(
        &self,
        session: &dyn PortalSession,
        reservation: &Reservation,
        solver: &dyn CaptchaSolver,
        today: NaiveDate,
    ) -> ReservationStatus {
        let slots = match self.fetch_slots(session, reservation, today).await {
            Ok(slots) => slots,
            Err(e) => return ReservationStatus::failed(format!("GetAvailableCourts Error: {e}")),
        };
        debug!(
            date = %reservation.date,
            site = %reservation.site,
            available = slots.len(),
            "Fetched available slots"
        );

        for (index, preference) in reservation.preferences.iter().enumerate() {
            let chosen = choose_slots(&slots, preference);
            if chosen.is_empty() {
                debug!(preference = index, "No candidate slots");
                continue;
            }

            let units = split_court_ranges(&chosen, &self.split);
            let booked = self
                .reserve_units(session, &reservation.site, &chosen, &units, solver)
                .await;

            if !booked.is_empty() {
                info!(
                    date = %reservation.date,
                    site = %reservation.site,
                    preference = index,
                    booked = booked.len(),
                    "🎾 Courts booked"
                );
                return ReservationStatus::success(booked);
            }
        }

        ReservationStatus::failed(ALL_COURTS_UNAVAILABLE)
    }

    async fn fetch_slots(
        &self,
        session: &dyn PortalSession,
        reservation: &Reservation,
        today: NaiveDate,
    ) -> Result<Vec<Slot>, String> {
        let closes = self.window.closes_at(today);
        let result = retry_with_backoff(
            RetryConfig::polling(self.transient_retry),
            || session.list_available_slots(reservation.date, &reservation.site),
            |err: &ReserveError| err.is_transient() && self.clock.now() < closes,
            "list_available_slots",
        )
        .await;

        match result {
            Ok(slots) => Ok(slots),
            Err(e) if e.is_transient() => Err(WINDOW_CLOSED.to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Reserve each unit independently; returns `time label -> court name`
    /// for every slot of every unit that went through.
    async fn reserve_units(
        &self,
        session: &dyn PortalSession,
        site: &Site,
        chosen: &[&Slot],
        units: &[BookingUnit],
        solver: &dyn CaptchaSolver,
    ) -> BTreeMap<String, String> {
        let by_stock: HashMap<&StockId, &Slot> =
            chosen.iter().map(|&s| (&s.stock_id, s)).collect();

        let mut booked = BTreeMap::new();
        for unit in units {
            match session.reserve(site, unit, solver).await {
                Ok(()) => {
                    counter!(UNITS_TOTAL, "result" => "booked").increment(1);
                    for stock in unit.keys() {
                        if let Some(slot) = by_stock.get(stock) {
                            booked.insert(slot.time_label.clone(), slot.court_name.clone());
                        }
                    }
                }
                Err(e) => {
                    counter!(UNITS_TOTAL, "result" => "rejected").increment(1);
                    warn!(
                        site = %site,
                        stocks = unit.len(),
                        error = %e,
                        "Reserve call failed, continuing with remaining units"
                    );
                }
            }
        }
        booked
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::application::booking::testing::{label, slot, FakeSession, FakeSolver};
    use crate::config::ScheduleConfig;
    use crate::domain::SingleBook;
    use crate::shared::ManualClock;

    const H: i64 = 3600;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn engine_at(hms: (u32, u32, u32)) -> (Arc<BookingEngine>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at(day(), hms));
        let window = BookingWindow::from_config(&ScheduleConfig::default()).unwrap();
        let engine = BookingEngine::new(clock.clone(), window, SplitConfig::default());
        (Arc::new(engine), clock)
    }

    fn pref(start: i64, dur: i64, names: &[&str]) -> SingleBook {
        SingleBook {
            start_time_sec: start,
            duration_sec: dur,
            court_name_preference: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn reservation(preferences: Vec<SingleBook>) -> Reservation {
        Reservation {
            date: day().succ_opt().unwrap(),
            site: Site::new("gym"),
            preferences,
            priority: 0,
        }
    }

    #[tokio::test]
    async fn preferred_name_missing_books_what_is_available() {
        let (engine, _) = engine_at((8, 39, 55));
        let session = FakeSession::with_slots(vec![slot("s1", "c2", "A2", 10 * H, 11 * H)]);

        let status = engine
            .book_now(&session, &reservation(vec![pref(10 * H, H, &["A1"])]), &FakeSolver)
            .await;

        assert_eq!(status.code, ReservationStatusCode::Success);
        assert_eq!(status.court_time.len(), 1);
        assert_eq!(status.court_time[&label(10 * H, 11 * H)], "A2");
    }

    #[tokio::test]
    async fn nothing_matching_fails_after_single_pass() {
        let (engine, _) = engine_at((8, 39, 55));
        let session = FakeSession::with_slots(vec![slot("s1", "c1", "A1", 8 * H, 9 * H)]);

        let status = engine
            .book_now(
                &session,
                &reservation(vec![pref(18 * H, H, &[]), pref(20 * H, H, &[])]),
                &FakeSolver,
            )
            .await;

        assert_eq!(status.code, ReservationStatusCode::Failed);
        assert_eq!(status.msg, ALL_COURTS_UNAVAILABLE);
        assert!(status.court_time.is_empty());
        assert_eq!(session.queries.load(Ordering::SeqCst), 1);
        assert!(session.reserved().is_empty());
    }

    #[tokio::test]
    async fn partial_unit_failure_keeps_successful_units() {
        let (engine, _) = engine_at((8, 39, 55));
        let session = FakeSession::with_slots(vec![
            slot("s1", "c1", "A1", 8 * H, 9 * H),
            slot("s2", "c1", "A1", 9 * H, 10 * H),
            slot("s3", "c1", "A1", 10 * H, 11 * H),
            slot("s9", "c9", "B9", 19 * H, 20 * H),
        ])
        .failing(&["s1"]);

        let status = engine
            .book_now(
                &session,
                &reservation(vec![pref(8 * H, 3 * H, &[]), pref(19 * H, H, &[])]),
                &FakeSolver,
            )
            .await;

        assert_eq!(status.code, ReservationStatusCode::Success);
        assert_eq!(status.court_time.len(), 1);
        assert_eq!(status.court_time[&label(10 * H, 11 * H)], "A1");

        // {s1, s2} then {s3}; the second preference is never attempted.
        let calls = session.reserved();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].len(), 2);
        assert!(calls
            .iter()
            .all(|u| !u.contains_key(&StockId::new("s9"))));
    }

    #[tokio::test]
    async fn zero_bookings_falls_through_to_next_preference() {
        let (engine, _) = engine_at((8, 39, 55));
        let mut session = FakeSession::with_slots(vec![
            slot("s1", "c1", "A1", 8 * H, 9 * H),
            slot("s9", "c9", "B9", 19 * H, 20 * H),
        ]);
        session.failing_stocks = HashSet::from([StockId::new("s1")]);

        let status = engine
            .book_now(
                &session,
                &reservation(vec![pref(8 * H, H, &[]), pref(19 * H, H, &[])]),
                &FakeSolver,
            )
            .await;

        assert_eq!(status.code, ReservationStatusCode::Success);
        assert_eq!(status.court_time[&label(19 * H, 20 * H)], "B9");
        assert_eq!(session.reserved().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn not_open_yet_is_retried_in_place() {
        let (engine, _) = engine_at((8, 39, 55));
        let mut session = FakeSession::with_slots(vec![slot("s1", "c1", "A1", 8 * H, 9 * H)]);
        session.not_open_for = 3;

        let status = engine
            .book_now(&session, &reservation(vec![pref(8 * H, H, &[])]), &FakeSolver)
            .await;

        assert_eq!(status.code, ReservationStatusCode::Success);
        assert_eq!(session.queries.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn retrying_stops_when_window_closes() {
        let (engine, clock) = engine_at((21, 39, 40));
        let mut session = FakeSession::with_slots(vec![slot("s1", "c1", "A1", 8 * H, 9 * H)]);
        session.not_open_for = usize::MAX;
        session.clock = Some(clock.clone());
        session.clock_step = 5;

        let status = engine
            .book_now(&session, &reservation(vec![pref(8 * H, H, &[])]), &FakeSolver)
            .await;

        assert_eq!(status.code, ReservationStatusCode::Failed);
        assert_eq!(status.msg, "GetAvailableCourts Error: booking window closed");
        assert_eq!(session.queries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_query_error_fails_reservation() {
        let (engine, _) = engine_at((9, 0, 0));
        let mut session = FakeSession::default();
        session.query_error = Some(ReserveError::Rejected("site closed".into()));

        let status = engine
            .book_now(&session, &reservation(vec![pref(8 * H, H, &[])]), &FakeSolver)
            .await;

        assert_eq!(status.code, ReservationStatusCode::Failed);
        assert_eq!(
            status.msg,
            "GetAvailableCourts Error: rejected by portal: site closed"
        );
        assert_eq!(session.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_window_to_open() {
        let (engine, clock) = engine_at((8, 39, 0));
        let session = Arc::new(FakeSession::with_slots(vec![slot(
            "s1", "c1", "A1", 8 * H, 9 * H,
        )]));

        let task = {
            let engine = engine.clone();
            let session = session.clone();
            tokio::spawn(async move {
                engine
                    .book_now(
                        session.as_ref(),
                        &reservation(vec![pref(8 * H, H, &[])]),
                        &FakeSolver,
                    )
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(session.queries.load(Ordering::SeqCst), 0);

        clock.advance(ChronoDuration::seconds(55));
        let status = task.await.unwrap();
        assert_eq!(status.code, ReservationStatusCode::Success);
    }
}
