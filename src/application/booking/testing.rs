//! Fakes shared by the booking tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};

use crate::domain::{
    AuthError, BookingUnit, CaptchaError, CaptchaSolver, CourtId, DomainError, DomainResult,
    DueReservation, NewReservation, Portal, PortalSession, Reservation, ReservationRecord,
    ReservationRepository, ReservationStatus, ReservationStatusCode, ReserveError, SingleBook,
    Site, Slot, Span, StockId,
};
use crate::shared::{ManualClock, PaginationParams};

use super::engine::BookingEngine;
use super::splitter::SplitConfig;
use super::window::BookingWindow;
use crate::config::ScheduleConfig;

pub fn slot(stock: &str, court: &str, name: &str, start: i64, end: i64) -> Slot {
    Slot {
        stock_id: StockId::new(stock),
        court_id: CourtId::new(court),
        court_name: name.to_string(),
        time_label: label(start, end),
        span: Span::new(start, end),
    }
}

/// `"08:00-09:00"` style label.
pub fn label(start: i64, end: i64) -> String {
    let hm = |s: i64| format!("{:02}:{:02}", s / 3600, (s % 3600) / 60);
    format!("{}-{}", hm(start), hm(end))
}

pub struct FakeSolver;

#[async_trait]
impl CaptchaSolver for FakeSolver {
    async fn solve(&self, _challenge: &[u8]) -> Result<String, CaptchaError> {
        Ok("0000".to_string())
    }
}

#[derive(Default)]
pub struct FakeSession {
    pub slots: Vec<Slot>,
    /// Number of queries answered with `NotOpenYet` before slots are returned.
    pub not_open_for: usize,
    pub query_error: Option<ReserveError>,
    /// Any unit containing one of these stock ids is rejected.
    pub failing_stocks: HashSet<StockId>,
    /// Advanced by `clock_step` on every query.
    pub clock: Option<Arc<ManualClock>>,
    /// Seconds.
    pub clock_step: i64,

    pub queries: AtomicUsize,
    pub reserve_calls: Mutex<Vec<BookingUnit>>,
}

impl FakeSession {
    pub fn with_slots(slots: Vec<Slot>) -> Self {
        Self {
            slots,
            ..Default::default()
        }
    }

    pub fn failing(mut self, stocks: &[&str]) -> Self {
        self.failing_stocks = stocks.iter().map(|s| StockId::new(*s)).collect();
        self
    }

    pub fn reserved(&self) -> Vec<BookingUnit> {
        self.reserve_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortalSession for FakeSession {
    async fn list_available_slots(
        &self,
        _date: NaiveDate,
        _site: &Site,
    ) -> Result<Vec<Slot>, ReserveError> {
        let n = self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(clock) = &self.clock {
            clock.advance(Duration::seconds(self.clock_step));
        }
        if let Some(err) = &self.query_error {
            return Err(err.clone());
        }
        if n < self.not_open_for {
            return Err(ReserveError::NotOpenYet);
        }
        Ok(self.slots.clone())
    }

    async fn reserve(
        &self,
        _site: &Site,
        unit: &BookingUnit,
        solver: &dyn CaptchaSolver,
    ) -> Result<(), ReserveError> {
        solver.solve(b"challenge").await?;
        self.reserve_calls.lock().unwrap().push(unit.clone());
        if unit.keys().any(|k| self.failing_stocks.contains(k)) {
            return Err(ReserveError::Rejected("court taken".into()));
        }
        Ok(())
    }
}

pub struct FakePortal {
    pub session: Arc<FakeSession>,
    pub reject_login: bool,
    pub lookahead: u32,
    pub logins: Mutex<Vec<(String, String)>>,
}

impl FakePortal {
    pub fn new(session: FakeSession) -> Self {
        Self {
            session: Arc::new(session),
            reject_login: false,
            lookahead: 0,
            logins: Mutex::new(Vec::new()),
        }
    }

    pub fn login_count(&self) -> usize {
        self.logins.lock().unwrap().len()
    }
}

#[async_trait]
impl Portal for FakePortal {
    fn version(&self) -> &str {
        "fake-1.0"
    }

    fn login_url(&self) -> &str {
        "https://portal.test/login"
    }

    fn lookahead_days(&self, _site: &Site) -> u32 {
        self.lookahead
    }

    fn captcha_solver(&self, _challenge_url: &str) -> Arc<dyn CaptchaSolver> {
        Arc::new(FakeSolver)
    }

    async fn authenticate(
        &self,
        _login_url: &str,
        account_id: &str,
        secret: &str,
    ) -> Result<Arc<dyn PortalSession>, AuthError> {
        self.logins
            .lock()
            .unwrap()
            .push((account_id.to_string(), secret.to_string()));
        if self.reject_login {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(self.session.clone())
    }
}

struct Row {
    id: i64,
    new: NewReservation,
    status: ReservationStatus,
}

/// Vec-backed repository with the same Pending-only update rule as SQLite.
#[derive(Default)]
pub struct InMemoryReservations {
    rows: Mutex<Vec<Row>>,
    next_id: AtomicUsize,
    /// `find_due` calls still to be answered with a storage error.
    find_due_failures: AtomicUsize,
    /// Ids whose status writes fail.
    failing_updates: Mutex<HashSet<i64>>,
}

impl InMemoryReservations {
    pub fn fail_next_find_due(&self, times: usize) {
        self.find_due_failures.store(times, Ordering::SeqCst);
    }

    pub fn fail_updates_for(&self, id: i64) {
        self.failing_updates.lock().unwrap().insert(id);
    }

    pub fn status_of(&self, id: i64) -> Option<ReservationStatus> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.status.clone())
    }

    pub fn reserve_on_of(&self, id: i64) -> Option<NaiveDate> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.new.reserve_on)
    }

    fn record(row: &Row) -> ReservationRecord {
        ReservationRecord {
            id: row.id,
            reservation: row.new.reservation.clone(),
            reserve_on: row.new.reserve_on,
            status: row.status.clone(),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservations {
    async fn insert_pending(&self, reservation: NewReservation) -> DomainResult<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let mut rows = self.rows.lock().unwrap();
        rows.push(Row {
            id,
            new: reservation,
            status: ReservationStatus::pending(),
        });
        Ok(id)
    }

    async fn find_due(&self, date: NaiveDate) -> DomainResult<Vec<DueReservation>> {
        let failing = self
            .find_due_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DomainError::Storage("database is locked".into()));
        }
        let rows = self.rows.lock().unwrap();
        let mut due: Vec<&Row> = rows
            .iter()
            .filter(|r| r.new.reserve_on == date && !r.status.is_terminal())
            .collect();
        due.sort_by_key(|r| (r.new.reservation.priority, r.id));
        Ok(due
            .into_iter()
            .map(|r| DueReservation {
                id: r.id,
                net_id: r.new.net_id.clone(),
                secret: r.new.secret.clone(),
                reservation: r.new.reservation.clone(),
            })
            .collect())
    }

    async fn update_status(&self, id: i64, status: &ReservationStatus) -> DomainResult<bool> {
        if self.failing_updates.lock().unwrap().contains(&id) {
            return Err(DomainError::Storage("disk I/O error".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) if row.status.code == ReservationStatusCode::Pending => {
                row.status = status.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_if_pending(&self, net_id: &str, id: i64) -> DomainResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| !(r.id == id && r.new.net_id == net_id && !r.status.is_terminal()));
        Ok((before - rows.len()) as u64)
    }

    async fn count_for_account(&self, net_id: &str) -> DomainResult<u64> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|r| r.new.net_id == net_id).count() as u64)
    }

    async fn list_for_account(
        &self,
        net_id: &str,
        page: PaginationParams,
    ) -> DomainResult<Vec<ReservationRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .rev()
            .filter(|r| r.new.net_id == net_id)
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(Self::record)
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<ReservationRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.id == id).map(Self::record))
    }
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

pub fn engine(clock: Arc<ManualClock>) -> Arc<BookingEngine> {
    let window = BookingWindow::from_config(&ScheduleConfig::default()).unwrap();
    Arc::new(BookingEngine::new(clock, window, SplitConfig::default()))
}

pub fn pref(start: i64, dur: i64, names: &[&str]) -> SingleBook {
    SingleBook {
        start_time_sec: start,
        duration_sec: dur,
        court_name_preference: names.iter().map(|n| n.to_string()).collect(),
    }
}

pub fn new_reservation(net_id: &str, priority: i32, start: i64) -> NewReservation {
    NewReservation {
        net_id: net_id.to_string(),
        secret: format!("{net_id}-stored"),
        reservation: Reservation {
            date: day().succ_opt().unwrap(),
            site: Site::new("gym"),
            preferences: vec![pref(start, 3600, &[])],
            priority,
        },
        reserve_on: day(),
    }
}
