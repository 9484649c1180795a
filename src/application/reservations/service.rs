//! Reservation service
//!
//! Placement decides the due date ("reserve on") of a new reservation and
//! whether it should be booked right away because today's window is already
//! running. Everything else waits for the wake scheduler.

use std::sync::Arc;

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::application::accounts::AccountRegistry;
use crate::application::booking::{AccountBatch, AccountOrchestrator, BookingWindow};
use crate::domain::reservation::DATE_FORMAT;
use crate::domain::{
    Account, DomainError, DomainResult, DueReservation, NewReservation, Reservation,
    ReservationRecord, ReservationRepository, SingleBook, Site,
};
use crate::shared::{PaginatedResult, PaginationParams, SharedClock};

pub type ReservationPage = PaginatedResult<ReservationRecord>;

/// A reservation request as submitted by a web user.
#[derive(Debug, Clone)]
pub struct PlaceReservation {
    /// `YYYY-MM-DD`
    pub date: String,
    pub site: String,
    pub preferences: Vec<SingleBook>,
    pub priority: i32,
}

/// Where a new reservation lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub reserve_on: NaiveDate,
    /// Book immediately instead of waiting for the next wake-up.
    pub run_now: bool,
}

pub fn parse_date(date: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| DomainError::MalformedData("Invalid date".into()))
}

/// Decide the due date of a reservation for `date` placed at `now`.
///
/// The due date is `date - lookahead`. Once that day's activation has passed
/// the reservation is due today while today's window is still open, and
/// tomorrow otherwise.
pub fn plan(
    window: &BookingWindow,
    now: DateTime<FixedOffset>,
    date: NaiveDate,
    lookahead_days: u32,
) -> DomainResult<Placement> {
    let today = window.today(now);
    if date < today {
        return Err(DomainError::MalformedData("Invalid date".into()));
    }
    let due = date
        .checked_sub_days(Days::new(u64::from(lookahead_days)))
        .ok_or_else(|| DomainError::MalformedData("Invalid date".into()))?;

    if now < window.activation_at(due) {
        return Ok(Placement {
            reserve_on: due,
            run_now: false,
        });
    }

    if now < window.closes_at(today) {
        Ok(Placement {
            reserve_on: today,
            run_now: now >= window.activation_at(today),
        })
    } else {
        let tomorrow = today
            .succ_opt()
            .ok_or_else(|| DomainError::MalformedData("Invalid date".into()))?;
        Ok(Placement {
            reserve_on: tomorrow,
            run_now: false,
        })
    }
}

pub struct ReservationService {
    clock: SharedClock,
    window: BookingWindow,
    reservations: Arc<dyn ReservationRepository>,
    accounts: Arc<AccountRegistry>,
    orchestrator: Option<Arc<AccountOrchestrator>>,
    tasks: TaskTracker,
}

impl ReservationService {
    pub fn new(
        clock: SharedClock,
        window: BookingWindow,
        reservations: Arc<dyn ReservationRepository>,
        accounts: Arc<AccountRegistry>,
        orchestrator: Option<Arc<AccountOrchestrator>>,
        tasks: TaskTracker,
    ) -> Self {
        Self {
            clock,
            window,
            reservations,
            accounts,
            orchestrator,
            tasks,
        }
    }

    /// Store a new Pending reservation for `user` and return its id.
    pub async fn place(&self, user: &str, request: PlaceReservation) -> DomainResult<i64> {
        let account = self.account(user).await?;
        let date = parse_date(&request.date)?;
        if request.preferences.iter().any(|p| p.duration_sec <= 0 || p.start_time_sec < 0) {
            return Err(DomainError::MalformedData("Invalid preference".into()));
        }

        let site = Site::new(request.site);
        let lookahead = self
            .orchestrator
            .as_ref()
            .map(|o| o.portal().lookahead_days(&site))
            .unwrap_or(0);
        let placement = plan(&self.window, self.clock.now(), date, lookahead)?;

        let reservation = Reservation {
            date,
            site,
            preferences: request.preferences,
            priority: request.priority,
        };
        let id = self
            .reservations
            .insert_pending(NewReservation {
                net_id: account.net_id.clone(),
                secret: account.net_id_password.clone(),
                reservation: reservation.clone(),
                reserve_on: placement.reserve_on,
            })
            .await?;

        info!(
            reservation_id = id,
            user,
            %date,
            reserve_on = %placement.reserve_on,
            run_now = placement.run_now,
            "📝 Reservation placed"
        );

        if placement.run_now {
            self.dispatch_now(DueReservation {
                id,
                net_id: account.net_id,
                secret: account.net_id_password,
                reservation,
            });
        }
        Ok(id)
    }

    fn dispatch_now(&self, due: DueReservation) {
        match &self.orchestrator {
            Some(orchestrator) => {
                let orchestrator = orchestrator.clone();
                self.tasks
                    .spawn(async move { orchestrator.run(AccountBatch::single(due)).await });
            }
            None => debug!(reservation_id = due.id, "No portal configured, leaving Pending"),
        }
    }

    /// Delete a reservation of `user` that is still Pending.
    pub async fn cancel(&self, user: &str, id: i64) -> DomainResult<()> {
        let account = self.account(user).await?;
        let deleted = self.reservations.delete_if_pending(&account.net_id, id).await?;
        if deleted == 0 {
            return Err(DomainError::InvalidQuery("No matching reservation".into()));
        }
        info!(reservation_id = id, user, "Reservation cancelled");
        Ok(())
    }

    /// Reservations of `user`'s portal account, newest first.
    pub async fn list(&self, user: &str, page: PaginationParams) -> DomainResult<ReservationPage> {
        let account = self.account(user).await?;
        let total = self.reservations.count_for_account(&account.net_id).await?;
        let items = self
            .reservations
            .list_for_account(&account.net_id, page)
            .await?;
        Ok(PaginatedResult::new(items, total, page))
    }

    async fn account(&self, user: &str) -> DomainResult<Account> {
        self.accounts
            .find(user)
            .await
            .ok_or(DomainError::AccountNotFound)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::application::accounts::registry::tests::{plain, registry_with};
    use crate::application::booking::testing::{
        day, engine, pref, slot, FakePortal, FakeSession, FakeSolver, InMemoryReservations,
    };
    use crate::config::ScheduleConfig;
    use crate::domain::ReservationStatusCode;
    use crate::shared::ManualClock;

    const H: i64 = 3600;

    fn window() -> BookingWindow {
        BookingWindow::from_config(&ScheduleConfig::default()).unwrap()
    }

    fn local(d: NaiveDate, h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .from_local_datetime(&d.and_hms_opt(h, m, s).unwrap())
            .single()
            .unwrap()
    }

    fn plus(days: u64) -> NaiveDate {
        day().checked_add_days(Days::new(days)).unwrap()
    }

    #[test]
    fn past_dates_are_rejected() {
        let err = plan(&window(), local(day(), 7, 0, 0), day().pred_opt().unwrap(), 0).unwrap_err();
        assert!(matches!(err, DomainError::MalformedData(ref m) if m == "Invalid date"));
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("2024-05-01").is_ok());
    }

    #[test]
    fn future_due_date_waits_for_scheduler() {
        let p = plan(&window(), local(day(), 12, 0, 0), plus(5), 2).unwrap();
        assert_eq!(
            p,
            Placement {
                reserve_on: plus(3),
                run_now: false
            }
        );
    }

    #[test]
    fn due_today_inside_window_runs_now() {
        let p = plan(&window(), local(day(), 12, 0, 0), plus(2), 2).unwrap();
        assert_eq!(
            p,
            Placement {
                reserve_on: day(),
                run_now: true
            }
        );
    }

    #[test]
    fn due_today_before_activation_waits_for_wake_up() {
        let p = plan(&window(), local(day(), 8, 0, 0), plus(2), 2).unwrap();
        assert_eq!(
            p,
            Placement {
                reserve_on: day(),
                run_now: false
            }
        );
    }

    #[test]
    fn overdue_before_activation_lands_today() {
        let p = plan(&window(), local(day(), 8, 0, 0), plus(1), 2).unwrap();
        assert_eq!(
            p,
            Placement {
                reserve_on: day(),
                run_now: false
            }
        );
    }

    #[test]
    fn after_close_rolls_to_tomorrow() {
        let p = plan(&window(), local(day(), 22, 0, 0), plus(2), 2).unwrap();
        assert_eq!(
            p,
            Placement {
                reserve_on: plus(1),
                run_now: false
            }
        );
    }

    struct Fixture {
        portal: Arc<FakePortal>,
        repo: Arc<InMemoryReservations>,
        tasks: TaskTracker,
        service: ReservationService,
    }

    async fn fixture(hms: (u32, u32, u32), lookahead: u32) -> Fixture {
        let clock = Arc::new(ManualClock::at(day(), hms));
        let mut portal = FakePortal::new(FakeSession::with_slots(vec![slot(
            "s8", "c1", "A1", 8 * H, 9 * H,
        )]));
        portal.lookahead = lookahead;
        let portal = Arc::new(portal);
        let repo = Arc::new(InMemoryReservations::default());
        let tasks = TaskTracker::new();
        let (registry, _) = registry_with(vec![
            plain("alice", "pw", "n1", "s1"),
            plain("bob", "pw", "n2", "s2"),
        ])
        .await;
        let registry = Arc::new(registry);

        let engine = engine(clock.clone());
        let orchestrator = Arc::new(AccountOrchestrator::new(
            portal.clone(),
            engine.clone(),
            repo.clone(),
            registry.clone(),
            Arc::new(FakeSolver),
        ));
        let service = ReservationService::new(
            clock,
            *engine.window(),
            repo.clone(),
            registry,
            Some(orchestrator),
            tasks.clone(),
        );
        Fixture {
            portal,
            repo,
            tasks,
            service,
        }
    }

    fn request(date: NaiveDate, priority: i32) -> PlaceReservation {
        PlaceReservation {
            date: date.format(DATE_FORMAT).to_string(),
            site: "gym".into(),
            preferences: vec![pref(8 * H, H, &["A1"])],
            priority,
        }
    }

    #[tokio::test]
    async fn placing_inside_window_books_immediately() {
        let f = fixture((8, 39, 55), 1).await;

        let id = f.service.place("alice", request(plus(1), 0)).await.unwrap();
        f.tasks.close();
        f.tasks.wait().await;

        assert_eq!(f.repo.reserve_on_of(id), Some(day()));
        let status = f.repo.status_of(id).unwrap();
        assert_eq!(status.code, ReservationStatusCode::Success);
        assert_eq!(status.court_time.get("08:00-09:00").map(String::as_str), Some("A1"));
        assert_eq!(
            f.portal.logins.lock().unwrap()[0],
            ("n1".to_string(), "s1".to_string())
        );
    }

    #[tokio::test]
    async fn placing_ahead_of_time_stays_pending() {
        let f = fixture((8, 39, 55), 1).await;

        let id = f.service.place("alice", request(plus(4), 0)).await.unwrap();
        f.tasks.close();
        f.tasks.wait().await;

        assert_eq!(f.repo.reserve_on_of(id), Some(plus(3)));
        assert_eq!(f.repo.status_of(id).unwrap().code, ReservationStatusCode::Pending);
        assert_eq!(f.portal.login_count(), 0);
    }

    #[tokio::test]
    async fn malformed_requests_are_rejected() {
        let f = fixture((12, 0, 0), 0).await;

        let mut bad_date = request(plus(1), 0);
        bad_date.date = "tomorrow".into();
        assert!(matches!(
            f.service.place("alice", bad_date).await,
            Err(DomainError::MalformedData(_))
        ));

        let mut bad_pref = request(plus(1), 0);
        bad_pref.preferences[0].duration_sec = 0;
        assert!(matches!(
            f.service.place("alice", bad_pref).await,
            Err(DomainError::MalformedData(_))
        ));

        assert!(matches!(
            f.service.place("mallory", request(plus(1), 0)).await,
            Err(DomainError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn cancel_only_own_pending_reservations() {
        let f = fixture((7, 0, 0), 0).await;
        let id = f.service.place("alice", request(plus(3), 0)).await.unwrap();

        assert!(matches!(
            f.service.cancel("bob", id).await,
            Err(DomainError::InvalidQuery(ref m)) if m == "No matching reservation"
        ));
        f.service.cancel("alice", id).await.unwrap();
        assert!(f.service.cancel("alice", id).await.is_err());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let f = fixture((7, 0, 0), 0).await;
        for priority in 0..3 {
            f.service.place("alice", request(plus(3), priority)).await.unwrap();
        }
        f.service.place("bob", request(plus(3), 9)).await.unwrap();

        let page = f
            .service
            .list("alice", PaginationParams { page: 1, limit: 2 })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        let priorities: Vec<i32> = page.items.iter().map(|r| r.reservation.priority).collect();
        assert_eq!(priorities, vec![2, 1]);

        let page = f
            .service
            .list("alice", PaginationParams { page: 2, limit: 2 })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }
}
