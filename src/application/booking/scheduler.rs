//! Wake scheduler
//!
//! Process-lifetime loop: sleep until the next daily activation instant, then
//! hand every Pending reservation due that day to the account orchestrator,
//! one tracked task per account. Dispatch never awaits the booking runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate};
use metrics::counter;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::orchestrator::{AccountBatch, AccountOrchestrator};
use super::window::BookingWindow;
use crate::domain::{DomainResult, DueReservation, ReservationRepository};
use crate::shared::observability::WAKE_CYCLES_TOTAL;
use crate::shared::{SharedClock, ShutdownSignal};

pub struct WakeScheduler {
    clock: SharedClock,
    window: BookingWindow,
    wake_poll: Duration,
    reservations: Arc<dyn ReservationRepository>,
    /// `None` when no portal is configured: due reservations stay Pending.
    orchestrator: Option<Arc<AccountOrchestrator>>,
    tasks: TaskTracker,
    last_cycle: Mutex<Option<NaiveDate>>,
}

impl WakeScheduler {
    pub fn new(
        clock: SharedClock,
        window: BookingWindow,
        reservations: Arc<dyn ReservationRepository>,
        orchestrator: Option<Arc<AccountOrchestrator>>,
        tasks: TaskTracker,
    ) -> Self {
        Self {
            clock,
            window,
            wake_poll: Duration::from_secs(5),
            reservations,
            orchestrator,
            tasks,
            last_cycle: Mutex::new(None),
        }
    }

    pub fn with_wake_poll(mut self, wake_poll: Duration) -> Self {
        self.wake_poll = wake_poll;
        self
    }

    /// Spawn the scheduler loop. The returned handle resolves once `shutdown`
    /// fires; booking runs already dispatched keep going on the tracker.
    pub fn start(self: Arc<Self>, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                poll_secs = self.wake_poll.as_secs(),
                reserver = self.orchestrator.is_some(),
                "⏰ Wake scheduler started"
            );
            self.run(shutdown).await;
            info!("⏰ Wake scheduler stopped");
        })
    }

    async fn run(&self, shutdown: ShutdownSignal) {
        loop {
            let target = self.next_target();
            debug!(%target, "Next wake-up");

            if !self.sleep_until(target, &shutdown).await {
                return;
            }

            let date = self.window.today(target);
            if !self.claim(date) {
                continue;
            }
            match self.wake_up(date).await {
                Ok(accounts) => info!(%date, accounts, "Wake cycle dispatched"),
                Err(e) => error!(%date, error = %e, "Wake cycle failed"),
            }
        }
    }

    /// Next activation instant, skipping a day whose cycle already ran.
    fn next_target(&self) -> DateTime<FixedOffset> {
        let target = self.window.next_activation(self.clock.now());
        let done = *self.last_cycle.lock().unwrap_or_else(|e| e.into_inner());
        if done == Some(self.window.today(target)) {
            target + chrono::Duration::days(1)
        } else {
            target
        }
    }

    /// Poll the clock until `target`. Returns `false` if shutdown fired first.
    async fn sleep_until(&self, target: DateTime<FixedOffset>, shutdown: &ShutdownSignal) -> bool {
        while self.clock.now() < target {
            tokio::select! {
                _ = tokio::time::sleep(self.wake_poll) => {}
                _ = shutdown.notified().wait() => {
                    info!("⏰ Wake scheduler shutting down");
                    return false;
                }
            }
        }
        !shutdown.is_triggered()
    }

    /// Record `date` as handled; `false` if it already was.
    fn claim(&self, date: NaiveDate) -> bool {
        let mut last = self.last_cycle.lock().unwrap_or_else(|e| e.into_inner());
        if *last == Some(date) {
            return false;
        }
        *last = Some(date);
        true
    }

    /// Dispatch every Pending reservation due on `date`. Returns the number of
    /// account runs started.
    pub async fn wake_up(&self, date: NaiveDate) -> DomainResult<usize> {
        counter!(WAKE_CYCLES_TOTAL).increment(1);

        let due = self.reservations.find_due(date).await?;
        if due.is_empty() {
            info!(%date, "No reservations due");
            return Ok(0);
        }

        let Some(orchestrator) = &self.orchestrator else {
            warn!(%date, due = due.len(), "Reservations due but no portal configured");
            return Ok(0);
        };

        let batches = group_by_account(due);
        let accounts = batches.len();
        for batch in batches {
            debug!(net_id = %batch.net_id, reservations = batch.reservations.len(), "Dispatching account");
            let orchestrator = orchestrator.clone();
            self.tasks.spawn(async move { orchestrator.run(batch).await });
        }
        Ok(accounts)
    }
}

/// Group due reservations by account, keeping first-seen account order and
/// the incoming (priority) order inside each group.
pub fn group_by_account(due: Vec<DueReservation>) -> Vec<AccountBatch> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut batches: Vec<AccountBatch> = Vec::new();

    for reservation in due {
        match index.get(&reservation.net_id) {
            Some(&i) => batches[i].reservations.push(reservation),
            None => {
                index.insert(reservation.net_id.clone(), batches.len());
                batches.push(AccountBatch::single(reservation));
            }
        }
    }
    batches
}
