//! Account orchestrator
//!
//! One run per account: authenticate once, then book that account's due
//! reservations one after another in priority order over the shared session.
//!
//! A reservation can be handed over twice, by an immediate placement and by
//! the wake cycle of the same day. Runs claim reservation ids for their
//! duration and recheck the stored status, so each one is booked once.

use std::sync::Arc;

use dashmap::DashSet;
use metrics::counter;
use tracing::{debug, error, info, warn};

use super::engine::BookingEngine;
use crate::application::accounts::AccountRegistry;
use crate::domain::{
    CaptchaSolver, DueReservation, ReservationRepository, ReservationStatus,
    ReservationStatusCode, SharedPortal,
};
use crate::shared::observability::LOGIN_FAILURES_TOTAL;

/// Due reservations of one portal account.
#[derive(Debug, Clone)]
pub struct AccountBatch {
    pub net_id: String,
    /// Secret stored with the reservations; used when the account is no
    /// longer registered.
    pub secret: String,
    pub reservations: Vec<DueReservation>,
}

impl AccountBatch {
    pub fn single(due: DueReservation) -> Self {
        Self {
            net_id: due.net_id.clone(),
            secret: due.secret.clone(),
            reservations: vec![due],
        }
    }
}

pub struct AccountOrchestrator {
    portal: SharedPortal,
    engine: Arc<BookingEngine>,
    reservations: Arc<dyn ReservationRepository>,
    accounts: Arc<AccountRegistry>,
    solver: Arc<dyn CaptchaSolver>,
    in_flight: Arc<DashSet<i64>>,
}

/// Releases a claimed reservation id when the run is done with it.
struct Claim {
    id: i64,
    in_flight: Arc<DashSet<i64>>,
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.in_flight.remove(&self.id);
    }
}

impl AccountOrchestrator {
    pub fn new(
        portal: SharedPortal,
        engine: Arc<BookingEngine>,
        reservations: Arc<dyn ReservationRepository>,
        accounts: Arc<AccountRegistry>,
        solver: Arc<dyn CaptchaSolver>,
    ) -> Self {
        Self {
            portal,
            engine,
            reservations,
            accounts,
            solver,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    pub fn portal(&self) -> &SharedPortal {
        &self.portal
    }

    pub fn engine(&self) -> &Arc<BookingEngine> {
        &self.engine
    }

    pub async fn run(&self, mut batch: AccountBatch) {
        batch.reservations.sort_by_key(|r| r.reservation.priority);

        let mut claims = Vec::with_capacity(batch.reservations.len());
        let mut pending = Vec::with_capacity(batch.reservations.len());
        for due in batch.reservations {
            let Some(claim) = self.claim(due.id) else {
                debug!(reservation_id = due.id, "Reservation already being booked");
                continue;
            };
            if self.still_pending(due.id).await {
                claims.push(claim);
                pending.push(due);
            }
        }
        batch.reservations = pending;
        if batch.reservations.is_empty() {
            return;
        }

        let secret = match self.accounts.secret_for(&batch.net_id).await {
            Some(current) => current,
            None => batch.secret.clone(),
        };

        let session = match self
            .portal
            .authenticate(self.portal.login_url(), &batch.net_id, &secret)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                counter!(LOGIN_FAILURES_TOTAL).increment(1);
                warn!(
                    net_id = %batch.net_id,
                    reservations = batch.reservations.len(),
                    error = %e,
                    "Portal login failed"
                );
                let status = ReservationStatus::failed(format!("Login Error: {e}"));
                for due in &batch.reservations {
                    self.write_back(due.id, &status).await;
                }
                return;
            }
        };

        for due in &batch.reservations {
            let status = self
                .engine
                .book_now(session.as_ref(), &due.reservation, self.solver.as_ref())
                .await;
            self.write_back(due.id, &status).await;
        }
        drop(claims);
    }

    fn claim(&self, id: i64) -> Option<Claim> {
        self.in_flight.insert(id).then(|| Claim {
            id,
            in_flight: self.in_flight.clone(),
        })
    }

    /// Lookup errors count as pending; the status write stays Pending-only.
    async fn still_pending(&self, id: i64) -> bool {
        match self.reservations.find_by_id(id).await {
            Ok(Some(record)) => record.status.code == ReservationStatusCode::Pending,
            Ok(None) => {
                debug!(reservation_id = id, "Reservation cancelled before booking");
                false
            }
            Err(e) => {
                warn!(reservation_id = id, error = %e, "Could not recheck reservation status");
                true
            }
        }
    }

    async fn write_back(&self, id: i64, status: &ReservationStatus) {
        match self.reservations.update_status(id, status).await {
            Ok(true) => info!(
                reservation_id = id,
                code = ?status.code,
                msg = %status.msg,
                booked = status.court_time.len(),
                "Reservation finished"
            ),
            Ok(false) => warn!(
                reservation_id = id,
                "Reservation no longer pending, status not written"
            ),
            Err(e) => error!(
                reservation_id = id,
                error = %e,
                "Failed to write reservation status"
            ),
        }
    }
}
