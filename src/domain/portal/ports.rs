//! Ports implemented by a concrete portal integration.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::{AuthError, CaptchaError, ReserveError};
use super::model::{BookingUnit, Site, Slot};

/// Answers the challenge presented during a reserve call.
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    async fn solve(&self, challenge: &[u8]) -> Result<String, CaptchaError>;
}

/// An authenticated portal session for one account.
#[async_trait]
pub trait PortalSession: Send + Sync {
    /// Slots still bookable on `date` at `site`.
    ///
    /// Returns [`ReserveError::NotOpenYet`] while the portal has not released
    /// the date.
    async fn list_available_slots(
        &self,
        date: NaiveDate,
        site: &Site,
    ) -> Result<Vec<Slot>, ReserveError>;

    /// Reserve every stock id of `unit` in one call.
    async fn reserve(
        &self,
        site: &Site,
        unit: &BookingUnit,
        solver: &dyn CaptchaSolver,
    ) -> Result<(), ReserveError>;
}

/// A reservation portal integration.
#[async_trait]
pub trait Portal: Send + Sync {
    fn version(&self) -> &str;

    fn login_url(&self) -> &str;

    /// How many days ahead of the target date bookings open at `site`.
    fn lookahead_days(&self, site: &Site) -> u32;

    fn captcha_solver(&self, challenge_url: &str) -> Arc<dyn CaptchaSolver>;

    async fn authenticate(
        &self,
        login_url: &str,
        account_id: &str,
        secret: &str,
    ) -> Result<Arc<dyn PortalSession>, AuthError>;
}

pub type SharedPortal = Arc<dyn Portal>;
