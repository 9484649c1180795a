//! Shared state handed to every handler.

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;

use crate::application::{AccountRegistry, ReservationService, SessionManager};

#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<AccountRegistry>,
    pub sessions: Arc<SessionManager>,
    pub reservations: Arc<ReservationService>,
    /// Version of the configured portal, if any.
    pub portal_version: Option<String>,
    pub metrics: Option<PrometheusHandle>,
    /// Pinged by the health check.
    pub db: Option<DatabaseConnection>,
    pub started_at: Instant,
}
