//! Metric names and the process-wide Prometheus recorder.

use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

pub const BOOKINGS_TOTAL: &str = "court_reserver_bookings_total";
pub const UNITS_TOTAL: &str = "court_reserver_units_total";
pub const WAKE_CYCLES_TOTAL: &str = "court_reserver_wake_cycles_total";
pub const LOGIN_FAILURES_TOTAL: &str = "court_reserver_login_failures_total";
pub const BOOKING_DURATION_SECONDS: &str = "court_reserver_booking_duration_seconds";

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder.
///
/// The global recorder can only be installed once per process; on restart
/// within the same process the existing handle is reused.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    info!("📊 Prometheus metrics recorder installed");

    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

fn describe_metrics() {
    describe_counter!(BOOKINGS_TOTAL, "Reservations driven to a terminal status");
    describe_counter!(UNITS_TOTAL, "Booking unit reserve attempts");
    describe_counter!(WAKE_CYCLES_TOTAL, "Wake scheduler cycles executed");
    describe_counter!(LOGIN_FAILURES_TOTAL, "Portal authentication failures");
    describe_histogram!(
        BOOKING_DURATION_SECONDS,
        Unit::Seconds,
        "Time from window open to terminal status"
    );
}
