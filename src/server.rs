//! Reusable court reserver runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! database init, migrations, account registry, portal resolution, wake
//! scheduler, REST API, metrics, and graceful shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sea_orm::DatabaseConnection;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::application::{
    AccountOrchestrator, AccountRegistry, BookingEngine, BookingWindow, ReservationService,
    SessionManager, SplitConfig, WakeScheduler,
};
use crate::config::{AppConfig, ConfigError};
use crate::domain::ReservationRepository;
use crate::infrastructure::{
    init_database, run_migrations, CsvAccountStore, PortalRegistry, SeaOrmReservationRepository,
};
use crate::interfaces::http::{create_api_router, HttpState};
use crate::shared::observability::install_prometheus_recorder;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::shared::{SharedClock, SystemClock};

/// How often expired web sessions are dropped.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(600);

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the court reserver.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Portal integrations available to `[portal] name`.
    pub portals: PortalRegistry,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            portals: PortalRegistry::new(),
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running court reserver.
///
/// # Examples
///
/// ```rust,no_run
/// use court_reserver::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Web accounts loaded from the accounts file.
    pub accounts: Arc<AccountRegistry>,
    /// Reservation placement, listing and cancellation.
    pub reservations: Arc<ReservationService>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// API port the server is listening on (the bound one when configured as 0).
    pub api_port: u16,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    tasks: TaskTracker,
    scheduler_task: tokio::task::JoinHandle<()>,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the court reserver with the given options.
    ///
    /// This will:
    /// 1. Install Prometheus metrics recorder
    /// 2. Connect to database and run migrations
    /// 3. Load the accounts file
    /// 4. Resolve the configured portal (if any)
    /// 5. Start the wake scheduler
    /// 6. Start REST API server (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting court reserver...");

        // ── Prometheus metrics recorder ────────────────────────
        let prometheus_handle = match install_prometheus_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Prometheus recorder unavailable; /metrics disabled");
                None
            }
        };

        // ── Database ───────────────────────────────────────────
        let db = init_database(&app_cfg.database.connection_url()).await?;
        if opts.auto_migrate {
            run_migrations(&db).await?;
        }
        let reservations_repo: Arc<dyn ReservationRepository> =
            Arc::new(SeaOrmReservationRepository::new(db.clone()));

        // ── Accounts & sessions ────────────────────────────────
        let store = Arc::new(CsvAccountStore::new(&app_cfg.accounts.path));
        let accounts = Arc::new(AccountRegistry::load(store).await?);
        let sessions = Arc::new(SessionManager::new(chrono::Duration::hours(
            app_cfg.session.expiry_hours,
        )));

        // ── Scheduling ─────────────────────────────────────────
        let schedule = &app_cfg.schedule;
        let window = BookingWindow::from_config(schedule).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "utc_offset_minutes {} is out of range",
                schedule.utc_offset_minutes
            ))
        })?;
        let clock: SharedClock = Arc::new(SystemClock::new(window.offset()));
        let engine = Arc::new(
            BookingEngine::new(clock.clone(), window, SplitConfig::from(&app_cfg.booking))
                .with_polling(
                    Duration::from_millis(schedule.open_poll_millis),
                    Duration::from_millis(schedule.transient_retry_millis),
                ),
        );

        // ── Portal ─────────────────────────────────────────────
        let portal = opts.portals.resolve(&app_cfg.portal)?;
        let portal_version = portal.as_ref().map(|p| p.version().to_string());
        let orchestrator = match portal {
            Some(portal) => {
                let solver = portal.captcha_solver(&app_cfg.portal.challenge_url);
                Some(Arc::new(AccountOrchestrator::new(
                    portal,
                    engine.clone(),
                    reservations_repo.clone(),
                    accounts.clone(),
                    solver,
                )))
            }
            None => {
                warn!("No portal configured; reservations will be stored but not booked");
                None
            }
        };

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();
        let tasks = TaskTracker::new();

        // ── Wake scheduler ─────────────────────────────────────
        let scheduler = Arc::new(
            WakeScheduler::new(
                clock.clone(),
                window,
                reservations_repo.clone(),
                orchestrator.clone(),
                tasks.clone(),
            )
            .with_wake_poll(Duration::from_secs(schedule.wake_poll_secs)),
        );
        let scheduler_task = scheduler.start(shutdown_signal.clone());
        sessions
            .clone()
            .start_purge_task(SESSION_PURGE_INTERVAL, shutdown_signal.clone());

        // ── REST API server ────────────────────────────────────
        let reservations = Arc::new(ReservationService::new(
            clock,
            window,
            reservations_repo,
            accounts.clone(),
            orchestrator,
            tasks.clone(),
        ));

        let api_router = create_api_router(HttpState {
            accounts: accounts.clone(),
            sessions,
            reservations: reservations.clone(),
            portal_version,
            metrics: prometheus_handle,
            db: Some(db.clone()),
            started_at: Instant::now(),
        });

        let bind_addr = format!("{}:{}", app_cfg.server.api_host, app_cfg.server.api_port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
        let api_addr = listener.local_addr()?;
        let api_port = api_addr.port();
        info!("REST API server listening on http://{}", api_addr);
        info!("Swagger UI available at http://{}/docs/", api_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Court reserver started.");

        Ok(Self {
            accounts,
            reservations,
            config: app_cfg,
            api_port,
            db,
            shutdown,
            tasks,
            scheduler_task,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    ///
    /// Booking runs already dispatched are given `shutdown_timeout` seconds
    /// to reach a terminal status before the database is closed.
    pub async fn wait(self) {
        info!("⏳ Waiting for server tasks to complete...");

        match self.api_task.await {
            Ok(()) => info!("REST API server stopped"),
            Err(e) => error!("REST API server task panicked: {}", e),
        }
        match self.scheduler_task.await {
            Ok(()) => info!("Wake scheduler stopped"),
            Err(e) => error!("Wake scheduler task panicked: {}", e),
        }

        self.tasks.close();
        let in_flight = self.tasks.len();
        if in_flight > 0 {
            info!(in_flight, "Waiting for booking runs");
        }
        let tasks = self.tasks.clone();
        self.shutdown.drain(async move { tasks.wait().await }).await;

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }

        info!("👋 Court reserver shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down court reserver...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.scheduler_task.is_finished() || !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &tempfile::TempDir) -> ServerOptions {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".into();
        config.server.api_port = 0;
        config.server.shutdown_timeout = 1;
        config.database.path = dir.path().join("reserver.db").display().to_string();
        config.accounts.path = dir.path().join("users.csv").display().to_string();
        ServerOptions {
            config,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn starts_and_stops_without_portal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("users.csv"), "alice,pw,n1,s1\n").unwrap();

        let handle = ServerHandle::start(options(&dir)).await.unwrap();
        assert!(handle.is_running());
        assert_ne!(handle.api_port, 0);
        tokio::net::TcpStream::connect(("127.0.0.1", handle.api_port))
            .await
            .unwrap();
        assert!(handle.accounts.authenticate("alice", "pw").await.is_ok());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_portal_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("users.csv"), "").unwrap();
        let mut opts = options(&dir);
        opts.config.portal.name = "nowhere".into();

        let err = ServerHandle::start(opts).await.err().unwrap();
        assert!(err.to_string().contains("nowhere"));
    }
}
