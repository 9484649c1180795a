//! Graceful shutdown handling
//!
//! One [`ShutdownSignal`] is shared by the wake scheduler, the session purge
//! task and the REST API. Triggering it stops new work from being
//! dispatched; booking runs already in flight are drained by
//! [`ShutdownCoordinator::drain`] within the configured timeout.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cloneable process-wide stop flag.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Idempotent; only the first call is logged.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            info!("🛑 Shutdown signal triggered");
            self.token.cancel();
        }
    }

    /// Resolve once shutdown has been triggered (immediately if it already was).
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    /// Owned waiter, convenient inside `tokio::select!` loops.
    pub fn notified(&self) -> ShutdownNotified {
        ShutdownNotified {
            token: self.token.clone(),
        }
    }
}

pub struct ShutdownNotified {
    token: CancellationToken,
}

impl ShutdownNotified {
    pub async fn wait(self) {
        self.token.cancelled().await;
    }
}

/// Trigger `shutdown` on SIGTERM / SIGINT (Ctrl+C elsewhere).
pub async fn listen_for_shutdown_signals(shutdown: ShutdownSignal) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(error = %e, "Failed to install signal handlers");
                    return;
                }
            };

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!(signal = name, "📡 Received OS signal");
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }
        info!(signal = "Ctrl+C", "📡 Received OS signal");
    }

    shutdown.trigger();
}

/// Owns the signal and bounds how long in-flight work may take to finish.
pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            signal: ShutdownSignal::new(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    pub fn start_signal_listener(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.signal.clone()));
    }

    /// Run `cleanup` bounded by the shutdown timeout. Returns `false` when
    /// the deadline elapsed first.
    pub async fn drain<Fut>(&self, cleanup: Fut) -> bool
    where
        Fut: std::future::Future<Output = ()>,
    {
        info!(
            timeout_secs = self.timeout.as_secs(),
            "⏳ Draining in-flight bookings..."
        );

        if tokio::time::timeout(self.timeout, cleanup).await.is_ok() {
            info!("✅ Graceful shutdown completed");
            true
        } else {
            warn!(
                timeout_secs = self.timeout.as_secs(),
                "⚠️ Graceful shutdown timed out"
            );
            false
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(30)
    }
}
