//! Web sessions: opaque random ids mapped to a user name with an expiry.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::RngCore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::{DomainError, DomainResult};
use crate::shared::ShutdownSignal;

#[derive(Debug, Clone)]
struct WebSession {
    user: String,
    expires_at: DateTime<Utc>,
}

pub struct SessionManager {
    sessions: DashMap<String, WebSession>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Open a session for `user` and return its id (32 random bytes, base64).
    pub fn create(&self, user: &str) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let id = STANDARD.encode(bytes);
        self.sessions.insert(
            id.clone(),
            WebSession {
                user: user.to_string(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        id
    }

    /// User name behind `id`. Expired sessions are dropped on lookup.
    pub fn resolve(&self, id: &str) -> DomainResult<String> {
        self.resolve_at(id, Utc::now())
    }

    fn resolve_at(&self, id: &str, now: DateTime<Utc>) -> DomainResult<String> {
        let session = self
            .sessions
            .get(id)
            .map(|s| s.value().clone())
            .ok_or(DomainError::NotLoggedIn)?;
        if session.expires_at <= now {
            self.sessions.remove(id);
            debug!(user = %session.user, "Session expired");
            return Err(DomainError::NotLoggedIn);
        }
        Ok(session.user)
    }

    pub fn remove(&self, id: &str) {
        self.sessions.remove(id);
    }

    /// Drop every expired session; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Periodically drop expired sessions until `shutdown` fires.
    pub fn start_purge_task(
        self: Arc<Self>,
        every: std::time::Duration,
        shutdown: ShutdownSignal,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let purged = self.purge_expired();
                        if purged > 0 {
                            debug!(purged, remaining = self.len(), "Purged expired sessions");
                        }
                    }
                    _ = shutdown.notified().wait() => {
                        info!("🔐 Session purge task shutting down");
                        break;
                    }
                }
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
