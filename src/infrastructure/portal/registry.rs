//! Portal registry
//!
//! Maps a configured portal name to the factory that builds it. The server
//! resolves the name once at startup; an empty name runs without a reserver.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::PortalConfig;
use crate::domain::SharedPortal;

/// Builds a portal from its configuration section.
pub trait PortalFactory: Send + Sync {
    fn create(&self, config: &PortalConfig) -> SharedPortal;
}

impl<F> PortalFactory for F
where
    F: Fn(&PortalConfig) -> SharedPortal + Send + Sync,
{
    fn create(&self, config: &PortalConfig) -> SharedPortal {
        self(config)
    }
}

#[derive(Debug, Error)]
pub enum PortalRegistryError {
    #[error("unknown portal '{name}' (registered: {available:?})")]
    UnknownPortal {
        name: String,
        available: Vec<String>,
    },
}

#[derive(Default)]
pub struct PortalRegistry {
    factories: HashMap<String, Arc<dyn PortalFactory>>,
}

impl PortalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, factory: Arc<dyn PortalFactory>) {
        let name = name.into();
        info!(portal = %name, "Registered portal");
        self.factories.insert(name, factory);
    }

    /// Sorted names of all registered portals.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build the portal named in `config`; `None` when no name is configured.
    pub fn resolve(&self, config: &PortalConfig) -> Result<Option<SharedPortal>, PortalRegistryError> {
        let name = config.name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PortalRegistryError::UnknownPortal {
                name: name.to_string(),
                available: self.names(),
            })?;

        let portal = factory.create(config);
        info!(portal = name, version = portal.version(), "🎾 Portal ready");
        Ok(Some(portal))
    }
}
