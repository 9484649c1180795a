//! Portal integrations, resolved by name at startup.

pub mod registry;

pub use registry::{PortalFactory, PortalRegistry, PortalRegistryError};
