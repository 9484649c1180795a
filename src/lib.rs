//! # Court Reserver
//!
//! Books time-slotted sports courts on a third-party portal the moment its
//! daily booking window opens.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Reservations, accounts and the portal ports
//! - **application**: Booking engine, wake scheduler, account registry and use cases
//! - **infrastructure**: SQLite storage, the accounts file and the portal registry
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: Process wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, run_migrations};

// Re-export API router
pub use interfaces::http::create_api_router;

// Re-export portal plumbing for integrations
pub use infrastructure::{PortalFactory, PortalRegistry};
