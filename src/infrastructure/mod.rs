//! Infrastructure layer - external concerns

pub mod accounts;
pub mod crypto;
pub mod database;
pub mod portal;

pub use accounts::CsvAccountStore;
pub use database::{init_database, run_migrations, SeaOrmReservationRepository};
pub use portal::{PortalFactory, PortalRegistry};
