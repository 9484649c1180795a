//! Web accounts and their sessions.

pub mod registry;
pub mod sessions;

pub use registry::AccountRegistry;
pub use sessions::SessionManager;
