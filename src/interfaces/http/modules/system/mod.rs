//! Version, health and metrics endpoints (no session required)

pub mod handlers;

pub use handlers::*;
