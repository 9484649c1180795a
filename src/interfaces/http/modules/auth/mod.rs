//! Authentication module: login, whoami, sign-out, password changes

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
