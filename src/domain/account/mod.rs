//! Account aggregate

pub mod model;
pub mod repository;

pub use model::Account;
pub use repository::AccountStore;
