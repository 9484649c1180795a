//! Account persistence interface

use super::model::Account;
use crate::domain::DomainResult;

/// Durable backing for the in-memory account registry. The whole set is
/// rewritten on every mutation.
pub trait AccountStore: Send + Sync {
    fn load(&self) -> DomainResult<Vec<Account>>;

    fn save(&self, accounts: &[Account]) -> DomainResult<()>;
}
