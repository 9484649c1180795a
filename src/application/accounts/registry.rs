//! Account registry
//!
//! Process-wide set of web accounts held in memory behind a read/write lock
//! and written through to the [`AccountStore`] on every mutation. A mutation
//! only becomes visible once the store accepted it.

use std::sync::Arc;

use bcrypt::DEFAULT_COST;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::{Account, AccountStore, DomainError, DomainResult};
use crate::infrastructure::crypto::password::{
    hash_password_with_cost, is_bcrypt_hash, verify_password,
};
use crate::shared::is_valid_secret;

pub struct AccountRegistry {
    accounts: RwLock<Vec<Account>>,
    store: Arc<dyn AccountStore>,
    hash_cost: u32,
}

impl AccountRegistry {
    pub async fn load(store: Arc<dyn AccountStore>) -> DomainResult<Self> {
        Self::load_with_cost(store, DEFAULT_COST).await
    }

    /// Load all accounts, hashing any legacy plaintext web passwords found
    /// in the store and writing the result back.
    pub async fn load_with_cost(store: Arc<dyn AccountStore>, hash_cost: u32) -> DomainResult<Self> {
        let mut accounts = blocking(&store, |s| s.load()).await?;

        let mut migrated = 0usize;
        for account in accounts.iter_mut() {
            if !is_bcrypt_hash(&account.password_hash) {
                account.password_hash = hash_password_with_cost(&account.password_hash, hash_cost)?;
                migrated += 1;
            }
        }
        if migrated > 0 {
            let snapshot = accounts.clone();
            blocking(&store, move |s| s.save(&snapshot)).await?;
            warn!(migrated, "Hashed plaintext passwords found in accounts file");
        }

        info!(accounts = accounts.len(), "👤 Accounts loaded");
        Ok(Self {
            accounts: RwLock::new(accounts),
            store,
            hash_cost,
        })
    }

    pub async fn find(&self, user: &str) -> Option<Account> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.user == user)
            .cloned()
    }

    /// Current portal secret for `net_id`, if a registered account uses it.
    pub async fn secret_for(&self, net_id: &str) -> Option<String> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.net_id == net_id)
            .map(|a| a.net_id_password.clone())
    }

    pub async fn authenticate(&self, user: &str, password: &str) -> DomainResult<Account> {
        let account = self.find(user).await.ok_or(DomainError::AccountNotFound)?;
        if !verify_password(password, &account.password_hash) {
            return Err(DomainError::WrongPassword);
        }
        Ok(account)
    }

    pub async fn change_password(
        &self,
        user: &str,
        old_password: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        if !is_valid_secret(new_password) {
            return Err(DomainError::InvalidPassword);
        }
        let new_hash = hash_password_with_cost(new_password, self.hash_cost)?;

        self.update(user, |account| {
            if !verify_password(old_password, &account.password_hash) {
                return Err(DomainError::WrongPassword);
            }
            account.password_hash = new_hash;
            Ok(())
        })
        .await?;

        info!(user, "🔑 Web password changed");
        Ok(())
    }

    pub async fn change_net_id_password(&self, user: &str, new_secret: &str) -> DomainResult<()> {
        if !is_valid_secret(new_secret) {
            return Err(DomainError::InvalidPassword);
        }
        let new_secret = new_secret.to_string();

        self.update(user, |account| {
            account.net_id_password = new_secret;
            Ok(())
        })
        .await?;

        info!(user, "🔑 Portal secret changed");
        Ok(())
    }

    async fn update<F>(&self, user: &str, mutate: F) -> DomainResult<()>
    where
        F: FnOnce(&mut Account) -> DomainResult<()>,
    {
        let mut guard = self.accounts.write().await;
        let index = guard
            .iter()
            .position(|a| a.user == user)
            .ok_or(DomainError::AccountNotFound)?;

        let mut updated = guard.clone();
        mutate(&mut updated[index])?;

        let snapshot = updated.clone();
        blocking(&self.store, move |s| s.save(&snapshot)).await?;
        *guard = updated;
        Ok(())
    }
}

async fn blocking<T, F>(store: &Arc<dyn AccountStore>, f: F) -> DomainResult<T>
where
    F: FnOnce(&dyn AccountStore) -> DomainResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| DomainError::Storage(format!("accounts store task failed: {e}")))?
}
