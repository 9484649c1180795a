//! Web account entity

/// A web user and the portal credentials it books with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user: String,
    /// bcrypt hash of the web password.
    pub password_hash: String,
    /// Portal account id.
    pub net_id: String,
    /// Portal secret, sent to the portal on every login.
    pub net_id_password: String,
}
