use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Business failures surfaced to API callers.
///
/// Each variant carries a stable numeric code that is returned in the
/// response envelope next to the HTTP status.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Internal Server Error: {0}")]
    Storage(String),

    #[error("Malformed Data: {0}")]
    MalformedData(String),

    #[error("Account Not Existed")]
    AccountNotFound,

    #[error("Invalid Account: {0}")]
    InvalidAccount(String),

    #[error("Wrong Passwd")]
    WrongPassword,

    #[error("Invalid Passwd")]
    InvalidPassword,

    #[error("Not Logged In")]
    NotLoggedIn,

    #[error("Invalid Query: {0}")]
    InvalidQuery(String),
}

impl DomainError {
    /// Numeric error code carried in the API envelope (`0` means success).
    pub fn code(&self) -> i32 {
        match self {
            DomainError::Storage(_) => 1,
            DomainError::MalformedData(_) => 2,
            DomainError::AccountNotFound => 3,
            DomainError::InvalidAccount(_) => 4,
            DomainError::WrongPassword => 5,
            DomainError::InvalidPassword => 6,
            DomainError::NotLoggedIn => 7,
            DomainError::InvalidQuery(_) => 8,
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Accounts file error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<InfraError> for DomainError {
    fn from(err: InfraError) -> Self {
        DomainError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DomainError::Storage("x".into()).code(), 1);
        assert_eq!(DomainError::MalformedData("x".into()).code(), 2);
        assert_eq!(DomainError::AccountNotFound.code(), 3);
        assert_eq!(DomainError::WrongPassword.code(), 5);
        assert_eq!(DomainError::NotLoggedIn.code(), 7);
        assert_eq!(DomainError::InvalidQuery("x".into()).code(), 8);
    }

    #[test]
    fn infra_errors_become_storage_errors() {
        let err: DomainError = InfraError::Crypto("bad salt".into()).into();
        assert!(matches!(err, DomainError::Storage(_)));
        assert_eq!(err.to_string(), "Internal Server Error: Crypto error: bad salt");
    }
}
