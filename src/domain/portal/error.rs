use thiserror::Error;

/// Failure to obtain a portal session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("login transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

/// Failure of a slot query or reserve call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReserveError {
    /// The portal has not opened bookings for the requested date yet.
    #[error("booking is not open yet")]
    NotOpenYet,

    #[error("rejected by portal: {0}")]
    Rejected(String),

    #[error("captcha failed: {0}")]
    Captcha(#[from] CaptchaError),

    #[error("portal transport error: {0}")]
    Transport(String),

    #[error("unexpected portal response: {0}")]
    Parse(String),
}

impl ReserveError {
    /// Transient errors are retried in place by the booking engine.
    pub fn is_transient(&self) -> bool {
        matches!(self, ReserveError::NotOpenYet)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptchaError {
    #[error("challenge unavailable: {0}")]
    Unavailable(String),

    #[error("challenge not recognised")]
    Unrecognised,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_open_yet_is_transient() {
        assert!(ReserveError::NotOpenYet.is_transient());
        assert!(!ReserveError::Rejected("full".into()).is_transient());
        assert!(!ReserveError::Captcha(CaptchaError::Unrecognised).is_transient());
    }
}
