//! Portal aggregate
//!
//! Slot model and the ports implemented by a concrete portal integration.

pub mod error;
pub mod model;
pub mod ports;

pub use error::{AuthError, CaptchaError, ReserveError};
pub use model::{BookingUnit, CourtId, Site, Slot, Span, StockId};
pub use ports::{CaptchaSolver, Portal, PortalSession, SharedPortal};
