//! Domain layer: court reservations, web accounts and the portal ports
//! the booking engine drives.

pub mod account;
pub mod portal;
pub mod reservation;

pub use account::{Account, AccountStore};
pub use portal::{
    AuthError, BookingUnit, CaptchaError, CaptchaSolver, CourtId, Portal, PortalSession,
    ReserveError, SharedPortal, Site, Slot, Span, StockId,
};
pub use reservation::{
    DueReservation, NewReservation, Reservation, ReservationRecord, ReservationRepository,
    ReservationStatus, ReservationStatusCode, SingleBook,
};

pub use crate::shared::types::errors::{DomainError, DomainResult};
