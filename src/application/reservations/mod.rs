//! Reservation placement, cancellation and listing for web accounts.

pub mod service;

pub use service::{plan, parse_date, Placement, PlaceReservation, ReservationPage, ReservationService};
