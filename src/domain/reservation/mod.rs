//! Reservation aggregate
//!
//! Contains the Reservation entity, its status state machine, and the
//! repository interface.

pub mod model;
pub mod repository;

pub use model::{
    DueReservation, NewReservation, Reservation, ReservationRecord, ReservationStatus,
    ReservationStatusCode, SingleBook, DATE_FORMAT,
};
pub use repository::ReservationRepository;
