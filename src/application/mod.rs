pub mod accounts;
pub mod booking;
pub mod reservations;

// Re-export key types for convenience
pub use accounts::{AccountRegistry, SessionManager};
pub use booking::{
    AccountOrchestrator, BookingEngine, BookingWindow, SplitConfig, WakeScheduler,
};
pub use reservations::{PlaceReservation, ReservationPage, ReservationService};
