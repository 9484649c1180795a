//! Booking core: window arithmetic, slot matching and splitting, the
//! per-reservation engine, the per-account orchestrator and the daily
//! wake scheduler.

pub mod engine;
pub mod matcher;
pub mod orchestrator;
pub mod scheduler;
pub mod splitter;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{BookingEngine, ALL_COURTS_UNAVAILABLE, WINDOW_CLOSED};
pub use matcher::choose_slots;
pub use orchestrator::{AccountBatch, AccountOrchestrator};
pub use scheduler::{group_by_account, WakeScheduler};
pub use splitter::{split_court_ranges, SplitConfig};
pub use window::BookingWindow;
