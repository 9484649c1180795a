//! Reservation repository interface

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{DueReservation, NewReservation, ReservationRecord, ReservationStatus};
use crate::domain::DomainResult;
use crate::shared::PaginationParams;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Store a new Pending reservation and return its id.
    async fn insert_pending(&self, reservation: NewReservation) -> DomainResult<i64>;

    /// Pending reservations due on `date`, ordered by priority ascending.
    async fn find_due(&self, date: NaiveDate) -> DomainResult<Vec<DueReservation>>;

    /// Write a terminal status. Only rows still Pending are touched; returns
    /// whether the write took effect.
    async fn update_status(&self, id: i64, status: &ReservationStatus) -> DomainResult<bool>;

    /// Delete reservation `id` if it belongs to `net_id` and is still Pending.
    async fn delete_if_pending(&self, net_id: &str, id: i64) -> DomainResult<u64>;

    async fn count_for_account(&self, net_id: &str) -> DomainResult<u64>;

    /// Newest first.
    async fn list_for_account(
        &self,
        net_id: &str,
        page: PaginationParams,
    ) -> DomainResult<Vec<ReservationRecord>>;

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<ReservationRecord>>;
}
