//! SeaORM implementation of ReservationRepository

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::{debug, error};

use crate::domain::reservation::DATE_FORMAT;
use crate::domain::{
    DomainError, DomainResult, DueReservation, NewReservation, Reservation, ReservationRecord,
    ReservationRepository, ReservationStatus, ReservationStatusCode, SingleBook, Site,
};
use crate::infrastructure::database::entities::reservation;
use crate::shared::{InfraError, PaginationParams};

const PENDING: i32 = 0;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn db_err(e: sea_orm::DbErr) -> DomainError {
    InfraError::from(e).into()
}

fn json_err(e: serde_json::Error) -> DomainError {
    InfraError::from(e).into()
}

fn parse_date(column: &str, value: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| DomainError::Storage(format!("bad {column} '{value}': {e}")))
}

fn reservation_of(m: &reservation::Model) -> DomainResult<Reservation> {
    let preferences: Vec<SingleBook> = serde_json::from_str(&m.preferences).map_err(json_err)?;
    Ok(Reservation {
        date: parse_date("date", &m.date)?,
        site: Site::new(m.site.clone()),
        preferences,
        priority: m.priority,
    })
}

fn model_to_record(m: reservation::Model) -> DomainResult<ReservationRecord> {
    let code = ReservationStatusCode::try_from(m.status_code).map_err(DomainError::Storage)?;
    let court_time: BTreeMap<String, String> =
        serde_json::from_str(&m.court_time).map_err(json_err)?;
    Ok(ReservationRecord {
        id: m.id,
        reservation: reservation_of(&m)?,
        reserve_on: parse_date("reserve_on", &m.reserve_on)?,
        status: ReservationStatus {
            code,
            msg: m.msg,
            court_time,
        },
        created_at: m.created_at,
    })
}

fn model_to_due(m: reservation::Model) -> DomainResult<DueReservation> {
    let reservation = reservation_of(&m)?;
    Ok(DueReservation {
        id: m.id,
        net_id: m.net_id,
        secret: m.passwd,
        reservation,
    })
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn insert_pending(&self, r: NewReservation) -> DomainResult<i64> {
        let preferences = serde_json::to_string(&r.reservation.preferences).map_err(json_err)?;

        let model = reservation::ActiveModel {
            net_id: Set(r.net_id),
            passwd: Set(r.secret),
            date: Set(r.reservation.date.format(DATE_FORMAT).to_string()),
            site: Set(r.reservation.site.as_str().to_string()),
            preferences: Set(preferences),
            priority: Set(r.reservation.priority),
            reserve_on: Set(r.reserve_on.format(DATE_FORMAT).to_string()),
            status_code: Set(PENDING),
            msg: Set(String::new()),
            court_time: Set("{}".to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        debug!(id = inserted.id, reserve_on = %inserted.reserve_on, "Saved reservation");
        Ok(inserted.id)
    }

    async fn find_due(&self, date: NaiveDate) -> DomainResult<Vec<DueReservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::StatusCode.eq(PENDING))
            .filter(reservation::Column::ReserveOn.eq(date.format(DATE_FORMAT).to_string()))
            .order_by_asc(reservation::Column::Priority)
            .order_by_asc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut due = Vec::with_capacity(models.len());
        for model in models {
            let id = model.id;
            match model_to_due(model) {
                Ok(reservation) => due.push(reservation),
                Err(e) => {
                    error!(reservation_id = id, error = %e, "Unreadable reservation, marking failed");
                    let status = ReservationStatus::failed(format!("Server Error: {e}"));
                    if let Err(e) = self.update_status(id, &status).await {
                        error!(reservation_id = id, error = %e, "Failed to mark reservation failed");
                    }
                }
            }
        }
        Ok(due)
    }

    async fn update_status(&self, id: i64, status: &ReservationStatus) -> DomainResult<bool> {
        let court_time = serde_json::to_string(&status.court_time).map_err(json_err)?;

        let result = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::StatusCode,
                Expr::value(i32::from(status.code)),
            )
            .col_expr(reservation::Column::Msg, Expr::value(status.msg.clone()))
            .col_expr(reservation::Column::CourtTime, Expr::value(court_time))
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::StatusCode.eq(PENDING))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected == 1)
    }

    async fn delete_if_pending(&self, net_id: &str, id: i64) -> DomainResult<u64> {
        let result = reservation::Entity::delete_many()
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::NetId.eq(net_id))
            .filter(reservation::Column::StatusCode.eq(PENDING))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    async fn count_for_account(&self, net_id: &str) -> DomainResult<u64> {
        reservation::Entity::find()
            .filter(reservation::Column::NetId.eq(net_id))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn list_for_account(
        &self,
        net_id: &str,
        page: PaginationParams,
    ) -> DomainResult<Vec<ReservationRecord>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::NetId.eq(net_id))
            .order_by_desc(reservation::Column::CreatedAt)
            .order_by_desc(reservation::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_record).collect()
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<ReservationRecord>> {
        let model = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_record).transpose()
    }
}
