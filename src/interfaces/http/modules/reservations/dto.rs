//! Reservation DTOs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::{PlaceReservation, ReservationPage};
use crate::domain::reservation::DATE_FORMAT;
use crate::domain::{ReservationRecord, SingleBook};

/// One desired span on the target day, in seconds since local midnight.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SingleBookDto {
    #[validate(range(min = 0, max = 86400))]
    pub start_time_sec: i64,
    #[validate(range(min = 1, max = 86400))]
    pub duration_sec: i64,
    /// Preferred court names, best first
    #[serde(default)]
    pub court_name_preference: Vec<String>,
}

impl From<SingleBookDto> for SingleBook {
    fn from(dto: SingleBookDto) -> Self {
        SingleBook {
            start_time_sec: dto.start_time_sec,
            duration_sec: dto.duration_sec,
            court_name_preference: dto.court_name_preference,
        }
    }
}

impl From<SingleBook> for SingleBookDto {
    fn from(book: SingleBook) -> Self {
        SingleBookDto {
            start_time_sec: book.start_time_sec,
            duration_sec: book.duration_sec,
            court_name_preference: book.court_name_preference,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlaceReservationRequest {
    /// Target date, `YYYY-MM-DD`
    #[validate(length(min = 1, message = "date is required"))]
    pub date: String,
    #[validate(length(min = 1, message = "site is required"))]
    pub site: String,
    /// Tried in order; the first one that books anything wins
    #[validate(length(min = 1, message = "at least one preference is required"), nested)]
    pub preferences: Vec<SingleBookDto>,
    /// Lower values are booked first
    #[serde(default)]
    pub priority: i32,
}

impl From<PlaceReservationRequest> for PlaceReservation {
    fn from(request: PlaceReservationRequest) -> Self {
        PlaceReservation {
            date: request.date,
            site: request.site,
            preferences: request.preferences.into_iter().map(Into::into).collect(),
            priority: request.priority,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedReservation {
    pub uid: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListReservationsQuery {
    /// Page number (from 1). Default: 1
    pub page: Option<u64>,
    /// Items per page (1-100). Default: 20
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CancelReservationQuery {
    pub uid: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationStatusDto {
    /// 0 = Pending, 1 = Success, 2 = Failed
    pub code: i32,
    pub msg: String,
    /// Booked time label -> court name
    pub court_time: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDto {
    pub uid: i64,
    pub date: String,
    pub site: String,
    pub preferences: Vec<SingleBookDto>,
    pub priority: i32,
    pub reserve_on: String,
    pub status: ReservationStatusDto,
    pub created_at: String,
}

impl From<ReservationRecord> for ReservationDto {
    fn from(record: ReservationRecord) -> Self {
        ReservationDto {
            uid: record.id,
            date: record.reservation.date.format(DATE_FORMAT).to_string(),
            site: record.reservation.site.as_str().to_string(),
            preferences: record
                .reservation
                .preferences
                .into_iter()
                .map(Into::into)
                .collect(),
            priority: record.reservation.priority,
            reserve_on: record.reserve_on.format(DATE_FORMAT).to_string(),
            status: ReservationStatusDto {
                code: record.status.code.into(),
                msg: record.status.msg,
                court_time: record.status.court_time,
            },
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationListDto {
    /// Total reservations of this account
    pub count: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub result: Vec<ReservationDto>,
}

impl From<ReservationPage> for ReservationListDto {
    fn from(page: ReservationPage) -> Self {
        ReservationListDto {
            count: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
            result: page.items.into_iter().map(Into::into).collect(),
        }
    }
}
