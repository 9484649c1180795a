//! Reservation HTTP handlers

use axum::extract::rejection::QueryRejection;
use axum::extract::{Extension, Query, State};
use axum::Json;

use super::dto::*;
use crate::interfaces::http::common::{query_params, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::CurrentUser;
use crate::interfaces::http::state::HttpState;
use crate::shared::validate_pagination;

#[utoipa::path(
    post,
    path = "/api/reservations",
    tag = "Reservations",
    request_body = PlaceReservationRequest,
    responses(
        (status = 200, description = "Reservation stored as Pending", body = ApiResponse<PlacedReservation>),
        (status = 400, description = "Invalid date or preferences"),
        (status = 403, description = "Not logged in")
    )
)]
pub async fn place_reservation(
    State(state): State<HttpState>,
    Extension(current): Extension<CurrentUser>,
    ValidatedJson(request): ValidatedJson<PlaceReservationRequest>,
) -> ApiResult<PlacedReservation> {
    let uid = state
        .reservations
        .place(&current.user, request.into())
        .await?;
    Ok(Json(ApiResponse::success(PlacedReservation { uid })))
}

#[utoipa::path(
    get,
    path = "/api/reservations",
    tag = "Reservations",
    params(ListReservationsQuery),
    responses(
        (status = 200, description = "Own reservations, newest first", body = ApiResponse<ReservationListDto>),
        (status = 403, description = "Not logged in")
    )
)]
pub async fn list_reservations(
    State(state): State<HttpState>,
    Extension(current): Extension<CurrentUser>,
    query: Result<Query<ListReservationsQuery>, QueryRejection>,
) -> ApiResult<ReservationListDto> {
    let query = query_params(query)?;
    let page = validate_pagination(query.page, query.limit);
    let result = state.reservations.list(&current.user, page).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

#[utoipa::path(
    delete,
    path = "/api/reservations",
    tag = "Reservations",
    params(CancelReservationQuery),
    responses(
        (status = 200, description = "Reservation deleted"),
        (status = 400, description = "No matching Pending reservation"),
        (status = 403, description = "Not logged in")
    )
)]
pub async fn cancel_reservation(
    State(state): State<HttpState>,
    Extension(current): Extension<CurrentUser>,
    query: Result<Query<CancelReservationQuery>, QueryRejection>,
) -> ApiResult<()> {
    let query = query_params(query)?;
    state.reservations.cancel(&current.user, query.uid).await?;
    Ok(Json(ApiResponse::ok()))
}
