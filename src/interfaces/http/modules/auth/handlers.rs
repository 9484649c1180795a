//! Authentication API handlers

use axum::extract::{Extension, State};
use axum::http::header::SET_COOKIE;
use axum::Json;

use super::dto::{AccountInfo, ChangeNetIdPasswordRequest, ChangePasswordRequest, LoginRequest};
use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::{CurrentUser, SESSION_COOKIE};
use crate::interfaces::http::state::HttpState;

fn session_cookie(id: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax")
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, `session_id` cookie set", body = ApiResponse<AccountInfo>),
        (status = 403, description = "Unknown account or wrong password")
    )
)]
pub async fn login(
    State(state): State<HttpState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<([(axum::http::HeaderName, String); 1], Json<ApiResponse<AccountInfo>>), ApiError> {
    let account = state
        .accounts
        .authenticate(&request.user, &request.passwd)
        .await?;
    let session_id = state.sessions.create(&account.user);
    tracing::info!(user = %account.user, "User logged in");

    let cookie = session_cookie(&session_id, state.sessions.ttl().num_seconds());
    Ok((
        [(SET_COOKIE, cookie)],
        Json(ApiResponse::success(AccountInfo {
            user: account.user,
            net_id: account.net_id,
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/login",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current account", body = ApiResponse<AccountInfo>),
        (status = 403, description = "Not logged in")
    )
)]
pub async fn whoami(
    State(state): State<HttpState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<AccountInfo> {
    let account = state
        .accounts
        .find(&current.user)
        .await
        .ok_or(DomainError::AccountNotFound)?;
    Ok(Json(ApiResponse::success(AccountInfo {
        user: account.user,
        net_id: account.net_id,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/login",
    tag = "Authentication",
    responses((status = 200, description = "Signed out"))
)]
pub async fn logout(
    State(state): State<HttpState>,
    Extension(current): Extension<CurrentUser>,
) -> ([(axum::http::HeaderName, String); 1], Json<ApiResponse<()>>) {
    state.sessions.remove(&current.session_id);
    ([(SET_COOKIE, session_cookie("", 0))], Json(ApiResponse::ok()))
}

#[utoipa::path(
    put,
    path = "/api/passwd",
    tag = "Authentication",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 403, description = "Wrong old password or invalid new password")
    )
)]
pub async fn change_password(
    State(state): State<HttpState>,
    Extension(current): Extension<CurrentUser>,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    state
        .accounts
        .change_password(&current.user, &request.old_passwd, &request.new_passwd)
        .await?;
    Ok(Json(ApiResponse::ok()))
}

#[utoipa::path(
    put,
    path = "/api/netid_passwd",
    tag = "Authentication",
    request_body = ChangeNetIdPasswordRequest,
    responses(
        (status = 200, description = "Portal secret changed"),
        (status = 403, description = "Invalid secret")
    )
)]
pub async fn change_net_id_password(
    State(state): State<HttpState>,
    Extension(current): Extension<CurrentUser>,
    ValidatedJson(request): ValidatedJson<ChangeNetIdPasswordRequest>,
) -> ApiResult<()> {
    state
        .accounts
        .change_net_id_password(&current.user, &request.new_passwd)
        .await?;
    Ok(Json(ApiResponse::ok()))
}
