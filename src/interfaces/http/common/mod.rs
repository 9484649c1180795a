//! Response envelope shared by every endpoint.

pub mod validated_json;

pub use validated_json::ValidatedJson;

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Envelope returned by every `/api` endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `true` when the request succeeded
    pub success: bool,
    /// `0` on success, otherwise the error code
    pub code: i32,
    /// Error description; empty on success
    pub message: String,
    /// Payload; `null` on error or when there is nothing to return
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: 0,
            message: String::new(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: 0,
            message: String::new(),
            data: None,
        }
    }
}

/// Handler result: success envelope or a mapped [`DomainError`].
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

pub fn status_of(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::MalformedData(_) | DomainError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        DomainError::AccountNotFound
        | DomainError::InvalidAccount(_)
        | DomainError::WrongPassword
        | DomainError::InvalidPassword
        | DomainError::NotLoggedIn => StatusCode::FORBIDDEN,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let body = ApiResponse::<()>::error(self.0.code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}

/// Unwrap a query extractor, answering bad parameters as Malformed Data.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|_| ApiError(DomainError::MalformedData("Invalid / missing parameters".into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_and_code() {
        let cases = [
            (DomainError::Storage("db".into()), 500, 1),
            (DomainError::MalformedData("Invalid date".into()), 400, 2),
            (DomainError::AccountNotFound, 403, 3),
            (DomainError::WrongPassword, 403, 5),
            (DomainError::InvalidPassword, 403, 6),
            (DomainError::NotLoggedIn, 403, 7),
            (DomainError::InvalidQuery("No matching reservation".into()), 400, 8),
        ];
        for (err, status, code) in cases {
            assert_eq!(status_of(&err).as_u16(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn envelope_shape() {
        let json = serde_json::to_value(ApiResponse::success(5)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": true, "code": 0, "message": "", "data": 5})
        );
        let json = serde_json::to_value(ApiResponse::<()>::error(7, "Not Logged In")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["data"], serde_json::Value::Null);
    }
}
