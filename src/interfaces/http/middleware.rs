//! Session-cookie authentication middleware for Axum

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::common::ApiError;
use super::state::HttpState;
use crate::domain::DomainError;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// The signed-in web user, inserted into request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: String,
    pub session_id: String,
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Reject requests without a live session with Not Logged In.
pub async fn session_middleware(
    State(state): State<HttpState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(session_id) = cookie_value(request.headers(), SESSION_COOKIE) else {
        return ApiError(DomainError::NotLoggedIn).into_response();
    };

    match state.sessions.resolve(&session_id) {
        Ok(user) => {
            request
                .extensions_mut()
                .insert(CurrentUser { user, session_id });
            next.run(request).await
        }
        Err(e) => ApiError(e).into_response(),
    }
}
