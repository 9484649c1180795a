//! Version, health check and Prometheus scrape handlers

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use utoipa::ToSchema;

use crate::interfaces::http::common::{ApiResponse, ApiResult};
use crate::interfaces::http::state::HttpState;

#[derive(Debug, Serialize, ToSchema)]
pub struct VersionInfo {
    pub server: String,
    /// `null` when running without a portal
    pub portal: Option<String>,
}

/// Service health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: ComponentHealth,
    pub reserver: bool,
}

/// Component health status
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/version",
    tag = "System",
    responses((status = 200, description = "Server and portal versions", body = ApiResponse<VersionInfo>))
)]
pub async fn version(State(state): State<HttpState>) -> ApiResult<VersionInfo> {
    Ok(Json(ApiResponse::success(VersionInfo {
        server: env!("CARGO_PKG_VERSION").to_string(),
        portal: state.portal_version.clone(),
    })))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is degraded", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HttpState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.db {
        Some(db) => {
            let started = Instant::now();
            let ping = db
                .execute(Statement::from_string(
                    db.get_database_backend(),
                    "SELECT 1".to_string(),
                ))
                .await;
            match ping {
                Ok(_) => ComponentHealth {
                    status: "healthy".to_string(),
                    latency_ms: Some(started.elapsed().as_millis() as u64),
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Database health check failed");
                    ComponentHealth {
                        status: "unhealthy".to_string(),
                        latency_ms: None,
                    }
                }
            }
        }
        None => ComponentHealth {
            status: "unknown".to_string(),
            latency_ms: None,
        },
    };

    let healthy = database.status != "unhealthy";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            database,
            reserver: state.portal_version.is_some(),
        }),
    )
}

/// `GET /metrics`: Prometheus scrape endpoint
pub async fn prometheus_metrics(State(state): State<HttpState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [("content-type", "text/plain; charset=utf-8")],
            "metrics recorder not installed".to_string(),
        ),
    }
}
