//! API Router with Swagger UI

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::middleware::session_middleware;
use super::modules::{auth, reservations, system};
use super::state::HttpState;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // System
        system::version,
        system::health_check,
        // Auth
        auth::login,
        auth::whoami,
        auth::logout,
        auth::change_password,
        auth::change_net_id_password,
        // Reservations
        reservations::place_reservation,
        reservations::list_reservations,
        reservations::cancel_reservation,
    ),
    components(
        schemas(
            ApiResponse<String>,
            system::VersionInfo,
            system::HealthResponse,
            system::ComponentHealth,
            auth::LoginRequest,
            auth::AccountInfo,
            auth::ChangePasswordRequest,
            auth::ChangeNetIdPasswordRequest,
            reservations::SingleBookDto,
            reservations::PlaceReservationRequest,
            reservations::PlacedReservation,
            reservations::ReservationStatusDto,
            reservations::ReservationDto,
            reservations::ReservationListDto,
        )
    ),
    tags(
        (name = "System", description = "Version and health endpoints"),
        (name = "Authentication", description = "Session login (cookie `session_id`), sign-out and password changes"),
        (name = "Reservations", description = "Place, list and cancel court reservations"),
    ),
    info(
        title = "Court Reserver API",
        version = "1.0.0",
        description = "REST API for scheduling court bookings",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: HttpState) -> Router {
    let session = || middleware::from_fn_with_state(state.clone(), session_middleware);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Login is public; reading and ending the session are not.
    let login = get(auth::whoami)
        .delete(auth::logout)
        .route_layer(session())
        .post(auth::login);

    let protected = Router::new()
        .route("/passwd", put(auth::change_password))
        .route("/netid_passwd", put(auth::change_net_id_password))
        .route(
            "/reservations",
            get(reservations::list_reservations)
                .post(reservations::place_reservation)
                .delete(reservations::cancel_reservation),
        )
        .route_layer(session());

    let api = Router::new()
        .route("/version", get(system::version))
        .route("/login", login)
        .merge(protected);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .route("/health", get(system::health_check))
        .route("/metrics", get(system::prometheus_metrics))
        .nest("/api", api)
        .with_state(state)
        .merge(swagger_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
