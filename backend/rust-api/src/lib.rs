use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // The dashboard and the quiz client are served from other origins.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(sessions_routes())
        .route("/api/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/api/quiz", get(handlers::content::get_quiz))
        .route("/api/groups/access", get(handlers::content::group_access))
        .with_state(app_state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

fn sessions_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/api/sessions", post(handlers::sessions::create_session))
        .route("/api/sessions/", post(handlers::sessions::create_session))
        .route(
            "/api/sessions/{id}/heartbeat",
            post(handlers::sessions::heartbeat),
        )
        .route(
            "/api/sessions/{id}/attempt",
            post(handlers::sessions::record_attempt),
        )
        .route(
            "/api/sessions/{id}/complete",
            post(handlers::sessions::complete_session),
        )
        .route(
            "/api/sessions/{id}/leave",
            post(handlers::sessions::leave_session),
        )
}
