//! Route definitions for the Employee Portal API
//!
//! This module organizes all API routes and applies middleware.

use crate::auth::require_auth;
use crate::config::CorsConfig;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;

mod auth;
mod employees;
mod health;


pub use auth::{cleared_session_cookie, session_cookie};

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let base_path = state.config().server.base_path.trim_end_matches('/').to_string();
    let cors = cors_layer(&state.config().cors);

    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check));

    // Nesting at "/" is not allowed; an empty base path mounts at the root
    let router = if base_path.is_empty() {
        router.merge(user_routes(state.clone()))
    } else {
        router.nest(&base_path, user_routes(state.clone()))
    };

    router
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Account and roster routes, mounted under the base path
fn user_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password/:token", post(auth::reset_password));

    let protected = Router::new()
        .route(
            "/employees",
            get(employees::list_employees).post(employees::add_employee),
        )
        .route(
            "/employees/:id",
            put(employees::update_employee).delete(employees::delete_employee),
        )
        .route("/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}

/// CORS for the single configured frontend origin, with credentials
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    // A wildcard cannot be combined with credentials
    if config.allowed_origin.trim() == "*" {
        warn!("Ignoring wildcard CORS origin; set an explicit origin");
        return cors;
    }

    match config.allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            warn!(origin = %config.allowed_origin, error = %e, "Ignoring unusable CORS origin");
            cors
        }
    }
}
