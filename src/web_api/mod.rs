//! WebAPI - REST API Endpoints
//!
//! ## Responsibilities
//!
//! - HTTP API routes for the kiosk presentation layer
//! - Request validation
//! - Response formatting (errors via `crate::Error` -> JSON)

mod camera_routes;
mod registration_routes;
mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub camera_open: bool,
    pub ws_clients: u64,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        camera_open: state.desk.camera().is_open().await,
        ws_clients: state.realtime.connection_count(),
    };

    Json(response)
}
