//! Registration API Routes
//!
//! ## Endpoints
//! - POST /api/registration/otp - request an OTP for the entered details
//! - POST /api/registration/confirm - verify OTP and register
//! - POST /api/registration/back - back to details
//! - POST /api/registration/next - start the next student

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::error::Result;
use crate::registration_desk::DeskView;
use crate::state::AppState;

/// Create registration routes
pub fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/otp", post(request_otp))
        .route("/confirm", post(confirm_registration))
        .route("/back", post(back))
        .route("/next", post(register_another))
}

/// POST /api/registration/otp
///
/// Uses the current form and photo; no body.
///
/// ## Response (200)
/// `DeskView` with `session.phase = "awaiting_otp"`
///
/// ## Response (502)
/// ```json
/// { "error_code": "REMOTE_REJECTION", "message": "Roll number already registered" }
/// ```
async fn request_otp(State(state): State<AppState>) -> Result<Json<DeskView>> {
    tracing::info!("Registration API: OTP requested");
    state.desk.request_otp().await?;
    Ok(Json(state.desk.view().await))
}

#[derive(Debug, Deserialize)]
struct ConfirmRequest {
    #[serde(default)]
    otp: String,
}

/// POST /api/registration/confirm
///
/// ## Request Body
/// ```json
/// { "otp": "1234" }
/// ```
async fn confirm_registration(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<DeskView>> {
    tracing::info!("Registration API: Confirmation requested");
    state.desk.confirm_registration(&req.otp).await?;
    Ok(Json(state.desk.view().await))
}

/// POST /api/registration/back
async fn back(State(state): State<AppState>) -> Result<Json<DeskView>> {
    state.desk.back().await?;
    Ok(Json(state.desk.view().await))
}

/// POST /api/registration/next
async fn register_another(State(state): State<AppState>) -> Result<Json<DeskView>> {
    state.desk.register_another().await?;
    Ok(Json(state.desk.view().await))
}
