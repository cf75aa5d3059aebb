//! Camera API Routes
//!
//! ## Endpoints
//! - POST /api/camera/open - acquire the capture device
//! - POST /api/camera/capture - take the photo, release the device
//! - POST /api/camera/retake - discard the photo, reopen
//! - DELETE /api/camera - release the device
//! - GET /api/camera/photo - captured JPEG

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::camera_capture::CameraView;
use crate::error::Result;
use crate::state::AppState;

/// Create camera routes
pub fn camera_routes() -> Router<AppState> {
    Router::new()
        .route("/open", post(open_camera))
        .route("/capture", post(capture_photo))
        .route("/retake", post(retake_photo))
        .route("/photo", get(get_photo))
        .route("/", delete(release_camera))
}

/// POST /api/camera/open
async fn open_camera(State(state): State<AppState>) -> Result<Json<CameraView>> {
    tracing::debug!("Camera API: Open requested");
    state.desk.open_camera().await?;
    Ok(Json(state.desk.camera().view().await))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CaptureResponse {
    camera: CameraView,
    /// `data:image/jpeg;base64,...` for immediate preview
    data_url: String,
    size: u32,
}

/// POST /api/camera/capture
///
/// ## Response
/// ```json
/// {
///   "camera": { "open": false, "opening": false, "photoPresent": true, "capturedAt": "..." },
///   "dataUrl": "data:image/jpeg;base64,/9j/4AAQ...",
///   "size": 300
/// }
/// ```
async fn capture_photo(State(state): State<AppState>) -> Result<Json<CaptureResponse>> {
    let photo = state.desk.capture_photo().await?;
    Ok(Json(CaptureResponse {
        camera: state.desk.camera().view().await,
        data_url: photo.data_url(),
        size: photo.size(),
    }))
}

/// POST /api/camera/retake
async fn retake_photo(State(state): State<AppState>) -> Result<Json<CameraView>> {
    state.desk.retake_photo().await?;
    Ok(Json(state.desk.camera().view().await))
}

/// DELETE /api/camera
async fn release_camera(State(state): State<AppState>) -> impl IntoResponse {
    let released = state.desk.release_camera().await;
    Json(json!({ "released": released }))
}

/// GET /api/camera/photo
async fn get_photo(State(state): State<AppState>) -> impl IntoResponse {
    match state.desk.photo().await {
        Some(photo) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/jpeg"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            photo.jpeg().to_vec(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error_code": "PHOTO_NOT_FOUND",
                "message": "No photo captured"
            })),
        )
            .into_response(),
    }
}
