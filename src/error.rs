//! Error handling for the registration kiosk

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Camera permission denied or hardware unavailable
    #[error("Camera access error: {0}")]
    CameraAccess(String),

    /// Another open() is still pending
    #[error("Camera busy: an open request is already pending")]
    CameraBusy,

    /// capture() without an open device
    #[error("Camera is not open")]
    NotOpen,

    /// Missing or malformed operator input
    #[error("Validation error: {0}")]
    Validation(#[from] crate::form_state::ValidationError),

    /// Transition precondition not met (e.g. no photo)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Action not valid in the current phase
    #[error("Invalid transition: {action} is not allowed while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: crate::registration_engine::Phase,
    },

    /// Duplicate submission while a request is outstanding
    #[error("A request is already in flight")]
    RequestInFlight,

    /// Backend answered with a non-success status
    #[error("{0}")]
    RemoteRejection(String),

    /// Network, timeout or response parse failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable code used by the presentation API
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::CameraAccess(_) => "CAMERA_ACCESS_ERROR",
            Error::CameraBusy => "CAMERA_BUSY",
            Error::NotOpen => "CAMERA_NOT_OPEN",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Precondition(_) => "PRECONDITION_FAILED",
            Error::InvalidTransition { .. } => "INVALID_TRANSITION",
            Error::RequestInFlight => "REQUEST_IN_FLIGHT",
            Error::RemoteRejection(_) => "REMOTE_REJECTION",
            Error::Transport(_) => "TRANSPORT_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::CameraAccess(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::CameraBusy | Error::RequestInFlight | Error::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            Error::NotOpen | Error::Precondition(_) => StatusCode::PRECONDITION_FAILED,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::RemoteRejection(_) | Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::Serialization(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = match &self {
            Error::Transport(cause) => {
                tracing::warn!(cause = %cause, "Transport failure reported to client");
                crate::registration_engine::NETWORK_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error_code = %error_code,
                message = %message,
                "Request error"
            );
        } else {
            tracing::debug!(
                status = %status,
                error_code = %error_code,
                message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
