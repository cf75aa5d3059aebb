//! API Routes

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use super::camera_routes::camera_routes;
use super::registration_routes::registration_routes;
use crate::error::Result;
use crate::realtime_hub::{HubMessage, SessionUpdatedMessage};
use crate::registration_desk::DeskView;
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(super::health_check))
        .route("/api/health", get(super::health_check))
        // Session / form
        .route("/api/session", get(get_session))
        .route("/api/form/field", put(update_field))
        // Camera
        .nest("/api/camera", camera_routes())
        // Registration protocol
        .nest("/api/registration", registration_routes())
        // WebSocket
        .route("/api/ws", get(websocket_handler))
        .with_state(state)
}

/// GET /api/session
async fn get_session(State(state): State<AppState>) -> Json<DeskView> {
    Json(state.desk.view().await)
}

#[derive(Debug, Deserialize)]
struct FieldUpdate {
    name: String,
    value: String,
}

/// PUT /api/form/field
///
/// ## Request Body
/// ```json
/// { "name": "rollNo", "value": "1201" }
/// ```
async fn update_field(
    State(state): State<AppState>,
    Json(req): Json<FieldUpdate>,
) -> Result<Json<DeskView>> {
    state.desk.set_field(&req.name, req.value).await?;
    Ok(Json(state.desk.view().await))
}

// ========================================
// WebSocket Handler
// ========================================

/// WebSocket upgrade handler
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Register with RealtimeHub
    let (conn_id, mut rx) = state.realtime.register().await;

    // Current state first, so a reloaded page does not wait for the next action
    let view = state.desk.view().await;
    let initial = [
        HubMessage::SessionUpdated(SessionUpdatedMessage {
            session: view.session,
            labels: view.labels,
        }),
        HubMessage::CameraUpdated(view.camera),
    ];

    // Spawn task to forward messages from hub to WebSocket
    let send_task = tokio::spawn(async move {
        for message in initial {
            let Ok(json) = serde_json::to_string(&message) else {
                continue;
            };
            if sender.send(Message::Text(json)).await.is_err() {
                return;
            }
        }
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Incoming messages are ignored apart from close / errors
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Ping(data)) => {
                    // Pong is handled automatically by axum
                    tracing::trace!("Received ping: {:?}", data);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %conn_id, "WebSocket client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::warn!(connection_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
        conn_id
    });

    // Wait for either task to complete
    let conn_id = tokio::select! {
        _ = send_task => conn_id,
        result = recv_task => result.unwrap_or(conn_id),
    };

    // Unregister from hub
    state.realtime.unregister(&conn_id).await;
}
