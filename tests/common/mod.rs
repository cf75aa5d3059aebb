//! In-process stand-in for the remote registration script

#![allow(dead_code)]

use axum::{extract::State, routing::post, Form, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const VALID_OTP: &str = "5678";
pub const DUPLICATE_ROLL_NO: &str = "DUP";
pub const HTML_ROLL_NO: &str = "HTML";

/// Every form body the script received, in order
#[derive(Clone, Default)]
pub struct Received(Arc<Mutex<Vec<HashMap<String, String>>>>);

impl Received {
    pub fn all(&self) -> Vec<HashMap<String, String>> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, action: &str) -> usize {
        self.all()
            .iter()
            .filter(|f| f.get("action").map(String::as_str) == Some(action))
            .count()
    }
}

async fn script(
    State(received): State<Received>,
    Form(form): Form<HashMap<String, String>>,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    received.0.lock().unwrap().push(form.clone());

    let roll_no = form.get("rollNo").map(String::as_str).unwrap_or_default();
    if roll_no == HTML_ROLL_NO {
        return "<html>Service unavailable</html>".into_response();
    }

    let reply: Value = match form.get("action").map(String::as_str) {
        Some("send_otp") if roll_no == DUPLICATE_ROLL_NO => {
            json!({ "status": "error", "message": "Roll number already registered" })
        }
        Some("send_otp") => json!({ "status": "success" }),
        Some("register") if form.get("otp").map(String::as_str) == Some(VALID_OTP) => {
            json!({ "status": "success", "message": "Registered" })
        }
        Some("register") => json!({ "status": "error", "message": "Invalid OTP" }),
        _ => json!({ "status": "error", "message": "Unknown action" }),
    };
    Json(reply).into_response()
}

/// Start the fake script on 127.0.0.1:0; returns its URL
pub async fn spawn_script() -> (String, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/exec", post(script))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/exec", addr), received)
}
