//! Remote Registration Service client
//!
//! ## Responsibilities
//! - Form-encoded POST of the two actions to the script endpoint
//! - Parse `{status, message?}` replies
//! - Map network / timeout / parse failures to `Error::Transport`
//!
//! Interpreting a non-success status is the engine's job; this layer only
//! reports what the service said.

use super::types::*;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Default bound on one remote request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Remote Registration Service seam
pub trait RegistrationService: Send + Sync + 'static {
    /// `action=send_otp`
    fn send_otp(&self, request: &SendOtpRequest) -> impl Future<Output = Result<ServiceReply>> + Send;

    /// `action=register`
    fn register(&self, request: &RegisterRequest) -> impl Future<Output = Result<ServiceReply>> + Send;
}

/// HTTP implementation backed by reqwest
pub struct HttpRegistrationService {
    endpoint: String,
    http_client: Client,
}

impl HttpRegistrationService {
    /// # Arguments
    /// * `endpoint` - script URL (e.g. https://script.google.com/macros/s/.../exec)
    /// * `timeout` - bound on connect + response
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(Error::Config("registration endpoint is empty".to_string()));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_form<T: Serialize + ?Sized>(&self, action: &str, form: &T) -> Result<ServiceReply> {
        tracing::debug!(
            url = %self.endpoint,
            action = %action,
            "RegistrationService: Posting form"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(action = %action, error = %e, "RegistrationService: HTTP request failed");
                Error::Transport(format!("HTTP request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(action = %action, error = %e, "RegistrationService: Failed to read response");
            Error::Transport(format!("Failed to read response: {}", e))
        })?;

        match serde_json::from_str::<ServiceReply>(&body) {
            Ok(reply) => {
                tracing::debug!(
                    action = %action,
                    http_status = %status,
                    status = %reply.status,
                    message = ?reply.message,
                    "RegistrationService: Got response"
                );
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!(
                    action = %action,
                    http_status = %status,
                    error = %e,
                    "RegistrationService: Unparseable response"
                );
                Err(Error::Transport(format!(
                    "Unexpected response ({}): {}",
                    status, e
                )))
            }
        }
    }
}

impl RegistrationService for HttpRegistrationService {
    async fn send_otp(&self, request: &SendOtpRequest) -> Result<ServiceReply> {
        self.post_form(ACTION_SEND_OTP, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<ServiceReply> {
        self.post_form(ACTION_REGISTER, request).await
    }
}
