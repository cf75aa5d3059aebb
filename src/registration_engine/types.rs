//! Registration session types

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================
// Operator-facing messages
// ============================================================

/// Shown for any transport failure; the cause goes to the log only
pub const NETWORK_FAILURE_MESSAGE: &str = "Network Error. Check the connection and try again.";

/// Shown when the service rejects without a message
pub const REJECTED_FALLBACK_MESSAGE: &str = "The registration service rejected the request.";

pub const PHOTO_REQUIRED_MESSAGE: &str = "A student photo must be captured first.";

pub const OTP_REQUIRED_MESSAGE: &str = "Enter the OTP sent to the administrators.";

pub const OTP_ATTEMPTS_EXHAUSTED_MESSAGE: &str =
    "Too many incorrect OTP attempts. Request a new OTP.";

/// Default number of rejected OTPs before the session falls back to phase 1
pub const DEFAULT_MAX_OTP_ATTEMPTS: u32 = 5;

// ============================================================
// State
// ============================================================

/// Registration phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Entering details and taking the photo
    #[default]
    CollectingDetails,
    /// OTP requested, waiting for the operator to enter it
    AwaitingOtp,
    /// Registration committed
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::CollectingDetails => f.write_str("collecting details"),
            Phase::AwaitingOtp => f.write_str("awaiting OTP"),
            Phase::Completed => f.write_str("completed"),
        }
    }
}

/// Status of the latest remote request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Idle,
    InFlight,
    Error,
    Success,
}

/// Engine-owned session state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSession {
    pub phase: Phase,
    /// Last OTP submitted by the operator (never serialized)
    #[serde(skip)]
    pub pending_otp: String,
    pub request_status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_message: Option<String>,
    /// Rejected OTPs since the last successful OTP request
    pub failed_otp_attempts: u32,
}

impl RegistrationSession {
    pub fn is_in_flight(&self) -> bool {
        self.request_status == RequestStatus::InFlight
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.request_status = RequestStatus::Error;
        self.last_error_message = Some(message.into());
    }
}

/// Policy for repeated OTP rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    /// 0 = unlimited
    pub max_attempts: u32,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_OTP_ATTEMPTS,
        }
    }
}

impl OtpPolicy {
    pub fn unlimited() -> Self {
        Self { max_attempts: 0 }
    }

    pub fn exhausted(&self, failed_attempts: u32) -> bool {
        self.max_attempts != 0 && failed_attempts >= self.max_attempts
    }
}
