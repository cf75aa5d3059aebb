//! Presentation binding
//!
//! One engine, two decorations. `Minimal` keeps operator wording generic;
//! `Rich` adds per-field prompts ("Enter Faculty Name") and the photo
//! reminder. Nothing here changes protocol behavior.

use crate::error::Error;
use crate::form_state::{FieldName, ValidationError};
use crate::registration_engine::{Phase, RegistrationSession};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const OTP_HINT: &str = "OTP sent to Admins.";
pub const SUCCESS_TEXT: &str = "Student Registered Successfully.";

/// Wording profile for operator-facing text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationProfile {
    Minimal,
    #[default]
    Rich,
}

impl FromStr for PresentationProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(PresentationProfile::Minimal),
            "rich" => Ok(PresentationProfile::Rich),
            other => Err(format!("unknown presentation profile: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Toast/alert text for the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Button and hint text for the current phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseLabels {
    pub submit: String,
    pub submit_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl PresentationProfile {
    /// Operator text for a failed action
    pub fn notice_for(&self, error: &Error) -> Notice {
        let text = match error {
            Error::Validation(ValidationError::MissingField(field)) => match self {
                PresentationProfile::Rich => match field {
                    FieldName::FacultyName => "Enter Faculty Name".to_string(),
                    other => format!("Enter {}", other.label()),
                },
                PresentationProfile::Minimal => "Please fill in all details.".to_string(),
            },
            Error::Validation(ValidationError::MissingOtp) => "Enter the OTP.".to_string(),
            Error::Validation(other) => other.to_string(),
            Error::Precondition(message) => match self {
                PresentationProfile::Rich => "Capture Photo First".to_string(),
                PresentationProfile::Minimal => message.clone(),
            },
            Error::CameraAccess(detail) => format!("Camera Error: {}", detail),
            Error::CameraBusy => "Camera is starting, please wait.".to_string(),
            Error::NotOpen => "Open the camera first.".to_string(),
            Error::RemoteRejection(message) => message.clone(),
            Error::Transport(_) => crate::registration_engine::NETWORK_FAILURE_MESSAGE.to_string(),
            Error::RequestInFlight => "Please wait, a request is in progress.".to_string(),
            Error::InvalidTransition { .. } => "That action is not available right now.".to_string(),
            Error::Config(_) | Error::Serialization(_) | Error::Io(_) => {
                "Something went wrong on the kiosk.".to_string()
            }
        };
        Notice::error(text)
    }

    /// Submit label / enabled flag / hint for the session
    pub fn labels(&self, session: &RegistrationSession) -> PhaseLabels {
        let busy = session.is_in_flight();
        match session.phase {
            Phase::CollectingDetails => PhaseLabels {
                submit: if busy { "Processing..." } else { "Verify & Register >" }.to_string(),
                submit_enabled: !busy,
                hint: None,
            },
            Phase::AwaitingOtp => PhaseLabels {
                submit: if busy { "Registering..." } else { "Confirm Registration" }.to_string(),
                submit_enabled: !busy,
                hint: Some(OTP_HINT.to_string()),
            },
            Phase::Completed => PhaseLabels {
                submit: "Next Student".to_string(),
                submit_enabled: true,
                hint: match self {
                    PresentationProfile::Rich => Some(SUCCESS_TEXT.to_string()),
                    PresentationProfile::Minimal => None,
                },
            },
        }
    }
}
