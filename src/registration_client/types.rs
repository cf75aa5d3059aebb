//! Remote registration service wire types
//!
//! Both actions go to the same endpoint as an
//! `application/x-www-form-urlencoded` POST body; the `action` field selects
//! the handler. The photo never leaves the kiosk.

use crate::form_state::RegistrationFields;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ACTION_SEND_OTP: &str = "send_otp";
pub const ACTION_REGISTER: &str = "register";

/// `status` value the service uses for success
pub const STATUS_SUCCESS: &str = "success";

/// Phase 1 body: ask the administrators for an OTP (no password)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub action: &'static str,
    pub roll_no: String,
    pub full_name: String,
    pub class: String,
    pub section: String,
    pub faculty_name: String,
}

impl From<&RegistrationFields> for SendOtpRequest {
    fn from(fields: &RegistrationFields) -> Self {
        Self {
            action: ACTION_SEND_OTP,
            roll_no: fields.roll_no.clone(),
            full_name: fields.full_name.clone(),
            class: fields.class.clone(),
            section: fields.section.clone(),
            faculty_name: fields.faculty_name.clone(),
        }
    }
}

/// Phase 2 body: OTP plus the full record
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub action: &'static str,
    pub otp: String,
    pub roll_no: String,
    pub password: String,
    pub full_name: String,
    pub class: String,
    pub section: String,
    pub faculty_name: String,
}

impl RegisterRequest {
    pub fn new(otp: impl Into<String>, fields: &RegistrationFields) -> Self {
        Self {
            action: ACTION_REGISTER,
            otp: otp.into(),
            roll_no: fields.roll_no.clone(),
            password: fields.password.clone(),
            full_name: fields.full_name.clone(),
            class: fields.class.clone(),
            section: fields.section.clone(),
            faculty_name: fields.faculty_name.clone(),
        }
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("action", &self.action)
            .field("otp", &"<redacted>")
            .field("roll_no", &self.roll_no)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .field("class", &self.class)
            .field("section", &self.section)
            .field("faculty_name", &self.faculty_name)
            .finish()
    }
}

/// `{status, message?}` returned for both actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReply {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceReply {
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> RegistrationFields {
        RegistrationFields {
            faculty_name: "Mr. Sharma".into(),
            full_name: "John Doe".into(),
            roll_no: "1201".into(),
            password: "Secret".into(),
            class: "10".into(),
            section: "A".into(),
        }
    }

    #[test]
    fn test_reply_parsing() {
        let ok: ServiceReply = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(ok.is_success());

        let err: ServiceReply =
            serde_json::from_str(r#"{"status":"error","message":"Invalid OTP"}"#).unwrap();
        assert!(!err.is_success());
        assert_eq!(err.message.as_deref(), Some("Invalid OTP"));

        let odd: ServiceReply = serde_json::from_str(r#"{"result":"ok"}"#).unwrap();
        assert!(!odd.is_success());
    }

    #[test]
    fn test_send_otp_omits_password() {
        let body = serde_json::to_value(SendOtpRequest::from(&fields())).unwrap();
        assert_eq!(body["action"], "send_otp");
        assert_eq!(body["rollNo"], "1201");
        assert_eq!(body["class"], "10");
        assert!(body.get("password").is_none());
    }

    #[test]
    fn test_register_debug_redacts_secrets() {
        let request = RegisterRequest::new("5678", &fields());
        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("Secret"));
        assert!(!rendered.contains("5678"));
        assert!(rendered.contains("1201"));
    }
}
