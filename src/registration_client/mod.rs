//! RegistrationClient Module
//!
//! Client side of the Remote Registration Service: one endpoint, two
//! actions (`send_otp`, `register`), form-encoded POST, JSON reply.
//!
//! - `types`: request bodies and the `{status, message?}` reply
//! - `service`: `RegistrationService` trait and `HttpRegistrationService`

pub mod service;
pub mod types;

pub use service::{HttpRegistrationService, RegistrationService, DEFAULT_REQUEST_TIMEOUT};
pub use types::*;
