//! Contest Registration Kiosk Library
//!
//! Student registration desk: details + photo, two-phase OTP commit
//! against the remote registration script.
//!
//! ## Architecture (7 Components)
//!
//! 1. FormState - registration fields, validation
//! 2. CameraCapture - device lifecycle, still photo (ffmpeg)
//! 3. RegistrationClient - remote script adapter (send_otp / register)
//! 4. RegistrationEngine - two-phase protocol state machine
//! 5. RegistrationDesk - kiosk facade, notices, state push
//! 6. RealtimeHub - WebSocket distribution
//! 7. WebAPI - REST API endpoints
//!
//! ## Design Principles
//!
//! - One request in flight at a time; locks never span a remote call
//! - The capture device is released on every exit path
//! - Presentation profiles change wording only, never protocol behavior

pub mod camera_capture;
pub mod form_state;
pub mod presentation;
pub mod realtime_hub;
pub mod registration_client;
pub mod registration_desk;
pub mod registration_engine;
pub mod web_api;
pub mod error;
pub mod state;

pub use error::{Error, Result};
pub use state::AppState;
