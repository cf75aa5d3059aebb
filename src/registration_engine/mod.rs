//! RegistrationEngine Module
//!
//! The two-phase commit protocol: request an OTP for the entered details,
//! then verify the OTP and register. Owns the `RegistrationSession`.
//!
//! - `types`: phase, request status, session, OTP attempt policy
//! - `engine`: `RegistrationEngine` transitions

pub mod engine;
pub mod types;

pub use engine::RegistrationEngine;
pub use types::*;
