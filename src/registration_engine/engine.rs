//! RegistrationEngine - two-phase OTP registration state machine
//!
//! ```text
//! CollectingDetails --request_otp ok--> AwaitingOtp --confirm ok--> Completed
//!        ^                                  |                          |
//!        +------------- back ---------------+                          |
//!        +------------- register_another ------------------------------+
//! ```
//!
//! Every transition takes the session lock twice: once to check and mark
//! `InFlight`, once to apply the outcome. The lock is never held across the
//! remote call, so a second submission during the call sees `InFlight` and
//! is rejected without issuing a request.
//!
//! If the caller is dropped during the remote call (handler cancelled,
//! client gone), a `FlightGuard` puts the session back into `Error` with
//! the network message so the kiosk is never stuck in `InFlight`.

use super::types::*;
use crate::camera_capture::CapturedPhoto;
use crate::error::{Error, Result};
use crate::form_state::{RegistrationFields, ValidationError};
use crate::registration_client::{RegisterRequest, RegistrationService, SendOtpRequest, ServiceReply};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registration Protocol Engine
pub struct RegistrationEngine<S: RegistrationService> {
    service: S,
    policy: OtpPolicy,
    session: Arc<RwLock<RegistrationSession>>,
}

impl<S: RegistrationService> RegistrationEngine<S> {
    pub fn new(service: S, policy: OtpPolicy) -> Self {
        Self {
            service,
            policy,
            session: Arc::new(RwLock::new(RegistrationSession::default())),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn policy(&self) -> OtpPolicy {
        self.policy
    }

    /// Current session (copy)
    pub async fn session(&self) -> RegistrationSession {
        self.session.read().await.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.session.read().await.phase
    }

    /// Transition 1: validate, then ask the service to issue an OTP.
    ///
    /// The photo is required but not sent.
    pub async fn request_otp(
        &self,
        fields: &RegistrationFields,
        photo: Option<&CapturedPhoto>,
    ) -> Result<()> {
        let request = {
            let mut session = self.session.write().await;
            ensure_ready(&session, "request_otp", Phase::CollectingDetails)?;

            if let Err(err) = fields.validate_for_phase1() {
                session.fail(err.to_string());
                tracing::debug!(error = %err, "Registration: OTP request blocked by missing field");
                return Err(err.into());
            }
            if photo.is_none() {
                session.fail(PHOTO_REQUIRED_MESSAGE);
                tracing::debug!("Registration: OTP request blocked, no photo");
                return Err(Error::Precondition(PHOTO_REQUIRED_MESSAGE.to_string()));
            }

            session.request_status = RequestStatus::InFlight;
            SendOtpRequest::from(fields)
        };

        tracing::info!(
            roll_no = %request.roll_no,
            faculty_name = %request.faculty_name,
            "Registration: Requesting OTP"
        );

        let guard = FlightGuard::arm(&self.session);
        let outcome = self.service.send_otp(&request).await;

        let mut session = self.session.write().await;
        guard.disarm();
        match outcome {
            Ok(reply) if reply.is_success() => {
                session.phase = Phase::AwaitingOtp;
                session.request_status = RequestStatus::Success;
                session.last_error_message = None;
                session.pending_otp.clear();
                session.failed_otp_attempts = 0;
                tracing::info!(roll_no = %request.roll_no, "Registration: OTP sent, awaiting verification");
                Ok(())
            }
            Ok(reply) => {
                let message = rejection_message(reply);
                session.fail(message.clone());
                tracing::warn!(
                    roll_no = %request.roll_no,
                    message = %message,
                    "Registration: OTP request rejected"
                );
                Err(Error::RemoteRejection(message))
            }
            Err(e) => {
                session.fail(NETWORK_FAILURE_MESSAGE);
                tracing::warn!(roll_no = %request.roll_no, error = %e, "Registration: OTP request failed");
                Err(into_transport(e))
            }
        }
    }

    /// Transition 2: submit the OTP with the full record. Single commit point.
    pub async fn confirm_registration(&self, otp: &str, fields: &RegistrationFields) -> Result<()> {
        let request = {
            let mut session = self.session.write().await;
            ensure_ready(&session, "confirm_registration", Phase::AwaitingOtp)?;

            let otp = otp.trim();
            if otp.is_empty() {
                session.fail(OTP_REQUIRED_MESSAGE);
                return Err(ValidationError::MissingOtp.into());
            }

            session.pending_otp = otp.to_string();
            session.request_status = RequestStatus::InFlight;
            RegisterRequest::new(otp, fields)
        };

        tracing::info!(roll_no = %request.roll_no, "Registration: Verifying OTP and registering");

        let guard = FlightGuard::arm(&self.session);
        let outcome = self.service.register(&request).await;

        let mut session = self.session.write().await;
        guard.disarm();
        match outcome {
            Ok(reply) if reply.is_success() => {
                session.phase = Phase::Completed;
                session.request_status = RequestStatus::Success;
                session.last_error_message = None;
                tracing::info!(
                    roll_no = %request.roll_no,
                    faculty_name = %request.faculty_name,
                    "Registration: Student registered"
                );
                Ok(())
            }
            Ok(reply) => {
                let message = rejection_message(reply);
                session.failed_otp_attempts += 1;

                if self.policy.exhausted(session.failed_otp_attempts) {
                    session.phase = Phase::CollectingDetails;
                    session.pending_otp.clear();
                    session.fail(OTP_ATTEMPTS_EXHAUSTED_MESSAGE);
                    tracing::warn!(
                        roll_no = %request.roll_no,
                        attempts = session.failed_otp_attempts,
                        message = %message,
                        "Registration: OTP attempts exhausted, back to details"
                    );
                    return Err(Error::RemoteRejection(OTP_ATTEMPTS_EXHAUSTED_MESSAGE.to_string()));
                }

                session.fail(message.clone());
                tracing::warn!(
                    roll_no = %request.roll_no,
                    attempts = session.failed_otp_attempts,
                    message = %message,
                    "Registration: Registration rejected"
                );
                Err(Error::RemoteRejection(message))
            }
            Err(e) => {
                session.fail(NETWORK_FAILURE_MESSAGE);
                tracing::warn!(roll_no = %request.roll_no, error = %e, "Registration: Registration request failed");
                Err(into_transport(e))
            }
        }
    }

    /// Operator "back": AwaitingOtp -> CollectingDetails, client-side only
    pub async fn back(&self) -> Result<()> {
        let mut session = self.session.write().await;
        ensure_ready(&session, "back", Phase::AwaitingOtp)?;

        session.phase = Phase::CollectingDetails;
        session.request_status = RequestStatus::Idle;
        session.pending_otp.clear();
        session.last_error_message = None;
        tracing::info!("Registration: Back to details");
        Ok(())
    }

    /// Transition 3: start a fresh session after a completed registration
    pub async fn register_another(&self) -> Result<()> {
        let mut session = self.session.write().await;
        ensure_ready(&session, "register_another", Phase::Completed)?;

        *session = RegistrationSession::default();
        tracing::info!("Registration: New session started");
        Ok(())
    }
}

/// Reverts an `InFlight` session if the transition is dropped before its
/// outcome is applied.
struct FlightGuard {
    session: Arc<RwLock<RegistrationSession>>,
    armed: bool,
}

impl FlightGuard {
    fn arm(session: &Arc<RwLock<RegistrationSession>>) -> Self {
        Self {
            session: session.clone(),
            armed: true,
        }
    }

    /// Call with the session write lock held, before applying the outcome
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        tracing::warn!("Registration: Request cancelled before completion");
        match self.session.try_write() {
            Ok(mut session) => abandon_flight(&mut session),
            Err(_) => {
                // Contended: finish the revert once the lock is free
                if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                    let session = self.session.clone();
                    runtime.spawn(async move {
                        abandon_flight(&mut *session.write().await);
                    });
                }
            }
        }
    }
}

fn abandon_flight(session: &mut RegistrationSession) {
    if session.is_in_flight() {
        session.pending_otp.clear();
        session.fail(NETWORK_FAILURE_MESSAGE);
    }
}

fn ensure_ready(session: &RegistrationSession, action: &'static str, expected: Phase) -> Result<()> {
    if session.is_in_flight() {
        tracing::debug!(action = action, "Registration: Rejected, request in flight");
        return Err(Error::RequestInFlight);
    }
    if session.phase != expected {
        return Err(Error::InvalidTransition {
            action,
            phase: session.phase,
        });
    }
    Ok(())
}

fn rejection_message(reply: ServiceReply) -> String {
    reply
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| REJECTED_FALLBACK_MESSAGE.to_string())
}

fn into_transport(e: Error) -> Error {
    match e {
        Error::Transport(_) => e,
        other => Error::Transport(other.to_string()),
    }
}
