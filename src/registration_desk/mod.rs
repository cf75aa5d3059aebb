//! RegistrationDesk - one kiosk, one operator
//!
//! ## Responsibilities
//!
//! - Owns the form, the camera and the protocol engine for the kiosk
//! - Feeds form snapshots and the captured photo into the engine
//! - Turns every outcome into an operator notice (per presentation profile)
//! - Pushes session / camera state to the RealtimeHub after each action
//!
//! All presentation-layer actions go through here; the web_api handlers
//! never touch the engine or the camera directly.

use crate::camera_capture::{CameraController, CameraView, CaptureBackend, CapturedPhoto};
use crate::error::{Error, Result};
use crate::form_state::{FieldName, FieldsView, FormStateStore};
use crate::presentation::{Notice, PhaseLabels, PresentationProfile, OTP_HINT, SUCCESS_TEXT};
use crate::realtime_hub::{HubMessage, RealtimeHub, SessionUpdatedMessage};
use crate::registration_client::RegistrationService;
use crate::registration_engine::{Phase, RegistrationEngine, RegistrationSession};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Read-only view for the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeskView {
    pub profile: PresentationProfile,
    pub session: RegistrationSession,
    pub labels: PhaseLabels,
    pub fields: FieldsView,
    pub camera: CameraView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

/// Registration Desk
pub struct RegistrationDesk<S: RegistrationService, B: CaptureBackend> {
    form: RwLock<FormStateStore>,
    camera: CameraController<B>,
    engine: RegistrationEngine<S>,
    hub: Arc<RealtimeHub>,
    profile: PresentationProfile,
    notice: RwLock<Option<Notice>>,
}

impl<S: RegistrationService, B: CaptureBackend> RegistrationDesk<S, B> {
    pub fn new(
        engine: RegistrationEngine<S>,
        camera: CameraController<B>,
        hub: Arc<RealtimeHub>,
        profile: PresentationProfile,
    ) -> Self {
        Self {
            form: RwLock::new(FormStateStore::new()),
            camera,
            engine,
            hub,
            profile,
            notice: RwLock::new(None),
        }
    }

    pub fn engine(&self) -> &RegistrationEngine<S> {
        &self.engine
    }

    pub fn camera(&self) -> &CameraController<B> {
        &self.camera
    }

    pub fn profile(&self) -> PresentationProfile {
        self.profile
    }

    // ========================================
    // Form
    // ========================================

    /// Field-change event. Fields are frozen once an OTP has been requested.
    pub async fn set_field(&self, name: &str, value: String) -> Result<()> {
        let result = self.apply_field(name, value).await;
        self.finish(result, None).await
    }

    async fn apply_field(&self, name: &str, value: String) -> Result<()> {
        let session = self.engine.session().await;
        if session.is_in_flight() {
            return Err(Error::RequestInFlight);
        }
        if session.phase != Phase::CollectingDetails {
            return Err(Error::InvalidTransition {
                action: "set_field",
                phase: session.phase,
            });
        }
        self.form.write().await.set_field_by_key(name, value)?;
        Ok(())
    }

    pub async fn field(&self, name: FieldName) -> String {
        self.form.read().await.fields().get(name).to_string()
    }

    // ========================================
    // Camera
    // ========================================

    pub async fn open_camera(&self) -> Result<()> {
        let result = self.camera.open().await;
        self.finish(result, None).await
    }

    pub async fn capture_photo(&self) -> Result<CapturedPhoto> {
        let result = self.camera.capture().await;
        self.finish(result, None).await
    }

    pub async fn retake_photo(&self) -> Result<()> {
        let result = self.camera.retake().await;
        self.finish(result, None).await
    }

    /// Stop the stream if one is running (operator cancelled or page closed)
    pub async fn release_camera(&self) -> bool {
        let released = self.camera.release().await;
        self.publish().await;
        released
    }

    pub async fn photo(&self) -> Option<CapturedPhoto> {
        self.camera.photo().await
    }

    // ========================================
    // Registration protocol
    // ========================================

    /// Transition 1 with the current form snapshot and photo
    pub async fn request_otp(&self) -> Result<()> {
        let fields = self.form.read().await.snapshot();
        let photo = self.camera.photo().await;

        let result = self.engine.request_otp(&fields, photo.as_ref()).await;
        self.finish(result, Some(Notice::info(OTP_HINT))).await
    }

    /// Transition 2 with the current form snapshot
    pub async fn confirm_registration(&self, otp: &str) -> Result<()> {
        let fields = self.form.read().await.snapshot();

        let result = self.engine.confirm_registration(otp, &fields).await;
        self.finish(result, Some(Notice::success(SUCCESS_TEXT))).await
    }

    pub async fn back(&self) -> Result<()> {
        let result = self.engine.back().await;
        self.finish(result, None).await
    }

    /// Transition 3: fresh session, per-student fields and photo cleared
    pub async fn register_another(&self) -> Result<()> {
        let result = match self.engine.register_another().await {
            Ok(()) => {
                self.form.write().await.reset_for_next_student();
                self.camera.clear_photo().await;
                self.camera.release().await;
                Ok(())
            }
            Err(e) => Err(e),
        };
        self.finish(result, None).await
    }

    // ========================================
    // View / lifecycle
    // ========================================

    pub async fn view(&self) -> DeskView {
        let session = self.engine.session().await;
        let fields = FieldsView::from(self.form.read().await.fields());
        let camera = self.camera.view().await;
        let notice = self.notice.read().await.clone();

        DeskView {
            profile: self.profile,
            labels: self.profile.labels(&session),
            session,
            fields,
            camera,
            notice,
        }
    }

    /// Release the capture device before the process exits
    pub async fn shutdown(&self) {
        if self.camera.release().await {
            tracing::info!("Desk: Capture device released on shutdown");
        }
    }

    /// Record the notice for an outcome and push state to subscribers
    async fn finish<T>(&self, result: Result<T>, on_success: Option<Notice>) -> Result<T> {
        let notice = match &result {
            Ok(_) => on_success,
            Err(e) => Some(self.profile.notice_for(e)),
        };

        *self.notice.write().await = notice.clone();
        if let Some(notice) = notice {
            self.hub.broadcast(HubMessage::Notice(notice)).await;
        }
        self.publish().await;
        result
    }

    async fn publish(&self) {
        let session = self.engine.session().await;
        let labels = self.profile.labels(&session);
        self.hub
            .broadcast(HubMessage::SessionUpdated(SessionUpdatedMessage { session, labels }))
            .await;
        self.hub
            .broadcast(HubMessage::CameraUpdated(self.camera.view().await))
            .await;
    }
}
