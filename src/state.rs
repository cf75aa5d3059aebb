//! Application state
//!
//! Holds configuration and the shared kiosk components

use crate::camera_capture::{
    parse_device_list, CameraController, CameraDevice, CaptureRequest, FacingMode,
    FfmpegCaptureBackend, DEFAULT_PHOTO_QUALITY, DEFAULT_PHOTO_SIZE,
};
use crate::error::{Error, Result};
use crate::presentation::PresentationProfile;
use crate::realtime_hub::RealtimeHub;
use crate::registration_client::{HttpRegistrationService, DEFAULT_REQUEST_TIMEOUT};
use crate::registration_desk::RegistrationDesk;
use crate::registration_engine::{OtpPolicy, RegistrationEngine, DEFAULT_MAX_OTP_ATTEMPTS};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// The desk as wired for production: HTTP service + ffmpeg camera
pub type KioskDesk = RegistrationDesk<HttpRegistrationService, FfmpegCaptureBackend>;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Remote registration script URL
    pub registration_endpoint: String,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Bound on each remote request
    pub request_timeout: Duration,
    /// Capture devices with their facing
    pub camera_devices: Vec<CameraDevice>,
    /// ffmpeg input format (v4l2, avfoundation, dshow)
    pub camera_input_format: String,
    /// Wait for the first frame before giving up on the device
    pub camera_open_timeout: Duration,
    pub photo_size: u32,
    pub photo_quality: f32,
    /// 0 = unlimited
    pub otp_max_attempts: u32,
    pub presentation_profile: PresentationProfile,
    /// Static presentation assets
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup (environment, test map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let registration_endpoint = var("REGISTRATION_ENDPOINT")
            .ok_or_else(|| Error::Config("REGISTRATION_ENDPOINT is not set".to_string()))?;

        let camera_devices = parse_device_list(
            &var("CAMERA_DEVICES").unwrap_or_else(|| "environment:/dev/video0".to_string()),
        )
        .map_err(|e| Error::Config(format!("CAMERA_DEVICES: {}", e)))?;

        let presentation_profile = match var("PRESENTATION_PROFILE") {
            Some(p) => PresentationProfile::from_str(&p)
                .map_err(|e| Error::Config(format!("PRESENTATION_PROFILE: {}", e)))?,
            None => PresentationProfile::default(),
        };

        Ok(Self {
            registration_endpoint,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "PORT", 8080)?,
            request_timeout: Duration::from_secs(parse_or(
                &var,
                "REQUEST_TIMEOUT_SEC",
                DEFAULT_REQUEST_TIMEOUT.as_secs(),
            )?),
            camera_devices,
            camera_input_format: var("CAMERA_INPUT_FORMAT").unwrap_or_else(|| "v4l2".to_string()),
            camera_open_timeout: Duration::from_secs(parse_or(&var, "CAMERA_OPEN_TIMEOUT_SEC", 10)?),
            photo_size: parse_or(&var, "PHOTO_SIZE", DEFAULT_PHOTO_SIZE)?,
            photo_quality: parse_or(&var, "PHOTO_QUALITY", DEFAULT_PHOTO_QUALITY)?,
            otp_max_attempts: parse_or(&var, "OTP_MAX_ATTEMPTS", DEFAULT_MAX_OTP_ATTEMPTS)?,
            presentation_profile,
            static_dir: var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./frontend/dist")),
        })
    }

    /// Capture parameters (size / quality clamped)
    pub fn capture_request(&self) -> CaptureRequest {
        CaptureRequest::new(FacingMode::Environment, self.photo_size, self.photo_quality)
    }

    pub fn otp_policy(&self) -> OtpPolicy {
        OtpPolicy {
            max_attempts: self.otp_max_attempts,
        }
    }
}

fn parse_or<T, V>(var: &V, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("{}={}: {}", key, raw, e))),
        None => Ok(default),
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// RegistrationDesk (form + camera + protocol engine)
    pub desk: Arc<KioskDesk>,
    /// RealtimeHub (WebSocket)
    pub realtime: Arc<RealtimeHub>,
}

impl AppState {
    /// Wire the production components from config
    pub fn build(config: AppConfig) -> Result<Self> {
        let realtime = Arc::new(RealtimeHub::new());

        let service = HttpRegistrationService::new(
            config.registration_endpoint.clone(),
            config.request_timeout,
        )?;
        let backend = FfmpegCaptureBackend::new(
            config.camera_devices.clone(),
            config.camera_input_format.clone(),
            config.camera_open_timeout,
        );

        let desk = Arc::new(RegistrationDesk::new(
            RegistrationEngine::new(service, config.otp_policy()),
            CameraController::new(backend, config.capture_request()),
            realtime.clone(),
            config.presentation_profile,
        ));

        Ok(Self {
            config,
            desk,
            realtime,
        })
    }
}
