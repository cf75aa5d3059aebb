//! Camera capture type definitions

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================
// Defaults
// ============================================================

/// Square edge of the captured still (px)
pub const DEFAULT_PHOTO_SIZE: u32 = 300;

/// JPEG quality (0.0 - 1.0)
pub const DEFAULT_PHOTO_QUALITY: f32 = 0.7;

/// Allowed square edge range (px)
pub const MIN_PHOTO_SIZE: u32 = 64;
pub const MAX_PHOTO_SIZE: u32 = 1024;

// ============================================================
// Device selection
// ============================================================

/// Which way a camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera
    Environment,
    /// Front (selfie) camera
    User,
}

impl FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            "user" | "front" => Ok(FacingMode::User),
            other => Err(format!("unknown camera facing: {}", other)),
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::Environment => f.write_str("environment"),
            FacingMode::User => f.write_str("user"),
        }
    }
}

/// A configured video input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub path: String,
    pub facing: Option<FacingMode>,
}

/// Parse `facing:path` entries separated by commas.
///
/// A bare path has no facing hint. `environment:/dev/video2,user:/dev/video0`
pub fn parse_device_list(list: &str) -> Result<Vec<CameraDevice>, String> {
    let mut devices = Vec::new();
    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let device = match entry.split_once(':') {
            Some((facing, path)) if !path.is_empty() => CameraDevice {
                path: path.trim().to_string(),
                facing: Some(facing.parse()?),
            },
            Some(_) => return Err(format!("empty device path in '{}'", entry)),
            None => CameraDevice {
                path: entry.to_string(),
                facing: None,
            },
        };
        devices.push(device);
    }

    if devices.is_empty() {
        return Err("no camera devices configured".to_string());
    }
    Ok(devices)
}

/// Pick the device matching the preferred facing, else the first one
pub fn select_device(devices: &[CameraDevice], preferred: FacingMode) -> Option<&CameraDevice> {
    devices
        .iter()
        .find(|d| d.facing == Some(preferred))
        .or_else(|| devices.first())
}

// ============================================================
// Capture request / result
// ============================================================

/// Parameters for one open/capture cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    pub preferred_facing: FacingMode,
    /// Square edge in px
    pub size: u32,
    /// JPEG quality 0.0 - 1.0
    pub quality: f32,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            preferred_facing: FacingMode::Environment,
            size: DEFAULT_PHOTO_SIZE,
            quality: DEFAULT_PHOTO_QUALITY,
        }
    }
}

impl CaptureRequest {
    pub fn new(preferred_facing: FacingMode, size: u32, quality: f32) -> Self {
        Self {
            preferred_facing,
            size: size.clamp(MIN_PHOTO_SIZE, MAX_PHOTO_SIZE),
            quality: quality.clamp(0.0, 1.0),
        }
    }

    /// ffmpeg `-q:v` value (2 = best, 31 = worst) for the requested quality
    pub fn jpeg_qscale(&self) -> u8 {
        let q = self.quality.clamp(0.0, 1.0);
        2 + ((1.0 - q) * 29.0).round() as u8
    }
}

/// Encoded still frame kept on the kiosk
#[derive(Clone)]
pub struct CapturedPhoto {
    jpeg: Arc<[u8]>,
    size: u32,
    captured_at: DateTime<Utc>,
}

impl CapturedPhoto {
    pub fn new(jpeg: Vec<u8>, size: u32) -> Self {
        Self {
            jpeg: jpeg.into(),
            size,
            captured_at: Utc::now(),
        }
    }

    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// `data:image/jpeg;base64,...`
    pub fn data_url(&self) -> String {
        format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.jpeg)
        )
    }
}

impl fmt::Debug for CapturedPhoto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedPhoto")
            .field("bytes", &self.jpeg.len())
            .field("size", &self.size)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Camera state as exposed to the presentation layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraView {
    pub open: bool,
    pub opening: bool,
    pub photo_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_list() {
        let devices = parse_device_list("user:/dev/video0, environment:/dev/video2").unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].facing, Some(FacingMode::User));
        assert_eq!(devices[1].path, "/dev/video2");

        let bare = parse_device_list("/dev/video0").unwrap();
        assert_eq!(bare[0].facing, None);

        assert!(parse_device_list("").is_err());
        assert!(parse_device_list("sideways:/dev/video0").is_err());
    }

    #[test]
    fn test_select_device_prefers_rear() {
        let devices = parse_device_list("user:/dev/video0,environment:/dev/video2").unwrap();
        let picked = select_device(&devices, FacingMode::Environment).unwrap();
        assert_eq!(picked.path, "/dev/video2");

        let front_only = parse_device_list("user:/dev/video0").unwrap();
        let picked = select_device(&front_only, FacingMode::Environment).unwrap();
        assert_eq!(picked.path, "/dev/video0");
    }

    #[test]
    fn test_jpeg_qscale() {
        assert_eq!(CaptureRequest::new(FacingMode::User, 300, 1.0).jpeg_qscale(), 2);
        assert_eq!(CaptureRequest::new(FacingMode::User, 300, 0.0).jpeg_qscale(), 31);
        assert_eq!(CaptureRequest::default().jpeg_qscale(), 11);
    }

    #[test]
    fn test_request_clamps_size() {
        assert_eq!(CaptureRequest::new(FacingMode::User, 10, 0.7).size, MIN_PHOTO_SIZE);
        assert_eq!(CaptureRequest::new(FacingMode::User, 4096, 0.7).size, MAX_PHOTO_SIZE);
    }

    #[test]
    fn test_data_url() {
        let photo = CapturedPhoto::new(vec![0xFF, 0xD8, 0xFF, 0xD9], 300);
        assert_eq!(photo.data_url(), "data:image/jpeg;base64,/9j/2Q==");
    }
}
