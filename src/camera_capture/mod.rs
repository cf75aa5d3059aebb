//! CameraCapture Module
//!
//! Acquires a live video device, turns the current frame into a square
//! JPEG still, and releases the device.
//!
//! ## Module layout
//! - `types`: capture request, captured photo, device selection
//! - `backend`: `CaptureBackend` / `VideoStream` seam and `CaptureHandle`
//! - `ffmpeg`: production backend (ffmpeg MJPEG pipe)
//! - `controller`: `CameraController` open/capture/retake/release
//!
//! ## Usage
//! ```rust,ignore
//! let backend = FfmpegCaptureBackend::new(devices, "v4l2", Duration::from_secs(10));
//! let camera = CameraController::new(backend, CaptureRequest::default());
//!
//! camera.open().await?;
//! let photo = camera.capture().await?; // device released here
//! ```

pub mod backend;
pub mod controller;
pub mod ffmpeg;
pub mod types;

pub use backend::{CaptureBackend, CaptureHandle, VideoStream};
pub use controller::CameraController;
pub use ffmpeg::{FfmpegCaptureBackend, FfmpegStream, FrameSplitter};
pub use types::*;
