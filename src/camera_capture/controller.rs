//! CameraController - open / capture / retake / release
//!
//! ## Device lifecycle
//!
//! ```text
//! Closed --open()--> Opening --granted--> Open --capture()--> Closed
//!                       |                   |
//!                       +--denied--> Closed +--release()--> Closed
//! ```
//!
//! The handle in `Open` owns the stream and stops it on Drop, so every
//! exit path (capture, release, controller drop) frees the device once.
//! An `open()` dropped mid-acquire resets its own `Opening` state to `Closed`.

use super::backend::{CaptureBackend, CaptureHandle, VideoStream};
use super::types::{CameraView, CaptureRequest, CapturedPhoto};
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

enum DeviceState<S: VideoStream> {
    Closed,
    Opening { attempt: u64 },
    Open(CaptureHandle<S>),
}

/// Camera Capture Controller
pub struct CameraController<B: CaptureBackend> {
    backend: B,
    request: CaptureRequest,
    device: Arc<Mutex<DeviceState<B::Stream>>>,
    photo: RwLock<Option<CapturedPhoto>>,
    attempts: AtomicU64,
}

impl<B: CaptureBackend> CameraController<B> {
    pub fn new(backend: B, request: CaptureRequest) -> Self {
        Self {
            backend,
            request,
            device: Arc::new(Mutex::new(DeviceState::Closed)),
            photo: RwLock::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn request(&self) -> &CaptureRequest {
        &self.request
    }

    /// Acquire the capture device.
    ///
    /// - Already open: no-op
    /// - Another open pending: `Error::CameraBusy`
    /// - Denied / hardware failure: `Error::CameraAccess`, state stays closed
    pub async fn open(&self) -> Result<()> {
        let attempt = {
            let mut device = self.device.lock().await;
            match &*device {
                DeviceState::Open(handle) => {
                    tracing::debug!(device = %handle.device(), "Camera: Already open");
                    return Ok(());
                }
                DeviceState::Opening { .. } => return Err(Error::CameraBusy),
                DeviceState::Closed => {}
            }
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            *device = DeviceState::Opening { attempt };
            attempt
        };

        tracing::info!(
            attempt = attempt,
            facing = %self.request.preferred_facing,
            "Camera: Requesting capture device"
        );

        let guard = OpeningGuard {
            device: self.device.clone(),
            attempt,
            armed: true,
        };
        let acquired = self.backend.acquire(&self.request).await;

        let mut device = self.device.lock().await;
        guard.disarm();
        let still_wanted = matches!(&*device, DeviceState::Opening { attempt: a } if *a == attempt);

        match acquired {
            Ok(stream) => {
                let mut handle = CaptureHandle::new(stream);
                if still_wanted {
                    tracing::info!(attempt = attempt, device = %handle.device(), "Camera: Device open");
                    *device = DeviceState::Open(handle);
                    Ok(())
                } else {
                    // release() ran while we were waiting for the grant
                    handle.release();
                    tracing::warn!(attempt = attempt, "Camera: Open cancelled, device released");
                    Err(Error::CameraAccess("camera was closed while opening".to_string()))
                }
            }
            Err(e) => {
                if still_wanted {
                    *device = DeviceState::Closed;
                }
                tracing::warn!(attempt = attempt, error = %e, "Camera: Open failed");
                Err(e)
            }
        }
    }

    /// Take the current frame as the student photo and release the device.
    ///
    /// If no frame has arrived yet the device stays open so the operator
    /// can try again.
    pub async fn capture(&self) -> Result<CapturedPhoto> {
        let mut device = self.device.lock().await;

        let frame = match &*device {
            DeviceState::Open(handle) => handle.latest_frame(),
            _ => return Err(Error::NotOpen),
        };
        let Some(jpeg) = frame else {
            tracing::warn!("Camera: Capture requested before first frame");
            return Err(Error::CameraAccess("no frame available yet, try again".to_string()));
        };

        if let DeviceState::Open(mut handle) = std::mem::replace(&mut *device, DeviceState::Closed) {
            handle.release();
        }
        drop(device);

        let photo = CapturedPhoto::new(jpeg, self.request.size);
        *self.photo.write().await = Some(photo.clone());

        tracing::info!(
            bytes = photo.jpeg().len(),
            size = photo.size(),
            "Camera: Photo captured"
        );
        Ok(photo)
    }

    /// Discard the photo and open the camera again
    pub async fn retake(&self) -> Result<()> {
        self.clear_photo().await;
        self.release().await;
        self.open().await
    }

    /// Release the device if held; cancels a pending open.
    ///
    /// Returns true if an open stream was stopped.
    pub async fn release(&self) -> bool {
        let mut device = self.device.lock().await;
        match std::mem::replace(&mut *device, DeviceState::Closed) {
            DeviceState::Open(mut handle) => {
                handle.release();
                true
            }
            DeviceState::Opening { attempt } => {
                tracing::debug!(attempt = attempt, "Camera: Pending open cancelled");
                false
            }
            DeviceState::Closed => false,
        }
    }

    pub async fn clear_photo(&self) {
        if self.photo.write().await.take().is_some() {
            tracing::debug!("Camera: Photo cleared");
        }
    }

    pub async fn photo(&self) -> Option<CapturedPhoto> {
        self.photo.read().await.clone()
    }

    pub async fn is_open(&self) -> bool {
        matches!(&*self.device.lock().await, DeviceState::Open(_))
    }

    pub async fn view(&self) -> CameraView {
        let (open, opening) = match &*self.device.lock().await {
            DeviceState::Open(_) => (true, false),
            DeviceState::Opening { .. } => (false, true),
            DeviceState::Closed => (false, false),
        };
        let photo = self.photo.read().await;
        CameraView {
            open,
            opening,
            photo_present: photo.is_some(),
            captured_at: photo.as_ref().map(CapturedPhoto::captured_at),
        }
    }
}

/// Resets `Opening { attempt }` to `Closed` if `open()` is dropped before
/// the acquire result is applied.
struct OpeningGuard<S: VideoStream> {
    device: Arc<Mutex<DeviceState<S>>>,
    attempt: u64,
    armed: bool,
}

impl<S: VideoStream> OpeningGuard<S> {
    /// Call with the device lock held
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S: VideoStream> Drop for OpeningGuard<S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let attempt = self.attempt;
        tracing::warn!(attempt = attempt, "Camera: Open cancelled before the device was granted");
        match self.device.try_lock() {
            Ok(mut device) => abandon_open(&mut device, attempt),
            Err(_) => {
                if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                    let device = self.device.clone();
                    runtime.spawn(async move {
                        abandon_open(&mut *device.lock().await, attempt);
                    });
                }
            }
        }
    }
}

fn abandon_open<S: VideoStream>(device: &mut DeviceState<S>, attempt: u64) {
    if matches!(device, DeviceState::Opening { attempt: a } if *a == attempt) {
        *device = DeviceState::Closed;
    }
}
