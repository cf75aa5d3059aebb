//! Capture backend seam and the device handle

use super::types::CaptureRequest;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::future::Future;

/// Source of live video streams
pub trait CaptureBackend: Send + Sync + 'static {
    type Stream: VideoStream;

    /// Acquire a capture device and start streaming.
    ///
    /// Fails with `Error::CameraAccess` on permission denial or
    /// hardware failure.
    fn acquire(&self, request: &CaptureRequest) -> impl Future<Output = Result<Self::Stream>> + Send;
}

/// A running video stream
pub trait VideoStream: Send + 'static {
    /// Device path or label the stream was opened on
    fn device(&self) -> &str;

    /// Most recent encoded frame, already cropped/scaled/compressed
    fn latest_frame(&self) -> Option<Vec<u8>>;

    /// Stop all tracks. Must tolerate repeated calls.
    fn stop(&mut self);
}

/// Exclusive handle to an open capture device - released on Drop
pub struct CaptureHandle<S: VideoStream> {
    stream: S,
    opened_at: DateTime<Utc>,
    released: bool,
}

impl<S: VideoStream> CaptureHandle<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            opened_at: Utc::now(),
            released: false,
        }
    }

    pub fn latest_frame(&self) -> Option<Vec<u8>> {
        self.stream.latest_frame()
    }

    pub fn device(&self) -> &str {
        self.stream.device()
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Stop the stream. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.stream.stop();
        self.released = true;
        let held_ms = (Utc::now() - self.opened_at).num_milliseconds();
        tracing::debug!(device = %self.stream.device(), held_ms = held_ms, "Camera: Device released");
    }
}

impl<S: VideoStream> Drop for CaptureHandle<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingStream {
        stops: Arc<AtomicUsize>,
    }

    impl VideoStream for CountingStream {
        fn device(&self) -> &str {
            "/dev/video0"
        }

        fn latest_frame(&self) -> Option<Vec<u8>> {
            Some(vec![1, 2, 3])
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_release_is_idempotent() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mut handle = CaptureHandle::new(CountingStream { stops: stops.clone() });

        handle.release();
        handle.release();
        drop(handle);

        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let stops = Arc::new(AtomicUsize::new(0));
        {
            let handle = CaptureHandle::new(CountingStream { stops: stops.clone() });
            assert!(!handle.is_released());
        }
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
