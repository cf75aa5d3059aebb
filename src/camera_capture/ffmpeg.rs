//! ffmpeg capture backend
//!
//! Streams the selected video device through ffmpeg as MJPEG on stdout.
//! Each frame is already center-cropped to a square, scaled and
//! JPEG-compressed, so a snapshot is just "take the latest frame".

use super::backend::{CaptureBackend, VideoStream};
use super::types::{select_device, CameraDevice, CaptureRequest};
use crate::error::{Error, Result};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Frame rate requested from ffmpeg
const STREAM_FPS: u32 = 10;

/// Largest partial frame kept while waiting for EOI
const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

type LatestFrame = Option<Arc<Vec<u8>>>;

/// Capture backend driving a local ffmpeg binary
pub struct FfmpegCaptureBackend {
    program: String,
    devices: Vec<CameraDevice>,
    input_format: String,
    open_timeout: Duration,
}

impl FfmpegCaptureBackend {
    /// # Arguments
    /// * `devices` - configured inputs (see `parse_device_list`)
    /// * `input_format` - ffmpeg `-f` for the input (e.g. `v4l2`, `avfoundation`); empty to let ffmpeg probe
    /// * `open_timeout` - how long to wait for the first frame
    pub fn new(devices: Vec<CameraDevice>, input_format: impl Into<String>, open_timeout: Duration) -> Self {
        Self {
            program: "ffmpeg".to_string(),
            devices,
            input_format: input_format.into(),
            open_timeout,
        }
    }

    /// Use a different ffmpeg binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    fn build_args(&self, device: &CameraDevice, request: &CaptureRequest) -> Vec<String> {
        let mut args: Vec<String> = vec!["-loglevel".into(), "error".into()];
        if !self.input_format.is_empty() {
            args.push("-f".into());
            args.push(self.input_format.clone());
        }
        args.extend([
            "-i".to_string(),
            device.path.clone(),
            "-vf".to_string(),
            format!(
                "crop=min(iw\\,ih):min(iw\\,ih),scale={0}:{0}",
                request.size
            ),
            "-r".to_string(),
            STREAM_FPS.to_string(),
            "-q:v".to_string(),
            request.jpeg_qscale().to_string(),
            "-f".to_string(),
            "image2pipe".to_string(),
            "-vcodec".to_string(),
            "mjpeg".to_string(),
            "-".to_string(),
        ]);
        args
    }

    /// Check if ffmpeg is available
    pub async fn check_ffmpeg(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-version")
            .output()
            .await
            .map_err(|e| Error::Config(format!("ffmpeg not found: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Config("ffmpeg version check failed".to_string()));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        Ok(version.lines().next().unwrap_or("unknown").to_string())
    }
}

impl CaptureBackend for FfmpegCaptureBackend {
    type Stream = FfmpegStream;

    async fn acquire(&self, request: &CaptureRequest) -> Result<FfmpegStream> {
        let device = select_device(&self.devices, request.preferred_facing)
            .ok_or_else(|| Error::CameraAccess("no capture device configured".to_string()))?
            .clone();

        tracing::info!(
            device = %device.path,
            facing = ?device.facing,
            size = request.size,
            qscale = request.jpeg_qscale(),
            "Camera: Starting ffmpeg stream"
        );

        // kill_on_drop: a dropped Child (error path, panic, shutdown) takes ffmpeg with it
        let mut child = Command::new(&self.program)
            .args(self.build_args(&device, request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::CameraAccess(format!("failed to start ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::CameraAccess("ffmpeg stdout unavailable".to_string()))?;

        let last_error = Arc::new(Mutex::new(None::<String>));
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_stderr(stderr, device.path.clone(), last_error.clone())));

        let (tx, mut rx) = watch::channel::<LatestFrame>(None);
        let reader = tokio::spawn(read_frames(stdout, tx, device.path.clone()));

        let first_frame = timeout(self.open_timeout, rx.changed()).await;
        match first_frame {
            Ok(Ok(())) => {
                tracing::info!(device = %device.path, "Camera: First frame received, device open");
                Ok(FfmpegStream {
                    child: Some(child),
                    frames: rx,
                    reader,
                    device: device.path,
                })
            }
            Ok(Err(_)) => {
                // Stream ended before any frame: permission denied, busy, missing device...
                let _ = child.start_kill();
                if let Some(task) = stderr_task {
                    let _ = timeout(Duration::from_secs(1), task).await;
                }
                let detail = last_error
                    .lock()
                    .ok()
                    .and_then(|guard| guard.clone())
                    .unwrap_or_else(|| "capture device closed the stream".to_string());
                tracing::warn!(device = %device.path, error = %detail, "Camera: Open failed");
                Err(Error::CameraAccess(format!("{}: {}", device.path, detail)))
            }
            Err(_) => {
                let _ = child.start_kill();
                reader.abort();
                tracing::warn!(
                    device = %device.path,
                    timeout_sec = self.open_timeout.as_secs(),
                    "Camera: No frame before timeout, ffmpeg killed"
                );
                Err(Error::CameraAccess(format!(
                    "{}: no frame within {}s",
                    device.path,
                    self.open_timeout.as_secs()
                )))
            }
        }
    }
}

/// Running ffmpeg stream
pub struct FfmpegStream {
    child: Option<Child>,
    frames: watch::Receiver<LatestFrame>,
    reader: JoinHandle<()>,
    device: String,
}

impl VideoStream for FfmpegStream {
    fn device(&self) -> &str {
        &self.device
    }

    fn latest_frame(&self) -> Option<Vec<u8>> {
        self.frames.borrow().as_ref().map(|frame| frame.as_ref().clone())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                tracing::warn!(device = %self.device, error = %e, "Camera: Failed to signal ffmpeg");
            }
        }
        self.reader.abort();
    }
}

async fn read_frames(mut stdout: ChildStdout, tx: watch::Sender<LatestFrame>, device: String) {
    let mut splitter = FrameSplitter::default();
    let mut buf = vec![0u8; 64 * 1024];
    let mut frame_count: u64 = 0;

    loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for frame in splitter.push(&buf[..n]) {
                    frame_count += 1;
                    tx.send_replace(Some(Arc::new(frame)));
                }
            }
            Err(e) => {
                tracing::warn!(device = %device, error = %e, "Camera: Stream read failed");
                break;
            }
        }
    }

    tracing::debug!(device = %device, frames = frame_count, "Camera: Stream ended");
}

async fn drain_stderr(stderr: ChildStderr, device: String, last_error: Arc<Mutex<Option<String>>>) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        tracing::warn!(device = %device, message = %line, "Camera: ffmpeg");
        if let Ok(mut slot) = last_error.lock() {
            *slot = Some(line);
        }
    }
}

/// Splits a concatenated MJPEG byte stream into whole JPEG images
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buf: Vec<u8>,
}

impl FrameSplitter {
    /// Feed bytes, get back every frame completed by them
    pub fn push(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(data);
        let mut frames = Vec::new();

        loop {
            let Some(start) = find_marker(&self.buf, &SOI, 0) else {
                // A trailing 0xFF may be the first half of the next SOI
                let keep = usize::from(self.buf.last() == Some(&0xFF));
                let cut = self.buf.len() - keep;
                self.buf.drain(..cut);
                break;
            };
            if start > 0 {
                self.buf.drain(..start);
            }

            match find_marker(&self.buf, &EOI, SOI.len()) {
                Some(end) => {
                    frames.push(self.buf.drain(..end + EOI.len()).collect());
                }
                None => {
                    if self.buf.len() > MAX_FRAME_BYTES {
                        tracing::warn!(bytes = self.buf.len(), "Camera: Oversized frame discarded");
                        self.buf.clear();
                    }
                    break;
                }
            }
        }

        frames
    }

    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }
}

fn find_marker(haystack: &[u8], marker: &[u8; 2], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(2)
        .position(|w| w == marker)
        .map(|pos| pos + from)
}
