//! E2E Test Tool for the Contest Registration Kiosk
//!
//! Drives a running kiosk through its HTTP API. Phase 2 needs the OTP the
//! administrators received, so `confirm` only runs when `--otp` is given.
//!
//! ## Usage
//! ```bash
//! # Everything up to the OTP request
//! cargo run --bin registration-e2e -- --kiosk http://127.0.0.1:8080 --all
//!
//! # Finish the registration with the OTP the admins got
//! cargo run --bin registration-e2e -- --kiosk http://127.0.0.1:8080 --test confirm --otp 4821
//! ```

use anyhow::{anyhow, Result};
use clap::Parser;
use colored::*;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "registration-e2e")]
#[command(about = "E2E Test Tool for the Contest Registration Kiosk")]
struct Args {
    /// Kiosk server URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    kiosk: String,

    /// Run all tests
    #[arg(long)]
    all: bool,

    /// Run specific test (health, session, validation, fields, camera, otp, confirm, next)
    #[arg(long)]
    test: Option<String>,

    /// OTP received by the administrators (enables confirm)
    #[arg(long)]
    otp: Option<String>,

    /// Faculty name to register under
    #[arg(long, default_value = "E2E Faculty")]
    faculty: String,

    /// Roll number for the test student
    #[arg(long, default_value = "E2E-0001")]
    roll_no: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Test result
#[derive(Debug)]
struct TestResult {
    name: String,
    success: bool,
    skipped: bool,
    duration_ms: u64,
    message: String,
    details: Option<String>,
}

impl TestResult {
    fn success(name: &str, duration_ms: u64, message: &str) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            skipped: false,
            duration_ms,
            message: message.to_string(),
            details: None,
        }
    }

    fn failure(name: &str, duration_ms: u64, message: &str) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            skipped: false,
            duration_ms,
            message: message.to_string(),
            details: None,
        }
    }

    fn skipped(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            skipped: true,
            duration_ms: 0,
            message: message.to_string(),
            details: None,
        }
    }

    fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    fn print(&self, verbose: bool) {
        let (status, result) = if self.skipped {
            ("-".yellow(), "SKIPPED".yellow())
        } else if self.success {
            ("✓".green(), "SUCCESS".green())
        } else {
            ("✗".red(), "FAILED".red())
        };
        println!(
            "{} {}: {} ({}ms)",
            status,
            self.name.bold(),
            result,
            self.duration_ms
        );
        if !self.message.is_empty() {
            println!("   └─ {}", self.message);
        }
        if verbose || !self.success {
            if let Some(ref details) = self.details {
                for line in details.lines() {
                    println!("      {}", line.dimmed());
                }
            }
        }
    }
}

/// Subset of the kiosk's session view
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeskView {
    session: SessionView,
    labels: LabelsView,
    camera: CameraView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    phase: String,
    request_status: String,
    last_error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelsView {
    submit: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CameraView {
    open: bool,
    photo_present: bool,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error_code: String,
    message: String,
}

struct TestRunner {
    client: Client,
    kiosk_url: String,
    args: Args,
}

impl TestRunner {
    fn new(args: Args) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            kiosk_url: args.kiosk.trim_end_matches('/').to_string(),
            args,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.kiosk_url, path)
    }

    async fn view(&self) -> Result<DeskView> {
        let resp = self.client.get(self.url("/api/session")).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("GET /api/session returned {}", resp.status()));
        }
        Ok(resp.json::<DeskView>().await?)
    }

    async fn post(&self, path: &str, body: Option<serde_json::Value>) -> Result<(StatusCode, String)> {
        let mut req = self.client.post(self.url(path));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        Ok((status, resp.text().await.unwrap_or_default()))
    }

    async fn set_field(&self, name: &str, value: &str) -> Result<StatusCode> {
        let resp = self
            .client
            .put(self.url("/api/form/field"))
            .json(&json!({ "name": name, "value": value }))
            .send()
            .await?;
        Ok(resp.status())
    }

    /// Test 1: liveness
    async fn test_health(&self) -> TestResult {
        let start = Instant::now();
        match self.client.get(self.url("/health")).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body = resp.text().await.unwrap_or_default();
                TestResult::success("Health", start.elapsed().as_millis() as u64, "Kiosk is up")
                    .with_details(&body)
            }
            Ok(resp) => TestResult::failure(
                "Health",
                start.elapsed().as_millis() as u64,
                &format!("HTTP {}", resp.status().as_u16()),
            ),
            Err(e) => TestResult::failure(
                "Health",
                start.elapsed().as_millis() as u64,
                &format!("Request error: {}", e),
            ),
        }
    }

    /// Test 2: session view parses and reports a phase
    async fn test_session(&self) -> TestResult {
        let start = Instant::now();
        match self.view().await {
            Ok(view) => TestResult::success(
                "Session",
                start.elapsed().as_millis() as u64,
                &format!(
                    "phase={} status={} submit=\"{}\"",
                    view.session.phase, view.session.request_status, view.labels.submit
                ),
            ),
            Err(e) => TestResult::failure("Session", start.elapsed().as_millis() as u64, &e.to_string()),
        }
    }

    /// Test 3: an empty field blocks the OTP request locally
    async fn test_validation(&self) -> TestResult {
        let start = Instant::now();
        if let Err(e) = self.set_field("rollNo", "").await {
            return TestResult::failure("Validation", 0, &format!("Request error: {}", e));
        }

        match self.post("/api/registration/otp", None).await {
            Ok((status, body)) => {
                let duration = start.elapsed().as_millis() as u64;
                let code = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error_code)
                    .unwrap_or_default();
                if status == StatusCode::UNPROCESSABLE_ENTITY || status == StatusCode::PRECONDITION_FAILED {
                    TestResult::success("Validation", duration, &format!("Blocked with {}", code))
                } else {
                    TestResult::failure("Validation", duration, &format!("Unexpected HTTP {}", status.as_u16()))
                        .with_details(&body)
                }
            }
            Err(e) => TestResult::failure("Validation", start.elapsed().as_millis() as u64, &e.to_string()),
        }
    }

    /// Test 4: fill every field
    async fn test_fields(&self) -> TestResult {
        let start = Instant::now();
        let fields = [
            ("facultyName", self.args.faculty.as_str()),
            ("fullName", "E2E Student"),
            ("rollNo", self.args.roll_no.as_str()),
            ("password", "e2e-password"),
            ("class", "10"),
            ("section", "A"),
        ];

        for (name, value) in fields {
            match self.set_field(name, value).await {
                Ok(status) if status.is_success() => {}
                Ok(status) => {
                    return TestResult::failure(
                        "Fields",
                        start.elapsed().as_millis() as u64,
                        &format!("{} rejected with HTTP {}", name, status.as_u16()),
                    )
                }
                Err(e) => {
                    return TestResult::failure(
                        "Fields",
                        start.elapsed().as_millis() as u64,
                        &format!("Request error: {}", e),
                    )
                }
            }
        }
        TestResult::success("Fields", start.elapsed().as_millis() as u64, "6 fields set")
    }

    /// Test 5: open, capture, check the device was released and the JPEG is served
    async fn test_camera(&self) -> TestResult {
        let start = Instant::now();

        match self.post("/api/camera/open", None).await {
            Ok((status, _)) if status.is_success() => {}
            Ok((status, body)) => {
                return TestResult::failure(
                    "Camera",
                    start.elapsed().as_millis() as u64,
                    &format!("Open failed: HTTP {}", status.as_u16()),
                )
                .with_details(&body)
            }
            Err(e) => return TestResult::failure("Camera", 0, &format!("Request error: {}", e)),
        }

        // Give the device a moment to deliver frames
        let mut captured = None;
        for _ in 0..10 {
            match self.post("/api/camera/capture", None).await {
                Ok((status, body)) if status.is_success() => {
                    captured = Some(body);
                    break;
                }
                Ok((status, _)) if status == StatusCode::SERVICE_UNAVAILABLE => {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                }
                Ok((status, body)) => {
                    return TestResult::failure(
                        "Camera",
                        start.elapsed().as_millis() as u64,
                        &format!("Capture failed: HTTP {}", status.as_u16()),
                    )
                    .with_details(&body)
                }
                Err(e) => return TestResult::failure("Camera", 0, &format!("Request error: {}", e)),
            }
        }
        if captured.is_none() {
            return TestResult::failure("Camera", start.elapsed().as_millis() as u64, "No frame from device");
        }

        let photo = match self.client.get(self.url("/api/camera/photo")).send().await {
            Ok(resp) if resp.status().is_success() => resp.bytes().await.map(|b| b.len()).unwrap_or(0),
            Ok(resp) => {
                return TestResult::failure(
                    "Camera",
                    start.elapsed().as_millis() as u64,
                    &format!("Photo fetch: HTTP {}", resp.status().as_u16()),
                )
            }
            Err(e) => return TestResult::failure("Camera", 0, &format!("Request error: {}", e)),
        };

        let duration = start.elapsed().as_millis() as u64;
        match self.view().await {
            Ok(view) if !view.camera.open && view.camera.photo_present => {
                TestResult::success("Camera", duration, &format!("Photo {} bytes, device released", photo))
            }
            Ok(view) => TestResult::failure(
                "Camera",
                duration,
                &format!("open={} photoPresent={}", view.camera.open, view.camera.photo_present),
            ),
            Err(e) => TestResult::failure("Camera", duration, &e.to_string()),
        }
    }

    /// Test 6: phase 1 against the real registration script
    async fn test_otp(&self) -> TestResult {
        let start = Instant::now();
        match self.post("/api/registration/otp", None).await {
            Ok((status, body)) => {
                let duration = start.elapsed().as_millis() as u64;
                if status.is_success() {
                    TestResult::success("RequestOtp", duration, "OTP sent to admins, phase=awaiting_otp")
                } else {
                    let message = serde_json::from_str::<ApiError>(&body)
                        .map(|e| format!("{}: {}", e.error_code, e.message))
                        .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
                    TestResult::failure("RequestOtp", duration, &message).with_details(&body)
                }
            }
            Err(e) => TestResult::failure("RequestOtp", start.elapsed().as_millis() as u64, &e.to_string()),
        }
    }

    /// Test 7: phase 2 with the OTP given on the command line
    async fn test_confirm(&self) -> TestResult {
        let Some(otp) = self.args.otp.as_deref() else {
            return TestResult::skipped("Confirm", "pass --otp to run");
        };

        let start = Instant::now();
        match self
            .post("/api/registration/confirm", Some(json!({ "otp": otp })))
            .await
        {
            Ok((status, body)) => {
                let duration = start.elapsed().as_millis() as u64;
                if status.is_success() {
                    TestResult::success("Confirm", duration, "Student registered")
                } else {
                    let last_error = self
                        .view()
                        .await
                        .ok()
                        .and_then(|v| v.session.last_error_message)
                        .unwrap_or_default();
                    TestResult::failure("Confirm", duration, &format!("HTTP {} {}", status.as_u16(), last_error))
                        .with_details(&body)
                }
            }
            Err(e) => TestResult::failure("Confirm", start.elapsed().as_millis() as u64, &e.to_string()),
        }
    }

    /// Test 8: next student keeps faculty/class/section
    async fn test_next(&self) -> TestResult {
        let start = Instant::now();
        match self.view().await {
            Ok(view) if view.session.phase != "completed" => {
                return TestResult::skipped("NextStudent", &format!("phase is {}", view.session.phase));
            }
            Ok(_) => {}
            Err(e) => return TestResult::failure("NextStudent", 0, &e.to_string()),
        }

        match self.post("/api/registration/next", None).await {
            Ok((status, body)) if status.is_success() => {
                let duration = start.elapsed().as_millis() as u64;
                let view: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
                let kept = view["fields"]["facultyName"] == self.args.faculty.as_str();
                let cleared = view["fields"]["rollNo"] == "";
                if kept && cleared {
                    TestResult::success("NextStudent", duration, "Per-student fields cleared")
                } else {
                    TestResult::failure("NextStudent", duration, "Unexpected field state").with_details(&body)
                }
            }
            Ok((status, body)) => TestResult::failure(
                "NextStudent",
                start.elapsed().as_millis() as u64,
                &format!("HTTP {}", status.as_u16()),
            )
            .with_details(&body),
            Err(e) => TestResult::failure("NextStudent", start.elapsed().as_millis() as u64, &e.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    println!("{}", "═".repeat(60).blue());
    println!("{}", "  Contest Registration Kiosk E2E Test Tool".bold());
    println!("{}", "═".repeat(60).blue());
    println!();
    println!("Kiosk Target: {}", args.kiosk.cyan());
    println!();

    let tests_to_run: Vec<String> = if args.all {
        ["health", "session", "validation", "fields", "camera", "otp", "confirm", "next"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else if let Some(ref test) = args.test {
        vec![test.clone()]
    } else {
        ["health", "session", "validation", "fields"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    };

    let verbose = args.verbose;
    let runner = TestRunner::new(args)?;

    println!("{}", "Running tests...".yellow());
    println!("{}", "─".repeat(60));

    let mut results: Vec<TestResult> = Vec::new();
    for test in &tests_to_run {
        let result = match test.as_str() {
            "health" => runner.test_health().await,
            "session" => runner.test_session().await,
            "validation" => runner.test_validation().await,
            "fields" => runner.test_fields().await,
            "camera" => runner.test_camera().await,
            "otp" => runner.test_otp().await,
            "confirm" => runner.test_confirm().await,
            "next" => runner.test_next().await,
            _ => TestResult::failure(test, 0, "Unknown test"),
        };
        result.print(verbose);
        results.push(result);
    }

    println!("{}", "─".repeat(60));

    // Summary
    let passed = results.iter().filter(|r| r.success && !r.skipped).count();
    let skipped = results.iter().filter(|r| r.skipped).count();
    let failed = results.iter().filter(|r| !r.success).count();

    println!();
    if failed == 0 {
        println!("{} {} passed, {} skipped", "✓".green(), passed, skipped);
    } else {
        println!("{} {} passed, {} failed, {} skipped", "⚠".yellow(), passed, failed, skipped);
    }

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
