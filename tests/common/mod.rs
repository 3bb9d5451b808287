#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use file_insights::backend::wire::{
    ProcessResponse, RawAdvancedRecord, RawBasicRecord, RawDistribution, RawMetadata,
};
use file_insights::backend::{Backend, TransportError, TransportErrorKind, TransportResult};
use file_insights::core::config::TimeZoneChoice;
use file_insights::dashboard::controller::DashboardController;
use file_insights::dashboard::model::{DashboardModel, FidelityMode};
use file_insights::dashboard::normalizer::TimestampStyle;
use file_insights::dashboard::orchestrator::RequestOrchestrator;
use file_insights::logger::jsonl::ActivityLog;

// ──────────────────── CLI runner ────────────────────

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with_env(case_name, args, &[])
}

/// Like [`run_cli_case`], with extra environment variables set on the child.
pub fn run_cli_case_with_env(case_name: &str, args: &[&str], env: &[(&str, &str)]) -> CmdResult {
    let root = std::env::temp_dir().join("file-insights-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let output = Command::new(env!("CARGO_BIN_EXE_file-insights"))
        .args(args)
        .env("RUST_BACKTRACE", "1")
        .env_remove("FILE_INSIGHTS_OUTPUT_FORMAT")
        .env_remove("FILE_INSIGHTS_BASE_URL")
        .envs(env.iter().copied())
        .output()
        .expect("execute file-insights command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let log_content = format!(
        "case={case_name}\nargs={args:?}\nstatus={:?}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}\n",
        output.status.code()
    );
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

// ──────────────────── scripted backend ────────────────────

/// Canned answers for every endpoint.
#[derive(Debug, Clone)]
pub struct Script {
    pub process: TransportResult<ProcessResponse>,
    pub basic: TransportResult<RawMetadata>,
    pub advanced: TransportResult<RawMetadata>,
    pub reset: TransportResult<()>,
    pub by_age: TransportResult<RawDistribution>,
    pub by_type: TransportResult<RawDistribution>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            process: Ok(ProcessResponse::default()),
            basic: Ok(RawMetadata::Basic(Vec::new())),
            advanced: Ok(RawMetadata::Advanced(Vec::new())),
            reset: Ok(()),
            by_age: Ok(RawDistribution::new()),
            by_type: Ok(RawDistribution::new()),
        }
    }
}

/// In-memory [`Backend`] that records every call and answers from a [`Script`].
///
/// When a gate is armed, metadata calls wait for [`ScriptedBackend::release`]
/// before answering.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<String>>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            ..Self::default()
        }
    }

    /// Metadata answers are held until [`Self::release`].
    pub fn gated(script: Script) -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::new(script)
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn update(&self, edit: impl FnOnce(&mut Script)) {
        edit(&mut self.script.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn answer<T>(&self, pick: impl FnOnce(&Script) -> T) -> T {
        pick(&self.script.lock().unwrap())
    }
}

impl Backend for ScriptedBackend {
    async fn process_folder(&self, folder_path: &str) -> TransportResult<ProcessResponse> {
        self.record(format!("process {folder_path}"));
        self.answer(|s| s.process.clone())
    }

    async fn fetch_metadata(
        &self,
        folder_path: &str,
        mode: FidelityMode,
    ) -> TransportResult<RawMetadata> {
        self.record(format!("metadata {folder_path} {}", mode.as_str()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.answer(|s| match mode {
            FidelityMode::Basic => s.basic.clone(),
            FidelityMode::Advanced => s.advanced.clone(),
        })
    }

    async fn reset_index(&self, folder_path: &str) -> TransportResult<()> {
        self.record(format!("reset {folder_path}"));
        self.answer(|s| s.reset.clone())
    }

    async fn analytics_by_age(&self) -> TransportResult<RawDistribution> {
        self.record("by-age".to_string());
        self.answer(|s| s.by_age.clone())
    }

    async fn analytics_by_type(&self) -> TransportResult<RawDistribution> {
        self.record("by-type".to_string());
        self.answer(|s| s.by_type.clone())
    }
}

// ──────────────────── fixtures ────────────────────

pub fn utc_style() -> TimestampStyle {
    TimestampStyle {
        format: "%Y-%m-%d %H:%M:%S".to_string(),
        zone: TimeZoneChoice::Utc,
    }
}

pub fn controller(backend: ScriptedBackend) -> DashboardController<ScriptedBackend> {
    DashboardController::new(
        DashboardModel::default(),
        RequestOrchestrator::new(backend, utc_style()),
        ActivityLog::disabled(),
    )
}

pub fn basic_record(name: &str, path: &str, size: Value) -> RawBasicRecord {
    RawBasicRecord {
        name: Some(name.to_string()),
        path: Some(path.to_string()),
        size: Some(size),
        ctime: Some(json!(0)),
        mtime: Some(json!("2024-03-01T12:30:00Z")),
        atime: None,
    }
}

pub fn advanced_record(name: &str, attributes: &[(&str, Value)]) -> RawAdvancedRecord {
    RawAdvancedRecord {
        file_name: Some(name.to_string()),
        file_path: Some(format!("/data/{name}")),
        attributes: Some(
            attributes
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        ),
    }
}

pub fn distribution(pairs: &[(&str, u64)]) -> RawDistribution {
    pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
}

pub fn status_error(status: u16, body: &str) -> TransportError {
    TransportError::from_status(status, body)
}

pub fn connect_error() -> TransportError {
    TransportError::new(TransportErrorKind::Connect, "connection refused")
}

// ──────────────────── loopback HTTP stub ────────────────────

/// One canned answer, selected by request path.
#[derive(Debug, Clone)]
pub struct Route {
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn new(path: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self {
            path,
            status,
            body: body.into(),
        }
    }
}

/// Minimal HTTP/1.1 server on 127.0.0.1 that answers each connection once.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let routes = routes.clone();
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let head = read_head(&mut socket).await;
                    let request_line = head.lines().next().unwrap_or_default().to_string();
                    let target = request_line.split(' ').nth(1).unwrap_or_default();
                    let path = target.split('?').next().unwrap_or_default();
                    let (status, body) = routes
                        .iter()
                        .find(|route| route.path == path)
                        .map_or((404, String::new()), |route| {
                            (route.status, route.body.clone())
                        });
                    seen.lock().unwrap().push(request_line);

                    let response = format!(
                        "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        reason(status),
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    /// Request lines received so far, e.g. `GET /api/files/metadata?... HTTP/1.1`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
