//! Test doubles for the backend: a scripted in-memory [`Backend`] and a
//! canned HTTP responder for wire-level tests.

use crate::backend::types::{
    Assignment, LogEntry, LogLevel, PollResult, ProcessResponse, SimulationRequest,
    StatusResponse, Trace,
};
use crate::backend::{Backend, BackendError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, Semaphore};

pub fn http_error(status: u16, message: &str) -> BackendError {
    BackendError::Http {
        status,
        message: message.to_string(),
    }
}

pub fn info_entry(content: &str) -> LogEntry {
    LogEntry {
        level: LogLevel::Info,
        content: content.to_string(),
        timestamp: None,
    }
}

pub fn step(label: &str, values: &[(&str, i64)]) -> (String, Assignment) {
    let state = values.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    (label.to_string(), state)
}

/// Holds `updates` calls until the test releases them.
pub struct Gate {
    entered: Notify,
    release: Semaphore,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
        }
    }
}

impl Gate {
    /// Wait until a call is parked at the gate.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let one parked call through.
    pub fn open_one(&self) {
        self.release.add_permits(1);
    }
}

/// Backend double answering from per-endpoint queues and recording every call.
#[derive(Default)]
pub struct ScriptedBackend {
    process: Mutex<VecDeque<Result<ProcessResponse, BackendError>>>,
    updates: Mutex<VecDeque<Result<PollResult, BackendError>>>,
    traces: Mutex<VecDeque<Result<Trace, BackendError>>>,
    calls: Mutex<Vec<String>>,
    simulations: Mutex<Vec<SimulationRequest>>,
    gate: Option<Arc<Gate>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Gate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_process(&self, response: Result<ProcessResponse, BackendError>) {
        self.process.lock().push_back(response);
    }

    pub fn push_update(&self, response: Result<PollResult, BackendError>) {
        self.updates.lock().push_back(response);
    }

    pub fn push_trace(&self, response: Result<Trace, BackendError>) {
        self.traces.lock().push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(endpoint)).count()
    }

    pub fn simulations(&self) -> Vec<SimulationRequest> {
        self.simulations.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait::async_trait]
impl Backend for ScriptedBackend {
    fn base_url(&self) -> &str {
        "scripted://backend"
    }

    async fn process(&self, input_text: &str) -> Result<ProcessResponse, BackendError> {
        self.record(format!("process:{}", input_text.len()));
        self.process
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Malformed("no scripted response".to_string())))
    }

    async fn updates(&self, request_id: &str) -> Result<PollResult, BackendError> {
        self.record(format!("updates:{}", request_id));
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            if let Ok(permit) = gate.release.acquire().await {
                permit.forget();
            }
        }
        self.updates
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(PollResult::default()))
    }

    async fn status(&self, request_id: &str) -> Result<StatusResponse, BackendError> {
        self.record(format!("status:{}", request_id));
        Ok(StatusResponse { completed: false })
    }

    async fn complete(&self, request_id: &str) -> Result<(), BackendError> {
        self.record(format!("complete:{}", request_id));
        Ok(())
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<Trace, BackendError> {
        self.record("simulate".to_string());
        self.simulations.lock().push(request.clone());
        self.traces
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![step("initial", &[])]))
    }
}

/// A request as seen by [`CannedServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request line, e.g. `GET /updates/1 HTTP/1.1`.
    pub head: String,
    pub body: String,
}

/// Serves queued `(status, json body)` responses in order, one per connection.
pub struct CannedServer {
    addr: std::net::SocketAddr,
    requests: Arc<tokio::sync::Mutex<Vec<RecordedRequest>>>,
}

impl CannedServer {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let recorded = requests.clone();
        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let _ = respond(stream, status, &body, &recorded).await;
            }
        });
        Self { addr, requests }
    }

    /// A URL nobody listens on.
    pub async fn unused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }
}

async fn respond(
    stream: TcpStream,
    status: u16,
    body: &str,
    recorded: &tokio::sync::Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);
    let mut head = String::new();
    reader.read_line(&mut head).await?;

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut request_body = vec![0u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut request_body).await?;
    }

    // Recorded before answering so the client never observes a reply first.
    recorded.lock().await.push(RecordedRequest {
        head: head.trim_end().to_string(),
        body: String::from_utf8_lossy(&request_body).into_owned(),
    });

    let mut stream = reader.into_inner();
    let response = format!(
        "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await
}
