//! Shared helpers for integration tests: a tiny HTTP server that records
//! requests and answers with canned responses.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
    pub received_at: Instant,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

/// A canned response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = Arc<dyn Fn(usize, &RecordedRequest) -> MockResponse + Send + Sync>;

/// Runs on its own thread and runtime so it serves both async tests and
/// blocking `assert_cmd` tests.
pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    /// `responder` gets the zero-based index of the request among those not
    /// aimed at `/health`, and the request itself.
    pub fn start<F>(responder: F) -> Self
    where
        F: Fn(usize, &RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        Self::start_with_health(MockResponse::new(200, r#"{"status":"ok"}"#), responder)
    }

    /// Same as [`MockServer::start`], answering `/health` with `health`.
    pub fn start_with_health<F>(health: MockResponse, responder: F) -> Self
    where
        F: Fn(usize, &RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        listener.set_nonblocking(true).expect("non-blocking listener");
        let addr = listener.local_addr().expect("mock server address");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let responder: Responder = Arc::new(responder);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock server runtime");
            runtime.block_on(async move {
                let listener = TcpListener::from_std(listener).expect("tokio listener");
                let counter = Arc::new(AtomicUsize::new(0));
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        continue;
                    };
                    let recorded = Arc::clone(&recorded);
                    let responder = Arc::clone(&responder);
                    let counter = Arc::clone(&counter);
                    let health = health.clone();
                    tokio::spawn(async move {
                        let _ =
                            handle_connection(stream, recorded, responder, counter, health).await;
                    });
                }
            });
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    /// Answers every request with the same response.
    pub fn always(response: MockResponse) -> Self {
        Self::start(move |_, _| response.clone())
    }

    /// Requests received so far, `/health` probes excluded.
    pub fn api_requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("request log")
            .iter()
            .filter(|request| request.path != "/health")
            .cloned()
            .collect()
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    responder: Responder,
    counter: Arc<AtomicUsize>,
    health: MockResponse,
) -> std::io::Result<()> {
    let mut raw = Vec::with_capacity(1024);
    let header_end = loop {
        let mut chunk = [0_u8; 1024];
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        raw.extend_from_slice(&chunk[..read]);
        if let Some(pos) = raw.windows(4).position(|bytes| bytes == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while raw.len() < header_end + content_length {
        let mut chunk = [0_u8; 1024];
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..read]);
    }

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let request = RecordedRequest {
        method: request_line.next().unwrap_or_default().to_string(),
        path: request_line.next().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&raw[header_end..]).to_string(),
        received_at: Instant::now(),
    };
    recorded.lock().expect("request log").push(request.clone());

    let response = if request.path == "/health" {
        health
    } else {
        let index = counter.fetch_add(1, Ordering::SeqCst);
        responder(index, &request)
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let reply = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.body.len(),
        response.body
    );
    stream.write_all(reply.as_bytes()).await?;
    stream.shutdown().await
}

/// A local address nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe port");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}")
}

/// A suite config document with two image lists, one location (empty value),
/// one person prompt and one pipeline: two combinations.
pub fn suite_json(base_url: &str, max_retries: u32, retry_delay: f64, timeout: f64) -> String {
    format!(
        r#"{{
  "base_url": "{base_url}",
  "endpoint": "/api/preview",
  "timeout_seconds": {timeout},
  "test_suite_name": "Integration Suite",
  "test_settings": {{
    "animation_prompt": "slow zoom",
    "max_retries": {max_retries},
    "retry_delay_seconds": {retry_delay}
  }},
  "image_lists": {{
    "solo": {{"name": "Solo", "description": "one image", "urls": ["http://img/solo.png"]}},
    "duo": {{"name": "Duo", "urls": ["http://img/a.png", "http://img/b.png"]}}
  }},
  "location_prompts": {{
    "none": {{"name": "No Location", "value": ""}}
  }},
  "person_prompts": {{
    "smile": {{"name": "Smiling", "value": "a smiling person"}}
  }},
  "pipeline_configs": {{
    "fast": {{"name": "Fast", "filename": "fast.json"}}
  }}
}}"#
    )
}

pub const SUCCESS_BODY: &str = r#"{"status":"completed","images_requested":2,"processed_images":["http://out/1.png","http://out/2.png"],"saved_state_blob":"abc123"}"#;
