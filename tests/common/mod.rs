#![allow(dead_code)]

use hsspd::error::ServiceError;
use hsspd::pipeline::PipelineStrategy;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Mutex, Once};

/// Ensures the may runtime is configured only once per test binary.
static MAY_INIT: Once = Once::new();

pub fn setup_may_runtime() {
    MAY_INIT.call_once(|| {
        may::config().set_stack_size(0x20000);
    });
}

/// Reserve an ephemeral port for a test server.
pub fn free_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Strategy double that records every call and answers with a canned report.
pub struct RecordingStrategy {
    pub calls: Mutex<Vec<(&'static str, String)>>,
    pub response: String,
}

impl RecordingStrategy {
    pub fn new(response: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            response: response.to_string(),
        }
    }

    pub fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, input: &str) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push((op, input.to_string()));
        Ok(self.response.clone())
    }
}

impl PipelineStrategy for RecordingStrategy {
    fn assign_structure(&self, structure: &str) -> Result<String, ServiceError> {
        self.record("assign_structure", structure)
    }

    fn align_from_structure(&self, structure: &str) -> Result<String, ServiceError> {
        self.record("align_from_structure", structure)
    }

    fn align_from_sequence(&self, sequence: &str) -> Result<String, ServiceError> {
        self.record("align_from_sequence", sequence)
    }
}

/// Strategy double that fails every call with the given error.
pub struct FailingStrategy(pub ServiceError);

impl PipelineStrategy for FailingStrategy {
    fn assign_structure(&self, _: &str) -> Result<String, ServiceError> {
        Err(self.0.clone())
    }

    fn align_from_structure(&self, _: &str) -> Result<String, ServiceError> {
        Err(self.0.clone())
    }

    fn align_from_sequence(&self, _: &str) -> Result<String, ServiceError> {
        Err(self.0.clone())
    }
}

/// A parsed HTTP response from a test request.
pub struct TestResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Send one HTTP request over a fresh connection and read the full response.
pub fn send_request(addr: SocketAddr, method: &str, target: &str, body: &str) -> TestResponse {
    let stream = TcpStream::connect(addr).unwrap();
    let mut writer = stream.try_clone().unwrap();
    write!(
        writer,
        "{method} {target} HTTP/1.1\r\nHost: test\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .unwrap();
    writer.flush().unwrap();

    let mut reader = BufReader::new(stream);
    let mut status_line = String::new();
    reader.read_line(&mut status_line).unwrap();
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .expect("status line")
        .parse()
        .expect("status code");

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).unwrap();

    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    }
}

/// Build a multipart payload in the shape browsers post to the submission
/// endpoints.
pub fn multipart_payload(field: &str, filename: Option<&str>, body: &str) -> String {
    let mut out = String::from("--FORMBOUNDARY\r\n");
    out.push_str("Content-Disposition: form-data; name=\"");
    out.push_str(field);
    out.push('"');
    if let Some(f) = filename {
        out.push_str("; filename=\"");
        out.push_str(f);
        out.push('"');
    }
    out.push_str("\r\n\r\n");
    out.push_str(body);
    out.push_str("--FORMBOUNDARY--\r\n");
    out
}

/// A structure text whose identifier bytes `[62, 66)` spell `1ABC`, long
/// enough for filename derivation.
pub fn structure_with_id() -> String {
    format!("{:<62}{}\r\n", "HEADER    HYDROLASE", "1ABC")
}
