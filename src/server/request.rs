use may_minihttp::Request;
use std::io::Read;
use tracing::debug;

/// The parts of a raw HTTP request the router cares about.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedRequest {
    /// HTTP method, as received.
    pub method: String,
    /// Request target, unnormalized.
    pub path: String,
    /// Full body as text. Invalid UTF-8 is replaced rather than rejected;
    /// the multipart decoder works on text.
    pub body: String,
}

/// Extract method, target, and body from a `may_minihttp` request.
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let path = req.path().to_string();

    let mut raw = Vec::new();
    let body = match req.body().read_to_end(&mut raw) {
        Ok(_) => String::from_utf8_lossy(&raw).into_owned(),
        Err(_) => String::new(),
    };

    debug!(
        method = %method,
        path = %path,
        body_bytes = body.len(),
        "request parsed"
    );

    ParsedRequest { method, path, body }
}
