use crate::http::headers::Headers;

/// `METHOD target HTTP/version`, immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub http_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub request_line: RequestLine,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    /// Whether the client asked for the connection to end after this
    /// exchange. Only an exact `close` counts.
    pub fn wants_close(&self) -> bool {
        self.headers.get("connection") == "close"
    }
}
