//! Error types shared across the pipeline and the service client.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A candidate could not be decoded as a raster image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// Name of the offending candidate
    pub name: String,
    /// Decoder message
    pub message: String,
}

impl DecodeError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot decode {}: {}", self.name, self.message)
    }
}

impl std::error::Error for DecodeError {}

/// Re-encoding a resized raster produced no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeError {
    pub message: String,
}

impl EncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn unsupported(mime_type: &str) -> Self {
        Self::new(format!("no encoder for {mime_type}"))
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encode: {}", self.message)
    }
}

impl std::error::Error for EncodeError {}

/// Categories of clustering service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// The upload form could not be built; nothing was sent
    Request,
    /// The request never completed (DNS, refused connection, reset)
    Connect,
    /// The configured request timeout elapsed
    Timeout,
    /// The service answered with a non-success status
    HttpStatus,
    /// The response body was not the expected JSON
    Parse,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Request => write!(f, "request"),
            TransportErrorKind::Connect => write!(f, "connect"),
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::HttpStatus => write!(f, "http_status"),
            TransportErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Single user-facing failure of a submission.
#[derive(Debug, Clone, Serialize)]
pub struct TransportError {
    /// Error category
    pub kind: TransportErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// A batch entry could not be attached to the multipart form.
    pub fn form(name: &str, details: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Request,
            message: format!("could not build upload form for {name}"),
            details: Some(details.into()),
        }
    }

    /// Classifies a reqwest failure that happened before a response arrived.
    pub fn from_request(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(TransportErrorKind::Timeout, "clustering request timed out")
        } else {
            Self {
                kind: TransportErrorKind::Connect,
                message: "clustering request failed".to_string(),
                details: Some(err.to_string()),
            }
        }
    }

    /// Creates an HTTP status error, pulling a `detail`/`error` message out of
    /// a JSON body when the service sends one.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = format!("HTTP {status}");
        if body.is_empty() {
            return Self::new(TransportErrorKind::HttpStatus, message);
        }

        if let Ok(json) = serde_json::from_str::<Value>(body)
            && let Some(msg) = json
                .get("detail")
                .or_else(|| json.get("error"))
                .and_then(Value::as_str)
        {
            return Self {
                kind: TransportErrorKind::HttpStatus,
                message: format!("HTTP {status}: {msg}"),
                details: Some(body.to_string()),
            };
        }

        Self {
            kind: TransportErrorKind::HttpStatus,
            message,
            details: Some(body.to_string()),
        }
    }

    pub fn parse(details: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Parse,
            message: "invalid clustering response".to_string(),
            details: Some(details.into()),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {}
