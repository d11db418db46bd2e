//! Error type shared by the session and browser components.

use std::fmt;

use serde_json::Value;

/// Categories of client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Rejected locally before any request (bad input)
    Validation,
    /// Operation not allowed in the current state (e.g. upload into root)
    Precondition,
    /// Network unreachable, connection reset, no response
    Transport,
    /// Non-2xx response from the API
    Api,
    /// 2xx response whose body could not be decoded
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Validation => write!(f, "validation"),
            ApiErrorKind::Precondition => write!(f, "precondition"),
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Api => write!(f, "api"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured client error with kind and a display message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status for `Api` errors
    pub status: Option<u16>,
    /// Message supplied by the server in the `msg` field, if any
    pub server_message: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            server_message: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Precondition, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    /// Creates an HTTP status error, extracting `{"msg": ...}` from the body.
    pub fn http_status(status: u16, body: &str) -> Self {
        let server_message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| json.get("msg").and_then(Value::as_str).map(str::to_string))
            .filter(|msg| !msg.trim().is_empty());

        let message = match &server_message {
            Some(msg) => msg.clone(),
            None => format!("HTTP {status}"),
        };

        Self {
            kind: ApiErrorKind::Api,
            message,
            status: Some(status),
            server_message,
        }
    }

    /// Human-readable text: the server's message when it sent one,
    /// otherwise `fallback`.
    pub fn server_message_or(&self, fallback: &str) -> String {
        self.server_message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::parse(format!("Invalid response body: {err}"))
        } else if err.is_timeout() {
            ApiError::transport("Request timed out")
        } else if err.is_connect() {
            ApiError::transport("Could not connect to the server")
        } else {
            ApiError::transport(format!("Request failed: {err}"))
        }
    }
}

/// Result type for client operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
