use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

/// Field name to the messages the backend (or a local form check) attached to it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    Network,
    Server,
    Validation,
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ErrorKind::*;
        match self {
            Timeout => write!(f, "timeout"),
            Network => write!(f, "network"),
            Server => write!(f, "server"),
            Validation => write!(f, "validation"),
            NotFound => write!(f, "not_found"),
        }
    }
}

/// Terminal failure of a request, after any retries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub status: Option<StatusCode>,
    pub message: String,
    pub field_errors: FieldErrors,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ErrorInfo {
            kind,
            status: None,
            message: message.into(),
            field_errors: FieldErrors::new(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(ErrorKind::Timeout, format!("no response within {}ms", after.as_millis()))
    }

    /// A success status whose body could not be decoded.
    pub fn malformed(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Server, format!("malformed response body: {err}"))
    }

    /// Rejection raised locally, before anything is sent.
    pub fn from_field_errors(field_errors: FieldErrors) -> Self {
        ErrorInfo {
            kind: ErrorKind::Validation,
            status: None,
            message: "form is invalid".to_string(),
            field_errors,
        }
    }

    /// Classifies a non-2xx response. 4xx bodies of the form
    /// `{ "message": ..., "errors": { "<field>": ["<message>"] } }` keep their field errors.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let kind = if status == StatusCode::NOT_FOUND {
            ErrorKind::NotFound
        } else if status.is_client_error() {
            ErrorKind::Validation
        } else {
            ErrorKind::Server
        };

        let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();
        let message = parsed
            .message
            .filter(|m| !m.trim().is_empty())
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| format!("unexpected status {}", status.as_u16()));

        ErrorInfo {
            kind,
            status: Some(status),
            message,
            field_errors: parsed.errors,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout | ErrorKind::Network)
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// First field (in name order) that carries at least one message.
    pub fn first_field_error(&self) -> Option<(&str, &str)> {
        self.field_errors
            .iter()
            .find_map(|(field, messages)| messages.first().map(|m| (field.as_str(), m.as_str())))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: FieldErrors,
}

/// Failure below HTTP: nothing usable came back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
}

impl From<TransportError> for ErrorInfo {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Timeout => ErrorInfo::new(ErrorKind::Timeout, error.to_string()),
            TransportError::Connect(_) => ErrorInfo::new(ErrorKind::Network, error.to_string()),
        }
    }
}
