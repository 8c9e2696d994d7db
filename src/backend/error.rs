//! Backend error types

use thiserror::Error;

/// Any failure to get a usable answer out of the backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ConnectivityError {
    pub kind: ConnectivityErrorKind,
    pub message: String,
}

impl ConnectivityError {
    pub fn new(kind: ConnectivityErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ConnectivityErrorKind::Timeout, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(ConnectivityErrorKind::Connect, message)
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::new(ConnectivityErrorKind::Status(code), message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ConnectivityErrorKind::Decode, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ConnectivityErrorKind::Other, message)
    }

    /// Classify a reqwest transport error
    pub fn from_transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            Self::connect(format!("Connection failed: {e}"))
        } else if e.is_decode() {
            Self::decode(format!("Failed to decode response: {e}"))
        } else if let Some(status) = e.status() {
            Self::status(status.as_u16(), format!("HTTP {status}: {e}"))
        } else {
            Self::other(format!("Request failed: {e}"))
        }
    }
}

/// Where the request broke down
///
/// Callers treat every kind the same way (the backend is unreachable); the
/// kind only feeds logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityErrorKind {
    /// Transport timed out
    Timeout,
    /// Connection refused or DNS failure
    Connect,
    /// Non-2xx response
    Status(u16),
    /// 2xx response with a body we could not parse
    Decode,
    Other,
}
