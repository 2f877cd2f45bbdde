//! Error types for camwatch-core

use thiserror::Error;

use crate::camera::CameraId;

/// Top-level error type for camwatch-core
#[derive(Error, Debug)]
pub enum CamwatchError {
    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Login error: {0}")]
    Login(#[from] LoginError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),
}

/// Errors from building server endpoints
#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("invalid server URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("server URL must use http or https, got {0}")]
    UnsupportedScheme(String),
}

/// Errors from persistent token storage
#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("failed to access token file: {0}")]
    Io(#[from] std::io::Error),

    #[error("token file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Broad category of a directory failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryErrorKind {
    Transport,
    Auth,
}

/// Errors from listing cameras
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("not authorized to list cameras (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("unexpected response status: HTTP {status}")]
    Status { status: u16 },

    #[error("invalid camera directory payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DirectoryError {
    pub fn kind(&self) -> DirectoryErrorKind {
        match self {
            DirectoryError::Unauthorized { .. } => DirectoryErrorKind::Auth,
            _ => DirectoryErrorKind::Transport,
        }
    }

    /// Build the error matching a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => DirectoryError::Unauthorized { status },
            _ => DirectoryError::Status { status },
        }
    }
}

/// Failure reported by a streaming transport.
///
/// Carries the HTTP status when the server rejected the connection during the
/// handshake, so auth failures can be recognized without parsing text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// True if the server refused the session (401/403).
    ///
    /// Falls back to looking for the status digits in the message when the
    /// transport could not report a structured status.
    pub fn is_auth_rejection(&self) -> bool {
        match self.status {
            Some(401 | 403) => true,
            Some(_) => false,
            None => self.message.contains("401") || self.message.contains("403"),
        }
    }
}

/// Errors from the login and registration endpoints
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("{message}")]
    Rejected { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("An error occurred. Please try again. (HTTP {status})")]
    Unexpected { status: u16 },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to store token: {0}")]
    Store(#[from] TokenStoreError),
}

/// Errors from render sinks
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to write frame: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink for camera {0} was already disposed")]
    Disposed(CameraId),
}
