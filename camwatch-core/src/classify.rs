//! Failure classification for camera connections
//!
//! Maps how a channel ended to what the session should do about it.

use std::collections::BTreeSet;

use crate::camera::CameraId;
use crate::error::TransportError;
use crate::transport::CloseCode;

/// Cameras treated as fixed local slots by default
pub const DEFAULT_RESERVED_CAMERAS: [CameraId; 2] = [CameraId(0), CameraId(1)];

/// How a channel ended
#[derive(Debug, Clone, Copy)]
pub enum FailureSignal<'a> {
    Close(CloseCode),
    Error(&'a TransportError),
}

/// Why a session was considered invalid
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidationCause {
    /// A non-reserved camera closed abnormally
    AbnormalClose,
    /// The transport reported an unauthorized or forbidden response
    Rejected(TransportError),
}

/// Corrective action for a failed channel
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A reserved camera is missing; show a message, keep the session
    CameraNotFound { camera: CameraId },
    /// The token is no longer accepted; sign out and go to login
    SessionInvalid {
        camera: CameraId,
        cause: InvalidationCause,
    },
    /// Anything else; show the error, change nothing
    Transient {
        camera: CameraId,
        error: TransportError,
    },
}

impl Classification {
    pub fn camera(&self) -> CameraId {
        match self {
            Classification::CameraNotFound { camera }
            | Classification::SessionInvalid { camera, .. }
            | Classification::Transient { camera, .. } => *camera,
        }
    }

    pub fn invalidates_session(&self) -> bool {
        matches!(self, Classification::SessionInvalid { .. })
    }

    /// Text for the status board
    pub fn status_message(&self) -> String {
        match self {
            Classification::CameraNotFound { camera } => {
                format!("Error: Camera {} not found or inaccessible.", camera)
            }
            Classification::SessionInvalid {
                cause: InvalidationCause::AbnormalClose,
                ..
            } => "Connection closed abnormally. Please check your credentials or token.".to_string(),
            Classification::SessionInvalid {
                camera,
                cause: InvalidationCause::Rejected(error),
            }
            | Classification::Transient { camera, error } => {
                format!("WebSocket error for camera {}: {}", camera, error.message)
            }
        }
    }
}

/// Classifies channel failures.
///
/// Abnormal closes on reserved cameras are read as a missing device; on any
/// other camera they are read as the server dropping an unauthorized session.
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    reserved: BTreeSet<CameraId>,
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_CAMERAS)
    }
}

impl FailureClassifier {
    pub fn new(reserved: impl IntoIterator<Item = CameraId>) -> Self {
        Self {
            reserved: reserved.into_iter().collect(),
        }
    }

    pub fn is_reserved(&self, camera: CameraId) -> bool {
        self.reserved.contains(&camera)
    }

    /// Classify a failure signal; `None` means the signal is benign.
    pub fn classify(&self, camera: CameraId, signal: FailureSignal<'_>) -> Option<Classification> {
        match signal {
            FailureSignal::Close(code) if !code.is_abnormal() => None,
            FailureSignal::Close(_) if self.is_reserved(camera) => {
                Some(Classification::CameraNotFound { camera })
            }
            FailureSignal::Close(_) => Some(Classification::SessionInvalid {
                camera,
                cause: InvalidationCause::AbnormalClose,
            }),
            FailureSignal::Error(error) if error.is_auth_rejection() => {
                Some(Classification::SessionInvalid {
                    camera,
                    cause: InvalidationCause::Rejected(error.clone()),
                })
            }
            FailureSignal::Error(error) => Some(Classification::Transient {
                camera,
                error: error.clone(),
            }),
        }
    }
}
