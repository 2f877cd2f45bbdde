//! Session lifecycle states and settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::camera::CameraId;
use crate::classify::DEFAULT_RESERVED_CAMERAS;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, nothing requested yet
    Init,
    /// Waiting for the camera directory
    AwaitingDirectory,
    /// Channels are open (possibly none)
    Streaming,
    /// The session is over; the user has to sign in again
    Redirecting,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Init, AwaitingDirectory)
                | (Init, Redirecting)
                | (AwaitingDirectory, Streaming)
                | (Streaming, Redirecting)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Redirecting
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Init => "init",
            SessionState::AwaitingDirectory => "awaiting_directory",
            SessionState::Streaming => "streaming",
            SessionState::Redirecting => "redirecting",
        };
        f.write_str(name)
    }
}

/// Why [`SessionManager::run`](super::SessionManager::run) returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The redirect delay elapsed; a new login is needed
    LoginRequired,
    /// The shutdown token was cancelled
    Shutdown,
    /// Every channel ended and nothing is pending
    Drained,
}

/// Session tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between a redirect being scheduled and the session ending
    pub redirect_delay: Duration,
    /// Cameras whose abnormal close means "device missing"
    pub reserved_cameras: Vec<CameraId>,
    /// Stop every other channel once the session is found invalid
    pub cancel_siblings_on_invalid: bool,
    /// Capacity of the channel event queue
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redirect_delay: Duration::from_millis(3000),
            reserved_cameras: DEFAULT_RESERVED_CAMERAS.to_vec(),
            cancel_siblings_on_invalid: true,
            event_capacity: 64,
        }
    }
}
