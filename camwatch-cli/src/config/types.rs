use std::path::PathBuf;
use std::time::Duration;

use camwatch_core::{CameraId, SessionConfig};
use serde::{Deserialize, Serialize};

/// Default monitoring server
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4000";

/// Default delay before a signed-out session asks for a new login
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 3000;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCamwatchConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub session: RawSessionSection,

    #[serde(default)]
    pub output: RawOutputConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSessionSection {
    pub redirect_delay_ms: Option<u64>,
    pub reserved_cameras: Option<Vec<u32>>,
    pub cancel_siblings_on_invalid: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOutputConfig {
    pub dir: Option<PathBuf>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CamwatchConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub output: OutputConfig,
}

impl CamwatchConfig {
    /// Session settings for camwatch-core
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            redirect_delay: Duration::from_millis(self.session.redirect_delay_ms),
            reserved_cameras: self
                .session
                .reserved_cameras
                .iter()
                .copied()
                .map(CameraId)
                .collect(),
            cancel_siblings_on_invalid: self.session.cancel_siblings_on_invalid,
            ..SessionConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP base URL of the monitoring server; stream URLs are derived from it
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSection {
    /// Milliseconds between losing the session and asking for a new login
    pub redirect_delay_ms: u64,

    /// Cameras whose abnormal close means the device is missing
    pub reserved_cameras: Vec<u32>,

    /// Stop the other cameras once the session is no longer valid
    pub cancel_siblings_on_invalid: bool,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
            reserved_cameras: vec![0, 1],
            cancel_siblings_on_invalid: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the latest frame of each camera is written
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: camwatch_paths::frames_dir(),
        }
    }
}
