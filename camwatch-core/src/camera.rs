//! Camera directory entries

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a camera; also the stream index on the video endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(pub u32);

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CameraId {
    fn from(id: u32) -> Self {
        CameraId(id)
    }
}

/// Capture settings reported by the server for one camera
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CameraInfos {
    #[serde(rename = "DeviceID", default)]
    pub device_id: i64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(rename = "FPS", default)]
    pub fps: f64,
}

/// One entry of the camera directory.
///
/// Only `ID` is required; any field the server adds beyond the known ones is
/// kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDescriptor {
    #[serde(rename = "ID")]
    pub id: CameraId,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Infos", default, skip_serializing_if = "Option::is_none")]
    pub infos: Option<CameraInfos>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CameraDescriptor {
    pub fn new(id: impl Into<CameraId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            infos: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name to show for this camera, falling back to its ID.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("Camera {}", self.id)
        } else {
            self.name.clone()
        }
    }
}
