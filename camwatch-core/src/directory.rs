//! Camera directory lookup

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::auth::AuthToken;
use crate::camera::CameraDescriptor;
use crate::endpoints::ServerEndpoints;
use crate::error::DirectoryError;

/// Source of the list of cameras available to a session
#[async_trait]
pub trait CameraDirectory: Send + Sync {
    /// List cameras in server order
    async fn list_cameras(&self, token: &AuthToken) -> Result<Vec<CameraDescriptor>, DirectoryError>;
}

/// Directory backed by `GET /api/v1/monitoring/camera/details`
pub struct HttpCameraDirectory {
    endpoints: ServerEndpoints,
    http_client: reqwest::Client,
}

impl HttpCameraDirectory {
    pub fn new(endpoints: ServerEndpoints) -> Self {
        Self::with_client(endpoints, reqwest::Client::new())
    }

    pub fn with_client(endpoints: ServerEndpoints, http_client: reqwest::Client) -> Self {
        Self {
            endpoints,
            http_client,
        }
    }
}

#[async_trait]
impl CameraDirectory for HttpCameraDirectory {
    async fn list_cameras(&self, token: &AuthToken) -> Result<Vec<CameraDescriptor>, DirectoryError> {
        let url = self.endpoints.camera_details();
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::from_status(status.as_u16()));
        }

        let body = response.text().await?;
        let cameras: Vec<CameraDescriptor> = serde_json::from_str(&body)?;
        debug!("Directory returned {} camera(s)", cameras.len());
        Ok(cameras)
    }
}

/// Fixed directory for tests and offline runs.
///
/// Answers every call with the same cameras, or with the configured failure
/// status. Counts calls so callers can assert that no lookup happened.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    cameras: Vec<CameraDescriptor>,
    failure_status: Option<u16>,
    calls: AtomicUsize,
    last_token: Mutex<Option<AuthToken>>,
}

impl StaticDirectory {
    pub fn new(cameras: Vec<CameraDescriptor>) -> Self {
        Self {
            cameras,
            ..Self::default()
        }
    }

    /// Directory whose lookups fail with the given HTTP status
    pub fn failing(status: u16) -> Self {
        Self {
            failure_status: Some(status),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_token(&self) -> Option<AuthToken> {
        self.last_token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl CameraDirectory for StaticDirectory {
    async fn list_cameras(&self, token: &AuthToken) -> Result<Vec<CameraDescriptor>, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.clone());

        match self.failure_status {
            Some(status) => Err(DirectoryError::from_status(status)),
            None => Ok(self.cameras.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryErrorKind;

    #[tokio::test]
    async fn static_directory_returns_cameras_and_records_token() {
        let directory = StaticDirectory::new(vec![CameraDescriptor::new(0), CameraDescriptor::new(1)]);

        let cameras = directory.list_cameras(&AuthToken::new("t")).await.unwrap();

        assert_eq!(cameras.len(), 2);
        assert_eq!(directory.calls(), 1);
        assert_eq!(directory.last_token(), Some(AuthToken::new("t")));
    }

    #[tokio::test]
    async fn failing_directory_reports_status_kind() {
        let directory = StaticDirectory::failing(401);
        let error = directory.list_cameras(&AuthToken::new("t")).await.unwrap_err();
        assert_eq!(error.kind(), DirectoryErrorKind::Auth);

        let directory = StaticDirectory::failing(500);
        let error = directory.list_cameras(&AuthToken::new("t")).await.unwrap_err();
        assert_eq!(error.kind(), DirectoryErrorKind::Transport);
    }
}
