//! URLs of the monitoring server's API

use url::Url;

use crate::auth::AuthToken;
use crate::camera::CameraId;
use crate::error::EndpointError;

/// Resolves API paths against the configured server URL.
///
/// The server URL is the HTTP base (e.g. `http://127.0.0.1:4000`); the video
/// endpoints use the matching WebSocket scheme on the same host.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEndpoints {
    base: Url,
}

impl ServerEndpoints {
    pub fn new(mut base: Url) -> Result<Self, EndpointError> {
        match base.scheme() {
            "http" | "https" => {}
            other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
        }
        // Joining relative paths replaces the last segment unless the base
        // path ends in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    pub fn parse(base: &str) -> Result<Self, EndpointError> {
        Self::new(Url::parse(base)?)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn api(&self, path: &str) -> Url {
        // `path` is always a relative literal, so joining cannot fail.
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }

    pub fn login(&self) -> Url {
        self.api("api/v1/auth/login")
    }

    pub fn register(&self) -> Url {
        self.api("api/v1/auth/register")
    }

    pub fn camera_details(&self) -> Url {
        self.api("api/v1/monitoring/camera/details")
    }

    /// WebSocket URL streaming frames for one camera.
    ///
    /// The token travels as a query parameter because the WebSocket handshake
    /// cannot carry custom headers from every client.
    pub fn video_stream(&self, camera: CameraId, token: &AuthToken) -> Url {
        let mut url = self.api(&format!("api/v1/ws/video/{}", camera));
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // http(s) -> ws(s) stays within the special schemes, which url allows.
        let _ = url.set_scheme(scheme);
        url.set_query(Some(&format!(
            "token={}",
            urlencoding::encode(token.as_str())
        )));
        url
    }
}
