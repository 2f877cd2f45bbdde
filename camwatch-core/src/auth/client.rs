//! Login and registration requests

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AuthContext, AuthToken};
use crate::endpoints::ServerEndpoints;
use crate::error::LoginError;

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize, Default)]
struct MessageResponse {
    #[serde(default)]
    message: String,
}

/// Client for the authentication endpoints.
///
/// A successful login installs the issued token into the shared
/// [`AuthContext`].
pub struct AuthClient {
    endpoints: ServerEndpoints,
    auth: AuthContext,
    http_client: reqwest::Client,
}

impl AuthClient {
    pub fn new(endpoints: ServerEndpoints, auth: AuthContext) -> Self {
        Self::with_client(endpoints, auth, reqwest::Client::new())
    }

    pub fn with_client(
        endpoints: ServerEndpoints,
        auth: AuthContext,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            endpoints,
            auth,
            http_client,
        }
    }

    /// Log in and store the issued token
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthToken, LoginError> {
        let url = self.endpoints.login();
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(url)
            .json(&Credentials { username, password })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: LoginResponse = response.json().await?;
                let token = AuthToken::new(body.token);
                self.auth.establish(token.clone())?;
                info!("Logged in as {}", username);
                Ok(token)
            }
            StatusCode::UNAUTHORIZED => Err(LoginError::Rejected {
                message: Self::server_message(response).await,
            }),
            status => Err(LoginError::Unexpected {
                status: status.as_u16(),
            }),
        }
    }

    /// Register a new user; returns the server's confirmation message.
    ///
    /// The current token is attached when there is one, since the server only
    /// lets signed-in users register further accounts.
    pub async fn register(&self, username: &str, password: &str) -> Result<String, LoginError> {
        let url = self.endpoints.register();
        debug!("POST {}", url);

        let mut request = self
            .http_client
            .post(url)
            .json(&Credentials { username, password });
        if let Some(token) = self.auth.token() {
            request = request.bearer_auth(token.as_str());
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::OK => Ok(Self::server_message(response).await),
            StatusCode::CONFLICT => Err(LoginError::Conflict {
                message: Self::server_message(response).await,
            }),
            status => Err(LoginError::Unexpected {
                status: status.as_u16(),
            }),
        }
    }

    async fn server_message(response: reqwest::Response) -> String {
        response
            .json::<MessageResponse>()
            .await
            .unwrap_or_default()
            .message
    }
}
