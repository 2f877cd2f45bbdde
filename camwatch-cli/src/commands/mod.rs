pub mod auth;
pub mod cameras;
pub mod config;
pub mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use camwatch_core::{AuthContext, FileTokenStore, ServerEndpoints};

use crate::config::{CamwatchConfig, ConfigLoader};

/// Configuration, server endpoints and stored credentials for one command
pub struct ServerContext {
    pub config: CamwatchConfig,
    pub endpoints: ServerEndpoints,
    pub auth: AuthContext,
}

impl ServerContext {
    /// Load config and the stored token; `server` overrides the configured URL
    pub fn load(server: Option<&str>) -> Result<Self> {
        let mut config = ConfigLoader::load()?;
        if let Some(url) = server {
            config.server.url = url.to_string();
        }

        let endpoints = ServerEndpoints::parse(&config.server.url)
            .with_context(|| format!("Invalid server URL '{}'", config.server.url))?;
        let store = FileTokenStore::new(camwatch_paths::session_file());
        let auth = AuthContext::load(Arc::new(store));

        Ok(Self {
            config,
            endpoints,
            auth,
        })
    }
}
