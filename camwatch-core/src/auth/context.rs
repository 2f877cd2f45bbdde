//! Authentication context shared by every component of a session

use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::TokenStore;
use crate::error::TokenStoreError;

/// Opaque bearer token issued by the login endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AuthToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for AuthToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

// Tokens end up in tracing output through Debug; never print the secret.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(<{} bytes>)", self.0.len())
    }
}

/// Holds the current session token.
///
/// Cheap to clone; clones share the same token slot. The token is read from
/// the store once when the context is created, and only `invalidate` and
/// `establish` change it afterwards.
#[derive(Clone)]
pub struct AuthContext {
    store: Arc<dyn TokenStore>,
    current: Arc<RwLock<Option<AuthToken>>>,
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("has_token", &self.token().is_some())
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    /// Load the context from a store.
    ///
    /// A store that cannot be read is treated as holding no token.
    pub fn load(store: Arc<dyn TokenStore>) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored token, starting signed out: {}", e);
                None
            }
        };
        Self {
            store,
            current: Arc::new(RwLock::new(token)),
        }
    }

    /// Current token, or None if signed out
    pub fn token(&self) -> Option<AuthToken> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Clear the token in memory and in the store.
    ///
    /// The in-memory token is gone even if the store fails to clear.
    pub fn invalidate(&self) {
        let had_token = self
            .current
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some();

        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored token: {}", e);
        }
        if had_token {
            info!("Session token invalidated");
        }
    }

    /// Install a freshly issued token and persist it
    pub fn establish(&self, token: AuthToken) -> Result<(), TokenStoreError> {
        self.store.save(&token)?;
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
        Ok(())
    }
}
