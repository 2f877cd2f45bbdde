//! Session token handling: storage, the shared auth context, and the login
//! and registration endpoints that produce tokens.

mod client;
mod context;
mod store;

pub use client::AuthClient;
pub use context::{AuthContext, AuthToken};
pub use store::{FileTokenStore, MemoryTokenStore, StoredSession, TokenStore};
