//! Login and registration against the fake monitoring server

mod common;

use std::sync::Arc;

use camwatch_core::{
    AuthClient, AuthContext, AuthToken, FileTokenStore, LoginError, MemoryTokenStore, TokenStore,
};
use common::{FakeServerConfig, VALID_TOKEN, spawn_server};
use tempfile::TempDir;

#[tokio::test]
async fn login_persists_the_issued_token() {
    let server = spawn_server(FakeServerConfig::default()).await;
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("session.json")));
    let auth = AuthContext::load(store.clone());
    let client = AuthClient::new(server.endpoints(), auth.clone());

    let token = client.login("admin", "secret").await.unwrap();

    assert_eq!(token, AuthToken::new(VALID_TOKEN));
    assert_eq!(auth.token(), Some(token.clone()));
    assert_eq!(store.load().unwrap(), Some(token));
}

#[tokio::test]
async fn wrong_password_is_rejected_with_server_message() {
    let server = spawn_server(FakeServerConfig::default()).await;
    let auth = AuthContext::load(Arc::new(MemoryTokenStore::new()));
    let client = AuthClient::new(server.endpoints(), auth.clone());

    let err = client.login("admin", "wrong").await.unwrap_err();

    match err {
        LoginError::Rejected { message } => assert_eq!(message, "Invalid username or password"),
        other => panic!("Expected Rejected, got {:?}", other),
    }
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn register_requires_a_signed_in_user() {
    let server = spawn_server(FakeServerConfig::default()).await;
    let auth = AuthContext::load(Arc::new(MemoryTokenStore::new()));
    let client = AuthClient::new(server.endpoints(), auth);

    let err = client.register("bob", "hunter2").await.unwrap_err();

    assert!(matches!(err, LoginError::Unexpected { status: 401 }));
    assert!(!server.state.has_user("bob"));
}

#[tokio::test]
async fn register_with_token_creates_user() {
    let server = spawn_server(FakeServerConfig::default()).await;
    let auth = AuthContext::load(Arc::new(MemoryTokenStore::with_token(VALID_TOKEN)));
    let client = AuthClient::new(server.endpoints(), auth);

    let message = client.register("bob", "hunter2").await.unwrap();

    assert_eq!(message, "User registered successfully");
    assert!(server.state.has_user("bob"));
}

#[tokio::test]
async fn registering_existing_user_conflicts() {
    let server = spawn_server(FakeServerConfig::default()).await;
    let auth = AuthContext::load(Arc::new(MemoryTokenStore::with_token(VALID_TOKEN)));
    let client = AuthClient::new(server.endpoints(), auth);

    let err = client.register("admin", "whatever").await.unwrap_err();

    match err {
        LoginError::Conflict { message } => assert_eq!(message, "User already exists"),
        other => panic!("Expected Conflict, got {:?}", other),
    }
}
