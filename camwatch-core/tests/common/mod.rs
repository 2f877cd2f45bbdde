//! Fake monitoring server for camwatch-core integration tests

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use camwatch_core::ServerEndpoints;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

/// Token the fake server issues and accepts
pub const VALID_TOKEN: &str = "valid-token";

/// How a camera stream ends after its frames are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum StreamEnding {
    /// Close handshake with code 1000
    Normal,
    /// Drop the connection without a close frame
    Drop,
}

#[derive(Debug, Clone)]
pub struct FakeServerConfig {
    /// Cameras listed by the directory endpoint
    pub cameras: Vec<u32>,
    /// Frames each camera sends before ending
    pub frames: u8,
    pub ending: StreamEnding,
    /// Cameras whose stream drops right after the upgrade
    pub unreachable: Vec<u32>,
    /// Answer every stream request with 403
    pub reject_streams: bool,
}

impl Default for FakeServerConfig {
    fn default() -> Self {
        Self {
            cameras: vec![2, 3],
            frames: 3,
            ending: StreamEnding::Normal,
            unreachable: Vec::new(),
            reject_streams: false,
        }
    }
}

pub struct FakeState {
    config: FakeServerConfig,
    users: Mutex<HashMap<String, String>>,
    directory_calls: AtomicUsize,
}

impl FakeState {
    #[allow(dead_code)]
    pub fn directory_calls(&self) -> usize {
        self.directory_calls.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn has_user(&self, username: &str) -> bool {
        self.users.lock().unwrap().contains_key(username)
    }
}

pub struct FakeServer {
    pub addr: SocketAddr,
    pub state: Arc<FakeState>,
}

impl FakeServer {
    pub fn endpoints(&self) -> ServerEndpoints {
        ServerEndpoints::parse(&format!("http://{}", self.addr)).unwrap()
    }
}

/// Starts a fake server with one user, `admin` / `secret`
pub async fn spawn_server(config: FakeServerConfig) -> FakeServer {
    let users = HashMap::from([("admin".to_string(), "secret".to_string())]);
    let state = Arc::new(FakeState {
        config,
        users: Mutex::new(users),
        directory_calls: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/api/v1/monitoring/camera/details", get(camera_details))
        .route("/api/v1/ws/video/:id", get(video_stream))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/register", post(register))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    FakeServer { addr, state }
}

fn has_valid_bearer(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {}", VALID_TOKEN))
        .unwrap_or(false)
}

async fn camera_details(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.directory_calls.fetch_add(1, Ordering::SeqCst);

    if !has_valid_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.config.cameras.is_empty() {
        return (StatusCode::NOT_FOUND, "No cameras found").into_response();
    }

    let cameras: Vec<_> = state
        .config
        .cameras
        .iter()
        .map(|id| {
            json!({
                "ID": id,
                "Name": format!("Camera {}", id),
                "Infos": {"DeviceID": id, "Width": 640, "Height": 480, "FPS": 30},
            })
        })
        .collect();
    Json(cameras).into_response()
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

async fn video_stream(
    Path(id): Path<u32>,
    Query(query): Query<TokenQuery>,
    State(state): State<Arc<FakeState>>,
    ws: WebSocketUpgrade,
) -> Response {
    if query.token.as_deref() != Some(VALID_TOKEN) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.config.reject_streams {
        return StatusCode::FORBIDDEN.into_response();
    }

    ws.on_upgrade(move |socket| stream_frames(socket, id, state))
}

async fn stream_frames(mut socket: WebSocket, id: u32, state: Arc<FakeState>) {
    if state.config.unreachable.contains(&id) {
        return;
    }

    for n in 0..state.config.frames {
        let frame = vec![0xFF, 0xD8, 0xFF, n];
        if socket.send(Message::Binary(frame)).await.is_err() {
            return;
        }
    }

    if state.config.ending == StreamEnding::Normal {
        let close = CloseFrame {
            code: 1000,
            reason: "".into(),
        };
        let _ = socket.send(Message::Close(Some(close))).await;
        // Wait for the client's reply so the handshake completes
        while let Some(Ok(message)) = socket.recv().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    }
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

async fn login(State(state): State<Arc<FakeState>>, Json(creds): Json<Credentials>) -> Response {
    let users = state.users.lock().unwrap();
    match users.get(&creds.username) {
        Some(password) if *password == creds.password => {
            Json(json!({"token": VALID_TOKEN})).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid username or password"})),
        )
            .into_response(),
    }
}

async fn register(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(creds): Json<Credentials>,
) -> Response {
    let mut users = state.users.lock().unwrap();
    if !users.is_empty() && !has_valid_bearer(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Authentication required"})),
        )
            .into_response();
    }
    if users.contains_key(&creds.username) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "User already exists"})),
        )
            .into_response();
    }

    users.insert(creds.username, creds.password);
    Json(json!({"message": "User registered successfully"})).into_response()
}
