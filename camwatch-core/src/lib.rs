//! camwatch-core: Core library for the camwatch live camera viewer
//!
//! This crate provides the building blocks of a viewing session:
//!
//! - **Auth** - [`AuthContext`] over a [`TokenStore`], plus [`AuthClient`] for login and registration
//! - **Directory** - [`CameraDirectory`] and [`HttpCameraDirectory`] for listing cameras
//! - **Transport** - [`FrameTransport`] and [`WsTransport`] for per-camera binary frame streams
//! - **Channels** - [`StreamChannel`] owning one camera's connection and displayed frame
//! - **Classification** - [`FailureClassifier`] turning closes and errors into corrective actions
//! - **Rendering** - [`RenderSink`] and [`SinkFactory`] for wherever frames are shown
//! - **Session** - [`SessionManager`] tying it all together
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use camwatch_core::{
//!     AuthContext, FileSinkFactory, FileTokenStore, HttpCameraDirectory, ServerEndpoints,
//!     SessionConfig, SessionManager, WsTransport,
//! };
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoints = ServerEndpoints::parse("http://127.0.0.1:4000")?;
//!     let auth = AuthContext::load(Arc::new(FileTokenStore::new("session.json")));
//!
//!     let mut session = SessionManager::new(
//!         SessionConfig::default(),
//!         auth,
//!         Arc::new(HttpCameraDirectory::new(endpoints.clone())),
//!         Arc::new(WsTransport::new(endpoints)),
//!         Arc::new(FileSinkFactory::new("frames")),
//!     );
//!
//!     let exit = session.run().await;
//!     println!("Session ended: {:?} ({})", exit, session.status().current());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    SessionManager                     │
//! │   AuthContext ── CameraDirectory ── SinkRegistry      │
//! │                                                       │
//! │   ┌───────────────┐  ┌───────────────┐                │
//! │   │ StreamChannel │  │ StreamChannel │  ...           │
//! │   └───────▲───────┘  └───────▲───────┘                │
//! │           └──── event queue ─┴──── pump tasks ◄── FrameTransport
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod camera;
pub mod channel;
pub mod classify;
pub mod directory;
pub mod endpoints;
pub mod error;
pub mod frame;
pub mod render;
pub mod session;
pub mod status;
pub mod transport;

// Re-export key types for convenience
pub use auth::{
    AuthClient, AuthContext, AuthToken, FileTokenStore, MemoryTokenStore, StoredSession,
    TokenStore,
};
pub use camera::{CameraDescriptor, CameraId, CameraInfos};
pub use channel::{ChannelEvent, StreamChannel};
pub use classify::{Classification, FailureClassifier, FailureSignal, InvalidationCause};
pub use directory::{CameraDirectory, HttpCameraDirectory, StaticDirectory};
pub use endpoints::ServerEndpoints;
pub use error::{
    CamwatchError, DirectoryError, DirectoryErrorKind, EndpointError, LoginError, SinkError,
    TokenStoreError, TransportError,
};
pub use frame::{FrameFormat, FrameHandle, FrameLedger};
pub use render::{
    FileSink, FileSinkFactory, RecordingSink, RecordingSinks, RenderSink, SinkEvent, SinkFactory,
    SinkRegistry,
};
pub use session::{SessionConfig, SessionExit, SessionManager, SessionState};
pub use status::StatusBoard;
pub use transport::{CloseCode, FrameStream, FrameTransport, ScriptedTransport, TransportEvent, WsTransport};
