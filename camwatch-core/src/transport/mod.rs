//! Streaming transports delivering camera frames
//!
//! A [`FrameTransport`] opens one long-lived connection per camera and turns
//! it into a stream of [`TransportEvent`]s. The production implementation is
//! [`WsTransport`]; [`ScriptedTransport`] replays canned events.

mod scripted;
mod ws;

pub use scripted::ScriptedTransport;
pub use ws::WsTransport;

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use crate::auth::AuthToken;
use crate::camera::CameraId;
use crate::error::TransportError;

/// WebSocket close status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(pub u16);

impl CloseCode {
    pub const NORMAL: CloseCode = CloseCode(1000);
    pub const GOING_AWAY: CloseCode = CloseCode(1001);
    /// Close frame without a status code
    pub const NO_STATUS: CloseCode = CloseCode(1005);
    /// Connection dropped without a closing handshake
    pub const ABNORMAL: CloseCode = CloseCode(1006);

    pub fn is_abnormal(self) -> bool {
        self == CloseCode::ABNORMAL
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One thing that happened on a camera connection
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// One complete encoded image
    Frame(Bytes),
    /// The connection closed; nothing follows
    Closed(CloseCode),
    /// The connection failed; nothing follows
    Error(TransportError),
}

impl TransportEvent {
    /// True for events after which the connection is gone
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransportEvent::Frame(_))
    }
}

/// Events of one open connection, in arrival order
pub type FrameStream = Pin<Box<dyn Stream<Item = TransportEvent> + Send>>;

/// Opens per-camera frame connections
#[async_trait]
pub trait FrameTransport: Send + Sync {
    /// Connect to the frame stream of `camera`.
    ///
    /// Fails when the connection cannot be established, e.g. the server
    /// rejected the token during the handshake.
    async fn open(&self, camera: CameraId, token: &AuthToken) -> Result<FrameStream, TransportError>;
}
