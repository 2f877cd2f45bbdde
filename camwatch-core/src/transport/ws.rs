//! WebSocket frame transport

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::debug;

use super::{CloseCode, FrameStream, FrameTransport, TransportEvent};
use crate::auth::AuthToken;
use crate::camera::CameraId;
use crate::endpoints::ServerEndpoints;
use crate::error::TransportError;

/// Streams frames from `/api/v1/ws/video/{camera}`.
///
/// Each binary message is one encoded image. Text messages are not part of
/// the protocol and are skipped.
pub struct WsTransport {
    endpoints: ServerEndpoints,
}

impl WsTransport {
    pub fn new(endpoints: ServerEndpoints) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl FrameTransport for WsTransport {
    async fn open(&self, camera: CameraId, token: &AuthToken) -> Result<FrameStream, TransportError> {
        let url = self.endpoints.video_stream(camera, token);
        debug!("Connecting to video stream for camera {}", camera);

        let (ws_stream, _response) = connect_async(url.as_str())
            .await
            .map_err(handshake_error)?;

        let events = ws_stream.filter_map(move |result| async move {
            match result {
                Ok(Message::Binary(data)) => Some(TransportEvent::Frame(data)),
                Ok(Message::Text(_)) => {
                    debug!("Camera {}: ignoring text message", camera);
                    None
                }
                Ok(Message::Close(Some(frame))) => {
                    Some(TransportEvent::Closed(CloseCode(u16::from(frame.code))))
                }
                Ok(Message::Close(None)) => Some(TransportEvent::Closed(CloseCode::NO_STATUS)),
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
                Err(e) => Some(read_error(e)),
            }
        });

        Ok(Box::pin(events))
    }
}

/// Convert a failed handshake into a transport error, keeping the HTTP
/// status when the server answered with one.
fn handshake_error(error: WsError) -> TransportError {
    match error {
        WsError::Http(response) => {
            let status = response.status();
            TransportError::with_status(status.as_u16(), format!("HTTP error: {}", status))
        }
        other => TransportError::new(other.to_string()),
    }
}

/// Convert an error on an established connection into its terminal event.
///
/// Losing the connection without a closing handshake is reported the way a
/// browser reports it: close code 1006.
fn read_error(error: WsError) -> TransportEvent {
    match error {
        WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) | WsError::Io(_) => {
            TransportEvent::Closed(CloseCode::ABNORMAL)
        }
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            TransportEvent::Closed(CloseCode::NORMAL)
        }
        other => TransportEvent::Error(TransportError::new(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_without_handshake_is_abnormal_close() {
        let event = read_error(WsError::Protocol(
            ProtocolError::ResetWithoutClosingHandshake,
        ));
        assert_eq!(event, TransportEvent::Closed(CloseCode::ABNORMAL));
    }

    #[test]
    fn io_failure_is_abnormal_close() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(
            read_error(WsError::Io(io)),
            TransportEvent::Closed(CloseCode::ABNORMAL)
        );
    }

    #[test]
    fn completed_close_is_normal() {
        assert_eq!(
            read_error(WsError::ConnectionClosed),
            TransportEvent::Closed(CloseCode::NORMAL)
        );
    }

    #[test]
    fn other_read_errors_are_transport_errors() {
        let event = read_error(WsError::AttackAttempt);
        assert!(matches!(event, TransportEvent::Error(e) if e.status.is_none()));
    }

    #[test]
    fn non_http_handshake_failure_has_no_status() {
        let error = handshake_error(WsError::ConnectionClosed);
        assert!(error.status.is_none());
    }

    #[tokio::test]
    async fn https_server_is_dialled_over_tls() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hang up: the TLS handshake fails, but only after dialling.
        let accepted = tokio::spawn(async move { listener.accept().await.map(|_| ()) });

        let endpoints = ServerEndpoints::parse(&format!("https://{}", addr)).unwrap();
        let transport = WsTransport::new(endpoints);
        let result = transport
            .open(CameraId(2), &AuthToken::new("secret"))
            .await;

        let error = result.err().expect("peer does not speak TLS");
        assert!(
            !error.message.contains("TLS support not compiled in"),
            "unexpected error: {}",
            error.message
        );
        assert!(!error.message.starts_with("URL error"), "{}", error.message);
        assert!(accepted.await.unwrap().is_ok());
    }
}
