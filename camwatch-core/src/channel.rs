//! Per-camera stream channels
//!
//! A [`StreamChannel`] owns the connection for exactly one camera and the one
//! frame that camera currently shows. The connection itself runs as a pump
//! task forwarding [`ChannelEvent`]s to the session's queue; the session
//! hands each event back to the owning channel, so all channel callbacks run
//! one at a time on the session's task.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::AuthToken;
use crate::camera::CameraId;
use crate::classify::{Classification, FailureClassifier, FailureSignal};
use crate::error::{SinkError, TransportError};
use crate::frame::{FrameHandle, FrameLedger};
use crate::render::RenderSink;
use crate::transport::{CloseCode, FrameTransport, TransportEvent};

/// Event from a channel's connection, tagged with its camera
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Frame { camera: CameraId, data: Bytes },
    Closed { camera: CameraId, code: CloseCode },
    Failed { camera: CameraId, error: TransportError },
}

impl ChannelEvent {
    pub fn camera(&self) -> CameraId {
        match self {
            ChannelEvent::Frame { camera, .. }
            | ChannelEvent::Closed { camera, .. }
            | ChannelEvent::Failed { camera, .. } => *camera,
        }
    }
}

/// One camera's live connection and displayed frame.
///
/// Once closed or failed a channel stays terminated; it never reconnects.
pub struct StreamChannel {
    camera: CameraId,
    ledger: FrameLedger,
    last_frame: Option<FrameHandle>,
    cancel: CancellationToken,
    connection: Option<JoinHandle<()>>,
    terminated: bool,
}

impl std::fmt::Debug for StreamChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamChannel")
            .field("camera", &self.camera)
            .field("terminated", &self.terminated)
            .field("frames", &self.ledger.issued())
            .finish_non_exhaustive()
    }
}

impl StreamChannel {
    /// Create a channel without a connection
    pub fn new(camera: CameraId) -> Self {
        Self {
            camera,
            ledger: FrameLedger::new(),
            last_frame: None,
            cancel: CancellationToken::new(),
            connection: None,
            terminated: false,
        }
    }

    /// Create a channel and start its connection.
    ///
    /// The connection stops when `parent` is cancelled, when the channel is
    /// cancelled, or after it reports its terminal event on `events`.
    pub fn open(
        camera: CameraId,
        token: AuthToken,
        transport: Arc<dyn FrameTransport>,
        events: mpsc::Sender<ChannelEvent>,
        parent: &CancellationToken,
    ) -> Self {
        let mut channel = Self::new(camera);
        channel.cancel = parent.child_token();
        channel.connection = Some(tokio::spawn(pump(
            camera,
            token,
            transport,
            events,
            channel.cancel.clone(),
        )));
        channel
    }

    pub fn camera(&self) -> CameraId {
        self.camera
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Decoded frames currently held by this channel
    pub fn live_frames(&self) -> usize {
        self.ledger.live()
    }

    pub fn frames_received(&self) -> u64 {
        self.ledger.issued()
    }

    /// Sequence number of the frame on display
    pub fn displayed_frame(&self) -> Option<u64> {
        self.last_frame.as_ref().map(FrameHandle::seq)
    }

    /// Decode `data`, release the frame shown so far, and show the new one
    pub fn on_frame(&mut self, data: Bytes, sink: &mut dyn RenderSink) -> Result<(), SinkError> {
        if self.terminated {
            debug!("Camera {}: dropping frame after channel ended", self.camera);
            return Ok(());
        }

        let frame = self.ledger.decode(self.camera, data);
        drop(self.last_frame.take());

        let result = sink.update(&frame);
        self.last_frame = Some(frame);
        result
    }

    /// The connection closed with `code`
    pub fn on_close(
        &mut self,
        code: CloseCode,
        classifier: &FailureClassifier,
    ) -> Option<Classification> {
        if !self.terminate() {
            return None;
        }
        let outcome = classifier.classify(self.camera, FailureSignal::Close(code));
        if outcome.is_none() {
            warn!("Camera {} stream closed with code {}", self.camera, code);
        }
        outcome
    }

    /// The connection failed with `error`
    pub fn on_error(
        &mut self,
        error: &TransportError,
        classifier: &FailureClassifier,
    ) -> Option<Classification> {
        if !self.terminate() {
            return None;
        }
        classifier.classify(self.camera, FailureSignal::Error(error))
    }

    /// Stop the connection without classifying anything
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.terminated = true;
    }

    /// Stop the connection and release the displayed frame
    pub fn shutdown(&mut self) {
        self.cancel();
        self.last_frame = None;
    }

    /// Mark the channel terminated; false if it already was
    fn terminate(&mut self) -> bool {
        if self.terminated {
            debug!("Camera {}: ignoring event after channel ended", self.camera);
            return false;
        }
        self.terminated = true;
        self.cancel.cancel();
        true
    }

    /// Wait for the connection task to finish
    pub async fn join(&mut self) {
        if let Some(handle) = self.connection.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for StreamChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Forward one camera's transport events to the session queue.
///
/// Emits exactly one terminal event unless cancelled first. A stream that
/// ends without saying why is reported as an abnormal close.
async fn pump(
    camera: CameraId,
    token: AuthToken,
    transport: Arc<dyn FrameTransport>,
    events: mpsc::Sender<ChannelEvent>,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = transport.open(camera, &token) => opened,
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(error) => {
            warn!("Camera {} failed to connect: {}", camera, error);
            forward(&events, &cancel, ChannelEvent::Failed { camera, error }).await;
            return;
        }
    };
    info!("Camera {} stream connected", camera);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Camera {} stream cancelled", camera);
                return;
            }
            next = stream.next() => next,
        };

        let event = match next {
            Some(TransportEvent::Frame(data)) => ChannelEvent::Frame { camera, data },
            Some(TransportEvent::Closed(code)) => ChannelEvent::Closed { camera, code },
            Some(TransportEvent::Error(error)) => ChannelEvent::Failed { camera, error },
            None => ChannelEvent::Closed {
                camera,
                code: CloseCode::ABNORMAL,
            },
        };
        let terminal = !matches!(event, ChannelEvent::Frame { .. });

        if !forward(&events, &cancel, event).await || terminal {
            return;
        }
    }
}

/// Send one event to the session; false once the channel is cancelled or
/// the session stopped listening.
async fn forward(
    events: &mpsc::Sender<ChannelEvent>,
    cancel: &CancellationToken,
    event: ChannelEvent,
) -> bool {
    let camera = event.camera();
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = events.send(event) => {
            if sent.is_err() {
                debug!("Camera {}: session gone, stopping stream", camera);
            }
            sent.is_ok()
        }
    }
}
