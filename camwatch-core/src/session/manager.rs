//! SessionManager: drives one viewing session from token check to teardown
//!
//! Channel connections run as independent tasks, but everything they report
//! goes through one queue that the manager drains on its own task. Frames,
//! closes and errors are therefore handled one at a time, in arrival order
//! within each camera.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{SessionConfig, SessionExit, SessionState};
use crate::auth::AuthContext;
use crate::camera::{CameraDescriptor, CameraId};
use crate::channel::{ChannelEvent, StreamChannel};
use crate::classify::{Classification, FailureClassifier};
use crate::directory::CameraDirectory;
use crate::render::{SinkFactory, SinkRegistry};
use crate::status::{DIRECTORY_ERROR_MESSAGE, NO_CAMERAS_MESSAGE, NO_TOKEN_MESSAGE, StatusBoard};
use crate::transport::FrameTransport;

/// Orchestrates the directory lookup, per-camera channels and failure
/// handling of one session.
pub struct SessionManager {
    config: SessionConfig,
    classifier: FailureClassifier,
    auth: AuthContext,
    directory: Arc<dyn CameraDirectory>,
    transport: Arc<dyn FrameTransport>,
    sink_factory: Arc<dyn SinkFactory>,
    status: StatusBoard,
    state: SessionState,
    sinks: SinkRegistry,
    channels: Vec<StreamChannel>,
    events_tx: mpsc::Sender<ChannelEvent>,
    events_rx: mpsc::Receiver<ChannelEvent>,
    shutdown: CancellationToken,
    redirect_at: Option<Instant>,
}

enum Step {
    Shutdown,
    Redirect,
    Event(Option<ChannelEvent>),
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        auth: AuthContext,
        directory: Arc<dyn CameraDirectory>,
        transport: Arc<dyn FrameTransport>,
        sink_factory: Arc<dyn SinkFactory>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(config.event_capacity.max(1));
        let classifier = FailureClassifier::new(config.reserved_cameras.iter().copied());
        Self {
            config,
            classifier,
            auth,
            directory,
            transport,
            sink_factory,
            status: StatusBoard::new(),
            state: SessionState::Init,
            sinks: SinkRegistry::new(),
            channels: Vec::new(),
            events_tx,
            events_rx,
            shutdown: CancellationToken::new(),
            redirect_at: None,
        }
    }

    /// Report status on an existing board instead of a private one
    pub fn with_status(mut self, status: StatusBoard) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Token that stops [`run`](Self::run) and every channel when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// When the pending redirect fires, if one is scheduled
    pub fn redirect_deadline(&self) -> Option<Instant> {
        self.redirect_at
    }

    pub fn channel(&self, camera: CameraId) -> Option<&StreamChannel> {
        self.channels.iter().find(|c| c.camera() == camera)
    }

    /// Cameras with a sink, in directory order
    pub fn cameras(&self) -> Vec<CameraId> {
        self.sinks.cameras()
    }

    /// Check the token, fetch the directory and open one channel per camera.
    ///
    /// Without a token no lookup happens and a redirect is scheduled. A
    /// failed lookup is shown on the status board and treated as an empty
    /// directory. Cancelling the shutdown token abandons a lookup in flight.
    pub async fn start(&mut self) {
        if self.state != SessionState::Init {
            warn!("Session already started (state: {})", self.state);
            return;
        }

        let Some(token) = self.auth.token() else {
            self.status.set(NO_TOKEN_MESSAGE);
            self.schedule_transition(SessionState::Redirecting, self.config.redirect_delay);
            return;
        };

        self.transition(SessionState::AwaitingDirectory);
        let shutdown = self.shutdown.clone();
        let lookup = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Shutdown requested during camera directory lookup");
                return;
            }
            result = self.directory.list_cameras(&token) => result,
        };
        let cameras = match lookup {
            Ok(cameras) if cameras.is_empty() => {
                self.status.set(NO_CAMERAS_MESSAGE);
                cameras
            }
            Ok(cameras) => cameras,
            Err(e) => {
                warn!(kind = ?e.kind(), "Camera directory lookup failed: {}", e);
                self.status.set(DIRECTORY_ERROR_MESSAGE);
                Vec::new()
            }
        };
        self.transition(SessionState::Streaming);

        // Every sink exists before the first channel opens
        for camera in &cameras {
            self.add_sink(camera);
        }
        for camera in self.sinks.cameras() {
            let channel = StreamChannel::open(
                camera,
                token.clone(),
                Arc::clone(&self.transport),
                self.events_tx.clone(),
                &self.shutdown,
            );
            self.channels.push(channel);
        }
        info!("Streaming {} camera(s)", self.channels.len());
    }

    fn add_sink(&mut self, camera: &CameraDescriptor) {
        if self.sinks.contains(camera.id) {
            warn!("Camera {} listed twice, keeping the first entry", camera.id);
            return;
        }
        match self.sink_factory.create(camera) {
            Ok(sink) => {
                self.sinks.insert(camera.id, sink);
            }
            Err(e) => warn!("Skipping camera {}: failed to create sink: {}", camera.id, e),
        }
    }

    /// Hand one channel event to its channel and act on the outcome
    pub fn handle_event(&mut self, event: ChannelEvent) {
        let camera = event.camera();
        let Some(index) = self.channels.iter().position(|c| c.camera() == camera) else {
            debug!("Event for unknown camera {}", camera);
            return;
        };
        let channel = &mut self.channels[index];

        let outcome = match event {
            ChannelEvent::Frame { data, .. } => {
                let Some(sink) = self.sinks.get_mut(camera) else {
                    debug!("Camera {} has no sink", camera);
                    return;
                };
                if let Err(e) = channel.on_frame(data, sink) {
                    warn!("Camera {}: failed to show frame: {}", camera, e);
                }
                None
            }
            ChannelEvent::Closed { code, .. } => channel.on_close(code, &self.classifier),
            ChannelEvent::Failed { error, .. } => channel.on_error(&error, &self.classifier),
        };

        if let Some(classification) = outcome {
            self.apply(classification);
        }
    }

    fn apply(&mut self, classification: Classification) {
        let camera = classification.camera();
        self.status.set(classification.status_message());
        if !classification.invalidates_session() {
            return;
        }

        warn!("Camera {}: session no longer valid, signing out", camera);
        self.auth.invalidate();
        if self.config.cancel_siblings_on_invalid {
            for channel in &mut self.channels {
                if !channel.is_terminated() {
                    debug!("Cancelling camera {}", channel.camera());
                    channel.cancel();
                }
            }
        }
        self.schedule_transition(SessionState::Redirecting, self.config.redirect_delay);
    }

    /// Move to `target` now; if `target` is terminal the session ends once
    /// `delay` has passed.
    ///
    /// Scheduling the state the session is already in does nothing, so the
    /// first scheduled deadline is the one that counts.
    pub fn schedule_transition(&mut self, target: SessionState, delay: Duration) {
        if self.state == target {
            debug!("Transition to {} already scheduled", target);
            return;
        }
        if !self.transition(target) {
            return;
        }
        if target.is_terminal() {
            info!("Redirecting to login in {:?}", delay);
            self.redirect_at = Some(Instant::now() + delay);
        }
    }

    fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(next) {
            warn!("Ignoring transition {} -> {}", self.state, next);
            return false;
        }
        debug!("Session {} -> {}", self.state, next);
        self.state = next;
        true
    }

    fn is_drained(&self) -> bool {
        self.state == SessionState::Streaming && self.channels.iter().all(StreamChannel::is_terminated)
    }

    /// Start the session if needed and process channel events until it ends.
    ///
    /// Tears everything down before returning: channels are stopped, frames
    /// released and sinks disposed.
    pub async fn run(&mut self) -> SessionExit {
        if self.state == SessionState::Init {
            self.start().await;
        }

        let shutdown = self.shutdown.clone();
        let exit = loop {
            if self.redirect_at.is_none() && self.is_drained() {
                break SessionExit::Drained;
            }

            let deadline = self.redirect_at;
            let step = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Step::Shutdown,
                _ = wait_for(deadline) => Step::Redirect,
                event = self.events_rx.recv() => Step::Event(event),
            };

            match step {
                Step::Shutdown => break SessionExit::Shutdown,
                Step::Redirect => break SessionExit::LoginRequired,
                Step::Event(Some(event)) => self.handle_event(event),
                Step::Event(None) => break SessionExit::Drained,
            }
        };

        info!("Session ended: {:?}", exit);
        self.teardown().await;
        exit
    }

    async fn teardown(&mut self) {
        for channel in &mut self.channels {
            channel.shutdown();
        }
        for channel in &mut self.channels {
            channel.join().await;
        }
        self.sinks.dispose_all();
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
