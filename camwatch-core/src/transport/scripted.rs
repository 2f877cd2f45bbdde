//! Transport that replays scripted events

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;

use super::{FrameStream, FrameTransport, TransportEvent};
use crate::auth::AuthToken;
use crate::camera::CameraId;
use crate::error::TransportError;

enum Script {
    Reject(TransportError),
    Events {
        events: Vec<TransportEvent>,
        hold_open: bool,
    },
}

/// Scripted [`FrameTransport`] for tests.
///
/// Each camera gets one script, consumed by the first `open` for that camera.
/// Opening a camera without a script fails.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<CameraId, Script>>,
    opened: Mutex<Vec<(CameraId, AuthToken)>>,
    live_streams: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `events` then end the stream
    pub fn with_events(self, camera: impl Into<CameraId>, events: Vec<TransportEvent>) -> Self {
        self.script(
            camera.into(),
            Script::Events {
                events,
                hold_open: false,
            },
        )
    }

    /// Deliver `events` then stay connected until the stream is dropped
    pub fn holding_open(self, camera: impl Into<CameraId>, events: Vec<TransportEvent>) -> Self {
        self.script(
            camera.into(),
            Script::Events {
                events,
                hold_open: true,
            },
        )
    }

    /// Fail the connection attempt
    pub fn rejecting(self, camera: impl Into<CameraId>, error: TransportError) -> Self {
        self.script(camera.into(), Script::Reject(error))
    }

    fn script(self, camera: CameraId, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(camera, script);
        self
    }

    /// Cameras opened so far, in order
    pub fn opened(&self) -> Vec<CameraId> {
        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(camera, _)| *camera)
            .collect()
    }

    /// Token used for the most recent `open` of `camera`
    pub fn token_for(&self, camera: CameraId) -> Option<AuthToken> {
        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .find(|(c, _)| *c == camera)
            .map(|(_, token)| token.clone())
    }

    /// Streams handed out and not yet dropped
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }
}

/// Decrements the live stream count when the stream is dropped
struct StreamGuard(Arc<AtomicUsize>);

impl StreamGuard {
    fn new(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(count))
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct Replay {
    events: VecDeque<TransportEvent>,
    hold_open: bool,
    _guard: StreamGuard,
}

#[async_trait]
impl FrameTransport for ScriptedTransport {
    async fn open(&self, camera: CameraId, token: &AuthToken) -> Result<FrameStream, TransportError> {
        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((camera, token.clone()));

        let script = self
            .scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&camera);

        let (events, hold_open) = match script {
            Some(Script::Events { events, hold_open }) => (events, hold_open),
            Some(Script::Reject(error)) => return Err(error),
            None => {
                return Err(TransportError::new(format!(
                    "no script for camera {}",
                    camera
                )));
            }
        };

        let replay = Replay {
            events: events.into(),
            hold_open,
            _guard: StreamGuard::new(&self.live_streams),
        };

        let events = stream::unfold(replay, |mut replay| async move {
            match replay.events.pop_front() {
                Some(event) => Some((event, replay)),
                None if replay.hold_open => {
                    futures_util::future::pending::<()>().await;
                    None
                }
                None => None,
            }
        });

        Ok(Box::pin(events))
    }
}
