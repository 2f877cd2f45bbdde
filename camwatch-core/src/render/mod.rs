//! Display targets for camera frames
//!
//! A [`RenderSink`] shows the most recent frame of one camera. Sinks are
//! created through a [`SinkFactory`] when the session learns about a camera
//! and disposed together when the session is torn down.

mod file;
mod recording;

pub use file::{FileSink, FileSinkFactory};
pub use recording::{RecordingSink, RecordingSinks, SinkEvent};

use tracing::debug;

use crate::camera::{CameraDescriptor, CameraId};
use crate::error::SinkError;
use crate::frame::FrameHandle;

/// Per-camera display target
pub trait RenderSink: Send {
    /// Show `frame` in place of whatever was shown before.
    ///
    /// The sink only borrows the frame; it must not outlive the call. Sinks
    /// that need the pixels later copy or share [`FrameHandle::data`].
    fn update(&mut self, frame: &FrameHandle) -> Result<(), SinkError>;

    /// Tear the display target down
    fn dispose(&mut self);
}

/// Creates the sink for each camera of a session
pub trait SinkFactory: Send + Sync {
    fn create(&self, camera: &CameraDescriptor) -> Result<Box<dyn RenderSink>, SinkError>;
}

/// Sinks of one session, in directory order
#[derive(Default)]
pub struct SinkRegistry {
    entries: Vec<(CameraId, Box<dyn RenderSink>)>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the sink for `camera`. Returns false, leaving the registry
    /// unchanged, if the camera already has one.
    pub fn insert(&mut self, camera: CameraId, sink: Box<dyn RenderSink>) -> bool {
        if self.contains(camera) {
            return false;
        }
        self.entries.push((camera, sink));
        true
    }

    pub fn contains(&self, camera: CameraId) -> bool {
        self.entries.iter().any(|(id, _)| *id == camera)
    }

    pub fn get_mut(&mut self, camera: CameraId) -> Option<&mut (dyn RenderSink + 'static)> {
        self.entries
            .iter_mut()
            .find(|(id, _)| *id == camera)
            .map(|(_, sink)| sink.as_mut())
    }

    /// Camera IDs in registration order
    pub fn cameras(&self) -> Vec<CameraId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispose every sink and empty the registry
    pub fn dispose_all(&mut self) {
        for (camera, mut sink) in self.entries.drain(..) {
            debug!("Disposing sink for camera {}", camera);
            sink.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keeps_insertion_order() {
        let sinks = RecordingSinks::new();
        let mut registry = SinkRegistry::new();

        for id in [5, 0, 3] {
            let sink = sinks.create(&CameraDescriptor::new(id)).unwrap();
            assert!(registry.insert(CameraId(id), sink));
        }

        assert_eq!(registry.cameras(), vec![CameraId(5), CameraId(0), CameraId(3)]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn registry_rejects_duplicate_camera() {
        let sinks = RecordingSinks::new();
        let mut registry = SinkRegistry::new();

        let first = sinks.create(&CameraDescriptor::new(1)).unwrap();
        let second = sinks.create(&CameraDescriptor::new(1)).unwrap();

        assert!(registry.insert(CameraId(1), first));
        assert!(!registry.insert(CameraId(1), second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn dispose_all_disposes_every_sink_in_order() {
        let sinks = RecordingSinks::new();
        let mut registry = SinkRegistry::new();
        for id in [2, 1] {
            registry.insert(CameraId(id), sinks.create(&CameraDescriptor::new(id)).unwrap());
        }

        registry.dispose_all();

        assert!(registry.is_empty());
        assert_eq!(sinks.disposed(), vec![CameraId(2), CameraId(1)]);
    }

    #[test]
    fn get_mut_finds_registered_sink_only() {
        let sinks = RecordingSinks::new();
        let mut registry = SinkRegistry::new();
        registry.insert(CameraId(4), sinks.create(&CameraDescriptor::new(4)).unwrap());

        assert!(registry.get_mut(CameraId(4)).is_some());
        assert!(registry.get_mut(CameraId(9)).is_none());
    }
}
