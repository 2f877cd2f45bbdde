//! In-memory sinks that record what they were asked to show

use std::sync::{Arc, Mutex};

use super::{RenderSink, SinkFactory};
use crate::camera::{CameraDescriptor, CameraId};
use crate::error::SinkError;
use crate::frame::FrameHandle;

/// Something that happened to a recording sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Created(CameraId),
    Frame {
        camera: CameraId,
        seq: u64,
        len: usize,
    },
    Disposed(CameraId),
}

/// Factory for [`RecordingSink`]s sharing one event log.
///
/// Clones share the log, so a test can keep one clone and hand the other to
/// a session.
#[derive(Debug, Clone, Default)]
pub struct RecordingSinks {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSinks {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Cameras a sink was created for, in creation order
    pub fn created(&self) -> Vec<CameraId> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Created(camera) => Some(camera),
                _ => None,
            })
            .collect()
    }

    /// Sequence numbers of the frames shown on `camera`, in display order
    pub fn frames_for(&self, camera: CameraId) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Frame { camera: c, seq, .. } if c == camera => Some(seq),
                _ => None,
            })
            .collect()
    }

    pub fn disposed(&self) -> Vec<CameraId> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Disposed(camera) => Some(camera),
                _ => None,
            })
            .collect()
    }
}

impl SinkFactory for RecordingSinks {
    fn create(&self, camera: &CameraDescriptor) -> Result<Box<dyn RenderSink>, SinkError> {
        self.push(SinkEvent::Created(camera.id));
        Ok(Box::new(RecordingSink {
            camera: camera.id,
            log: self.clone(),
            disposed: false,
        }))
    }
}

/// Sink that appends to a shared [`RecordingSinks`] log
#[derive(Debug)]
pub struct RecordingSink {
    camera: CameraId,
    log: RecordingSinks,
    disposed: bool,
}

impl RenderSink for RecordingSink {
    fn update(&mut self, frame: &FrameHandle) -> Result<(), SinkError> {
        if self.disposed {
            return Err(SinkError::Disposed(self.camera));
        }
        self.log.push(SinkEvent::Frame {
            camera: self.camera,
            seq: frame.seq(),
            len: frame.data().len(),
        });
        Ok(())
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.log.push(SinkEvent::Disposed(self.camera));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameLedger;
    use bytes::Bytes;

    #[test]
    fn records_frames_per_camera() {
        let sinks = RecordingSinks::new();
        let ledger = FrameLedger::new();
        let mut sink = sinks.create(&CameraDescriptor::new(3)).unwrap();

        sink.update(&ledger.decode(CameraId(3), Bytes::from_static(b"abc")))
            .unwrap();
        sink.update(&ledger.decode(CameraId(3), Bytes::from_static(b"de")))
            .unwrap();

        assert_eq!(sinks.frames_for(CameraId(3)), vec![0, 1]);
        assert!(sinks.frames_for(CameraId(4)).is_empty());
        assert_eq!(
            sinks.events()[1],
            SinkEvent::Frame {
                camera: CameraId(3),
                seq: 0,
                len: 3
            }
        );
    }

    #[test]
    fn update_after_dispose_fails() {
        let sinks = RecordingSinks::new();
        let ledger = FrameLedger::new();
        let mut sink = sinks.create(&CameraDescriptor::new(1)).unwrap();

        sink.dispose();
        sink.dispose();

        let result = sink.update(&ledger.decode(CameraId(1), Bytes::new()));
        assert!(matches!(result, Err(SinkError::Disposed(CameraId(1)))));
        assert_eq!(sinks.disposed(), vec![CameraId(1)]);
    }
}
