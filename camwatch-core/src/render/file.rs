//! Sink that keeps the latest frame of a camera on disk
//!
//! Disk I/O happens on a writer task per camera, so a slow disk never holds
//! up the session's event handling. The writer only ever writes the newest
//! frame it has been handed; frames that arrive while a write is in flight
//! replace each other.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tokio::fs;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{RenderSink, SinkFactory};
use crate::camera::{CameraDescriptor, CameraId};
use crate::error::SinkError;
use crate::frame::{FrameFormat, FrameHandle};

/// Creates one [`FileSink`] per camera inside a directory
#[derive(Debug, Clone)]
pub struct FileSinkFactory {
    dir: PathBuf,
    writers: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl FileSinkFactory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            writers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wait for the writer of every sink created so far to finish.
    ///
    /// Writers finish once their sink is disposed, after removing the frame
    /// file.
    pub async fn join_writers(&self) {
        let handles = std::mem::take(
            &mut *self.writers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Frame writer task failed: {}", e);
            }
        }
    }
}

impl SinkFactory for FileSinkFactory {
    /// Must be called from within a Tokio runtime.
    fn create(&self, camera: &CameraDescriptor) -> Result<Box<dyn RenderSink>, SinkError> {
        std::fs::create_dir_all(&self.dir)?;
        let (sink, writer) = FileSink::spawn(&self.dir, camera.id);
        self.writers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(writer);
        Ok(Box::new(sink))
    }
}

#[derive(Debug, Clone)]
struct PendingWrite {
    seq: u64,
    format: FrameFormat,
    data: Bytes,
}

/// Writes each frame to `camera-{id}.jpg` (or `.png`), replacing the previous
/// one atomically so readers never see a half-written image.
#[derive(Debug)]
pub struct FileSink {
    camera: CameraId,
    pending: Option<watch::Sender<Option<PendingWrite>>>,
    written: watch::Receiver<Option<(u64, PathBuf)>>,
}

impl FileSink {
    /// Create the sink and start its writer task on the current runtime.
    pub fn spawn(dir: &Path, camera: CameraId) -> (Self, JoinHandle<()>) {
        let (pending_tx, pending_rx) = watch::channel(None);
        let (written_tx, written_rx) = watch::channel(None);
        let writer = FrameWriter {
            camera,
            dir: dir.to_path_buf(),
            current: None,
        };
        let handle = tokio::spawn(writer.run(pending_rx, written_tx));

        let sink = Self {
            camera,
            pending: Some(pending_tx),
            written: written_rx,
        };
        (sink, handle)
    }

    /// Path of the file currently showing this camera, if any
    pub fn current_path(&self) -> Option<PathBuf> {
        self.written.borrow().as_ref().map(|(_, path)| path.clone())
    }

    /// Wait until frame `seq`, or a later one, is on disk.
    ///
    /// Returns the file it landed in, or `None` if the writer stopped first.
    pub async fn wait_written(&mut self, seq: u64) -> Option<PathBuf> {
        let written = self
            .written
            .wait_for(|w| matches!(w, Some((s, _)) if *s >= seq))
            .await
            .ok()?;
        written.as_ref().map(|(_, path)| path.clone())
    }
}

impl RenderSink for FileSink {
    fn update(&mut self, frame: &FrameHandle) -> Result<(), SinkError> {
        let Some(pending) = &self.pending else {
            return Err(SinkError::Disposed(self.camera));
        };
        pending.send_replace(Some(PendingWrite {
            seq: frame.seq(),
            format: frame.format(),
            data: frame.data().clone(),
        }));
        Ok(())
    }

    fn dispose(&mut self) {
        // The writer removes the file once it sees the sender go away
        if self.pending.take().is_some() {
            debug!("Camera {}: frame sink disposed", self.camera);
        }
    }
}

struct FrameWriter {
    camera: CameraId,
    dir: PathBuf,
    current: Option<PathBuf>,
}

impl FrameWriter {
    async fn run(
        mut self,
        mut pending: watch::Receiver<Option<PendingWrite>>,
        written: watch::Sender<Option<(u64, PathBuf)>>,
    ) {
        while pending.changed().await.is_ok() {
            let next = pending.borrow_and_update().clone();
            let Some(frame) = next else { continue };
            match self.write(&frame).await {
                Ok(path) => {
                    written.send_replace(Some((frame.seq, path)));
                }
                Err(e) => warn!(
                    "Camera {}: failed to write frame {}: {}",
                    self.camera, frame.seq, e
                ),
            }
        }

        if let Some(path) = self.current.take()
            && let Err(e) = fs::remove_file(&path).await
        {
            warn!("Failed to remove frame file {:?}: {}", path, e);
        }
        written.send_replace(None);
    }

    async fn write(&mut self, frame: &PendingWrite) -> std::io::Result<PathBuf> {
        let target = self.path_for(frame.format);
        let staging = self.dir.join(format!(".camera-{}.partial", self.camera));
        fs::write(&staging, &frame.data).await?;
        fs::rename(&staging, &target).await?;

        // A format switch leaves the old file behind otherwise.
        if let Some(previous) = self.current.replace(target.clone())
            && previous != target
            && let Err(e) = fs::remove_file(&previous).await
        {
            warn!("Failed to remove stale frame file {:?}: {}", previous, e);
        }

        debug!("Camera {} frame {} -> {:?}", self.camera, frame.seq, target);
        Ok(target)
    }

    fn path_for(&self, format: FrameFormat) -> PathBuf {
        let ext = match format {
            FrameFormat::Png => "png",
            FrameFormat::Jpeg | FrameFormat::Unknown => "jpg",
        };
        self.dir.join(format!("camera-{}.{}", self.camera, ext))
    }
}
