//! Decoded frame resources
//!
//! Every binary message from a camera becomes one [`FrameHandle`]. A handle
//! is an owned resource: it is counted as live from the moment it is decoded
//! until it is dropped, which is how a channel releases the frame it showed
//! previously.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bytes::Bytes;

use crate::camera::CameraId;

/// Image encoding detected from a frame's leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Jpeg,
    Png,
    Unknown,
}

impl FrameFormat {
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            FrameFormat::Jpeg
        } else if data.starts_with(&[0x89, b'P', b'N', b'G']) {
            FrameFormat::Png
        } else {
            FrameFormat::Unknown
        }
    }

    /// MIME type to label the frame with. Unrecognized payloads are labelled
    /// JPEG, which is what the server sends.
    pub fn content_type(self) -> &'static str {
        match self {
            FrameFormat::Png => "image/png",
            FrameFormat::Jpeg | FrameFormat::Unknown => "image/jpeg",
        }
    }
}

/// Tracks the frames one channel has decoded and not yet released
#[derive(Debug, Clone, Default)]
pub struct FrameLedger {
    live: Arc<AtomicUsize>,
    issued: Arc<AtomicU64>,
}

impl FrameLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap raw bytes as a displayable frame
    pub fn decode(&self, camera: CameraId, data: Bytes) -> FrameHandle {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        FrameHandle {
            camera,
            seq,
            format: FrameFormat::sniff(&data),
            data,
            live: Arc::clone(&self.live),
        }
    }

    /// Frames decoded and not yet released
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Frames decoded since the ledger was created
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

/// One decoded frame, released on drop
#[derive(Debug)]
pub struct FrameHandle {
    camera: CameraId,
    seq: u64,
    format: FrameFormat,
    data: Bytes,
    live: Arc<AtomicUsize>,
}

impl FrameHandle {
    pub fn camera(&self) -> CameraId {
        self.camera
    }

    /// Position of this frame in its channel's arrival order, from 0
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    /// Encoded image bytes. Cloning the returned `Bytes` shares the buffer
    /// without extending the handle's lifetime.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Stable reference naming this frame, e.g. `frame:2/17`
    pub fn locator(&self) -> String {
        format!("frame:{}/{}", self.camera, self.seq)
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00];

    #[test]
    fn sniffs_known_formats() {
        assert_eq!(FrameFormat::sniff(JPEG), FrameFormat::Jpeg);
        assert_eq!(FrameFormat::sniff(b"\x89PNG\r\n"), FrameFormat::Png);
        assert_eq!(FrameFormat::sniff(b"hello"), FrameFormat::Unknown);
        assert_eq!(FrameFormat::sniff(b""), FrameFormat::Unknown);
    }

    #[test]
    fn unknown_frames_are_labelled_jpeg() {
        assert_eq!(FrameFormat::Unknown.content_type(), "image/jpeg");
        assert_eq!(FrameFormat::Png.content_type(), "image/png");
    }

    #[test]
    fn decode_counts_live_frames_until_dropped() {
        let ledger = FrameLedger::new();

        let first = ledger.decode(CameraId(1), Bytes::from_static(JPEG));
        let second = ledger.decode(CameraId(1), Bytes::from_static(JPEG));
        assert_eq!(ledger.live(), 2);

        drop(first);
        assert_eq!(ledger.live(), 1);
        drop(second);
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.issued(), 2);
    }

    #[test]
    fn sequence_numbers_follow_decode_order() {
        let ledger = FrameLedger::new();
        let a = ledger.decode(CameraId(2), Bytes::new());
        let b = ledger.decode(CameraId(2), Bytes::new());
        assert_eq!(a.seq(), 0);
        assert_eq!(b.seq(), 1);
        assert_eq!(b.locator(), "frame:2/1");
    }

    #[test]
    fn sharing_bytes_does_not_keep_the_frame_live() {
        let ledger = FrameLedger::new();
        let frame = ledger.decode(CameraId(0), Bytes::from_static(JPEG));
        let shared = frame.data().clone();

        drop(frame);

        assert_eq!(ledger.live(), 0);
        assert_eq!(&shared[..], JPEG);
    }
}
