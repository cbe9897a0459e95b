//! Mock display sink for testing.
//!
//! The `MockDisplaySink` replaces the panel driver with in-memory recording.
//! Clones share the same record, so a test can hand one clone to the frame
//! loop (which takes ownership of its sink) and keep another to inspect what
//! was presented.
//!
//! # Usage in tests
//!
//! ```ignore
//! let sink = MockDisplaySink::new(PixelOrder::Rgb);
//! let mut frame_loop =
//!     FrameLoop::new(&layout, RunMode::Physical, Box::new(sink.clone()), 15, running)?;
//!
//! frame_loop.run(&mut scene).await?;
//!
//! assert_eq!(sink.frame_count(), 3);
//! ```

use std::sync::{Arc, Mutex};

use ledwall_core::PixelOrder;

use crate::application::compose_frame::{DisplaySink, EncodedFrame, SinkError};

/// One presented frame, copied out of the compositor's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFrame {
    pub width: u32,
    pub height: u32,
    pub order: PixelOrder,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct Record {
    frames: Vec<RecordedFrame>,
    closed: bool,
}

/// Records every presented frame without touching any device.
#[derive(Debug, Clone, Default)]
pub struct MockDisplaySink {
    order: PixelOrder,
    record: Arc<Mutex<Record>>,
    /// When `true`, `present` returns [`SinkError::Closed`].
    pub should_fail: bool,
}

impl MockDisplaySink {
    pub fn new(order: PixelOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    /// All frames presented so far, oldest first.
    pub fn frames(&self) -> Vec<RecordedFrame> {
        self.lock().frames.clone()
    }

    pub fn frame_count(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn last_frame(&self) -> Option<RecordedFrame> {
        self.lock().frames.last().cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Record> {
        // A panic while recording leaves the record usable.
        self.record.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DisplaySink for MockDisplaySink {
    fn pixel_order(&self) -> PixelOrder {
        self.order
    }

    fn present(&mut self, frame: &EncodedFrame<'_>) -> Result<(), SinkError> {
        let mut record = self.lock();
        if self.should_fail || record.closed {
            return Err(SinkError::Closed);
        }
        record.frames.push(RecordedFrame {
            width: frame.width,
            height: frame.height,
            order: frame.order,
            bytes: frame.bytes.to_vec(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.lock().closed = true;
        Ok(())
    }
}
