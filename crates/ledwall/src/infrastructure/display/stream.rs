//! Raw frame stream for the panel driver.
//!
//! Every frame is written as `width * height` packed 3-byte pixels with no
//! header, row-major, chain 0 first.  The reader knows the geometry from the
//! same configuration file, so a frame boundary is simply every
//! `width * height * 3` bytes.
//!
//! The stream is flushed after each frame: the reader swaps a frame onto the
//! panels as soon as it has read a complete one.

use std::{
    fs::OpenOptions,
    io::{BufWriter, Stdout, Write},
    path::Path,
};

use ledwall_core::PixelOrder;
use tracing::debug;

use crate::application::compose_frame::{DisplaySink, EncodedFrame, SinkError};

/// Writes composed frames to any byte stream.
pub struct RawStreamSink<W: Write + Send> {
    writer: W,
    target: String,
    order: PixelOrder,
    frame_len: usize,
    closed: bool,
}

impl<W: Write + Send> RawStreamSink<W> {
    /// Wraps `writer`; every frame must be exactly `width * height` pixels.
    pub fn new(writer: W, target: impl Into<String>, size: (u32, u32), order: PixelOrder) -> Self {
        let (width, height) = size;
        Self {
            writer,
            target: target.into(),
            order,
            frame_len: width as usize * height as usize * 3,
            closed: false,
        }
    }

    /// Bytes in one frame.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Unwraps the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            target: self.target.clone(),
            source,
        }
    }
}

impl RawStreamSink<Stdout> {
    /// Frame stream on the process's standard output.
    pub fn to_stdout(size: (u32, u32), order: PixelOrder) -> Self {
        Self::new(std::io::stdout(), "stdout", size, order)
    }
}

impl RawStreamSink<BufWriter<std::fs::File>> {
    /// Frame stream into the file or FIFO at `path`.
    ///
    /// Opening a FIFO blocks until the driver opens the reading end.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] if `path` cannot be opened for writing.
    pub fn to_path(path: &Path, size: (u32, u32), order: PixelOrder) -> Result<Self, SinkError> {
        let target = path.display().to_string();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| SinkError::Io {
                target: target.clone(),
                source,
            })?;
        debug!(%target, "opened raw frame stream");
        Ok(Self::new(BufWriter::new(file), target, size, order))
    }
}

impl<W: Write + Send> DisplaySink for RawStreamSink<W> {
    fn pixel_order(&self) -> PixelOrder {
        self.order
    }

    fn present(&mut self, frame: &EncodedFrame<'_>) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        if frame.bytes.len() != self.frame_len {
            return Err(SinkError::FrameSize {
                expected: self.frame_len,
                found: frame.bytes.len(),
            });
        }
        self.writer
            .write_all(frame.bytes)
            .and_then(|()| self.writer.flush())
            .map_err(|e| self.io_error(e))
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer.flush().map_err(|e| self.io_error(e))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
