//! Preview sink writing binary PPM (`P6`) snapshots.
//!
//! Each frame replaces the previous snapshot atomically: the image is written
//! to a sibling temporary file and renamed over the target, so a viewer never
//! reads half a frame.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use ledwall_core::PixelOrder;
use tracing::debug;

use crate::application::compose_frame::{DisplaySink, EncodedFrame, SinkError};

/// Rewrites one PPM image per presented frame.
pub struct PpmSnapshotSink {
    path: PathBuf,
    staging: PathBuf,
    buffer: Vec<u8>,
    closed: bool,
}

impl PpmSnapshotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");
        Self {
            path,
            staging: PathBuf::from(staging),
            buffer: Vec::new(),
            closed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            target: self.path.display().to_string(),
            source,
        }
    }
}

impl DisplaySink for PpmSnapshotSink {
    fn pixel_order(&self) -> PixelOrder {
        PixelOrder::Rgb
    }

    fn present(&mut self, frame: &EncodedFrame<'_>) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        let expected = frame.width as usize * frame.height as usize * 3;
        if frame.bytes.len() != expected {
            return Err(SinkError::FrameSize {
                expected,
                found: frame.bytes.len(),
            });
        }

        self.buffer.clear();
        // Writing into a Vec cannot fail.
        let _ = write!(self.buffer, "P6\n{} {}\n255\n", frame.width, frame.height);
        self.buffer.extend_from_slice(frame.bytes);

        fs::write(&self.staging, &self.buffer).map_err(|e| self.io_error(e))?;
        fs::rename(&self.staging, &self.path).map_err(|e| self.io_error(e))
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        debug!(path = %self.path.display(), "preview snapshot closed");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ledwall-{name}-{}.ppm", std::process::id()))
    }

    #[test]
    fn test_present_writes_p6_image() {
        // Arrange
        let path = temp_path("snapshot");
        let mut sink = PpmSnapshotSink::new(&path);
        let bytes = [255, 0, 0, 0, 255, 0];

        // Act
        sink.present(&EncodedFrame {
            width: 2,
            height: 1,
            order: PixelOrder::Rgb,
            bytes: &bytes,
        })
        .unwrap();

        // Assert
        let written = fs::read(&path).unwrap();
        fs::remove_file(&path).ok();
        let mut expected = b"P6\n2 1\n255\n".to_vec();
        expected.extend_from_slice(&bytes);
        assert_eq!(written, expected);
    }

    #[test]
    fn test_present_replaces_previous_snapshot() {
        let path = temp_path("replace");
        let mut sink = PpmSnapshotSink::new(&path);
        for value in [1u8, 2] {
            let bytes = [value; 3];
            sink.present(&EncodedFrame {
                width: 1,
                height: 1,
                order: PixelOrder::Rgb,
                bytes: &bytes,
            })
            .unwrap();
        }

        let written = fs::read(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(&written[written.len() - 3..], &[2, 2, 2]);
        assert!(!sink.staging.exists());
    }

    #[test]
    fn test_present_rejects_short_frame() {
        let mut sink = PpmSnapshotSink::new(temp_path("short"));
        let err = sink
            .present(&EncodedFrame {
                width: 2,
                height: 2,
                order: PixelOrder::Rgb,
                bytes: &[0; 3],
            })
            .unwrap_err();
        assert!(matches!(err, SinkError::FrameSize { expected: 12, found: 3 }));
    }
}
