//! Frame composition: turns the virtual canvas into the frame a display
//! sink understands.
//!
//! # Two run modes (for beginners)
//!
//! - **Physical**: the canvas is cut into panel squares and each square is
//!   copied to its slot on the hardware chains (see
//!   [`ledwall_core::AddressMap`]).  Deadzone cells are never copied.
//! - **Preview**: the canvas is shown as-is, scaled up by an integer factor,
//!   so the layout can be checked on a normal screen.
//!
//! The mode is picked once at startup and never changes.
//!
//! # Buffer ownership
//!
//! [`FrameCompositor`] owns its output buffer and the encoded bytes.  The sink
//! only borrows them for the duration of [`DisplaySink::present`], so the
//! compositor can never mutate a frame while it is being presented.

use ledwall_core::{AddressMap, Canvas, PanelLayout, PixelOrder};
use thiserror::Error;
use tracing::trace;

/// Error type for display sink operations.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing the frame to the underlying device or file failed.
    #[error("I/O error presenting frame to {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The frame does not match the geometry the sink was opened with.
    #[error("frame is {found} bytes, sink expects {expected}")]
    FrameSize { expected: usize, found: usize },

    /// The sink was closed and cannot present any more frames.
    #[error("display sink is closed")]
    Closed,
}

/// Largest accepted preview scale factor.
pub const MAX_PREVIEW_SCALE: u32 = 16;

/// Error type for output geometry that cannot be allocated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeError {
    #[error("preview scale {scale} is outside 1..={max}")]
    PreviewScale { scale: u32, max: u32 },

    #[error("{width}x{height} canvas scaled by {scale} is too large to preview")]
    PreviewTooLarge { width: u32, height: u32, scale: u32 },
}

/// How the compositor lays out each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Virtual canvas upscaled by `scale` for an on-screen preview.
    Preview { scale: u32 },
    /// Panel squares rearranged into the chained hardware frame.
    Physical,
}

/// A fully composed frame, borrowed for one [`DisplaySink::present`] call.
#[derive(Debug, Clone, Copy)]
pub struct EncodedFrame<'a> {
    pub width: u32,
    pub height: u32,
    pub order: PixelOrder,
    /// `width * height` packed 3-byte pixels in `order`.
    pub bytes: &'a [u8],
}

/// Platform-agnostic display output.
///
/// Implementations live in the infrastructure layer.
pub trait DisplaySink: Send {
    /// Byte order the sink wants pixels encoded in.
    fn pixel_order(&self) -> PixelOrder;

    /// Presents one frame and swaps it onto the display.
    ///
    /// The frame is only borrowed for the duration of the call; sinks that
    /// double-buffer must copy it.
    fn present(&mut self, frame: &EncodedFrame<'_>) -> Result<(), SinkError>;

    /// Releases display resources.  Called once during shutdown.
    fn close(&mut self) -> Result<(), SinkError>;
}

/// Composes one output frame per tick.
pub struct FrameCompositor {
    mode: RunMode,
    addresses: AddressMap,
    output: Canvas,
    encoded: Vec<u8>,
    frames_presented: u64,
}

impl FrameCompositor {
    /// Creates a compositor for `layout`.
    ///
    /// The output buffer is `(panels_per_channel * size, channel_count * size)`
    /// in physical mode and `scale` times the canvas in preview mode.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError`] if the preview scale is outside
    /// `1..=MAX_PREVIEW_SCALE` or the scaled canvas does not fit a `u32`
    /// surface.
    pub fn new(layout: &PanelLayout, mode: RunMode) -> Result<Self, ModeError> {
        let addresses = AddressMap::new(layout);
        let (width, height) = match mode {
            RunMode::Physical => addresses.physical_size(),
            RunMode::Preview { scale } => preview_size(layout.canvas_size(), scale)?,
        };

        Ok(Self {
            mode,
            addresses,
            output: Canvas::new(width, height),
            encoded: Vec::with_capacity(width as usize * height as usize * 3),
            frames_presented: 0,
        })
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn output_size(&self) -> (u32, u32) {
        self.output.size()
    }

    /// The most recently composed frame.
    pub fn output(&self) -> &Canvas {
        &self.output
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Composes `canvas` into the output buffer.
    pub fn compose(&mut self, canvas: &Canvas) {
        match self.mode {
            RunMode::Preview { scale } => self.output.scale_from(canvas, scale),
            RunMode::Physical => {
                for address in &self.addresses {
                    self.output.blit(
                        canvas,
                        address.source,
                        address.destination.x,
                        address.destination.y,
                    );
                }
            }
        }
    }

    /// Composes `canvas`, encodes it in the sink's pixel order, and presents
    /// it.  Exactly one [`DisplaySink::present`] call per invocation.
    ///
    /// # Errors
    ///
    /// Propagates the sink's [`SinkError`] unchanged.
    pub fn present<S>(&mut self, canvas: &Canvas, sink: &mut S) -> Result<(), SinkError>
    where
        S: DisplaySink + ?Sized,
    {
        self.compose(canvas);

        let order = sink.pixel_order();
        self.encoded.clear();
        self.output.encode_into(order, &mut self.encoded);

        let (width, height) = self.output.size();
        sink.present(&EncodedFrame {
            width,
            height,
            order,
            bytes: &self.encoded,
        })?;

        self.frames_presented += 1;
        trace!(frame = self.frames_presented, width, height, "frame presented");
        Ok(())
    }
}

fn preview_size((width, height): (u32, u32), scale: u32) -> Result<(u32, u32), ModeError> {
    if !(1..=MAX_PREVIEW_SCALE).contains(&scale) {
        return Err(ModeError::PreviewScale {
            scale,
            max: MAX_PREVIEW_SCALE,
        });
    }
    width
        .checked_mul(scale)
        .zip(height.checked_mul(scale))
        .filter(|(w, h)| w.checked_mul(*h).and_then(|n| n.checked_mul(3)).is_some())
        .ok_or(ModeError::PreviewTooLarge {
            width,
            height,
            scale,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
