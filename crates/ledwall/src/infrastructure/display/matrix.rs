//! Direct panel output through the hzeller `rpi-rgb-led-matrix` library.
//!
//! Only built with the `hardware` cargo feature, which links the C++ driver
//! through the `rpi-led-matrix` crate.  Every frame is written into the
//! library's offscreen canvas and swapped onto the panels on the next
//! vertical sync, so a half-drawn frame is never visible.
//!
//! [`MatrixGeometry`] is always available so the chain parameters can be
//! checked without the hardware.

use ledwall_core::PanelLayout;

/// Chain parameters handed to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixGeometry {
    /// LEDs per panel side.
    pub panel_size: u32,
    /// Panels on each chain.
    pub chain_length: u32,
    /// Number of parallel chains.
    pub parallel: u32,
}

impl MatrixGeometry {
    pub fn for_layout(layout: &PanelLayout) -> Self {
        Self {
            panel_size: layout.panel_size(),
            chain_length: layout.panels_per_channel(),
            parallel: layout.channel_count(),
        }
    }

    /// `(width, height)` of the frame the driver displays.
    pub fn frame_size(&self) -> (u32, u32) {
        (
            self.chain_length * self.panel_size,
            self.parallel * self.panel_size,
        )
    }
}

#[cfg(feature = "hardware")]
pub use hardware::MatrixSink;

#[cfg(feature = "hardware")]
mod hardware {
    use ledwall_core::PixelOrder;
    use rpi_led_matrix::{LedCanvas, LedColor, LedMatrix, LedMatrixOptions, LedRuntimeOptions};
    use tracing::info;

    use super::MatrixGeometry;
    use crate::application::compose_frame::{DisplaySink, EncodedFrame, SinkError};

    const TARGET: &str = "rgb matrix";

    /// Drives the panels directly, double-buffered.
    pub struct MatrixSink {
        matrix: LedMatrix,
        canvas: Option<LedCanvas>,
        geometry: MatrixGeometry,
        order: PixelOrder,
    }

    // SAFETY: the driver handles are only used through `&mut self`, never
    // from two threads at once.  The library has no thread affinity for
    // canvas writes or swaps.
    unsafe impl Send for MatrixSink {}

    impl MatrixSink {
        /// Initialises the driver for `geometry`.
        ///
        /// # Errors
        ///
        /// Returns [`SinkError::Io`] if the driver cannot claim the GPIO
        /// pins (usually: not running as root, or not on a Raspberry Pi).
        pub fn open(geometry: MatrixGeometry, order: PixelOrder) -> Result<Self, SinkError> {
            let mut options = LedMatrixOptions::new();
            options.set_rows(geometry.panel_size);
            options.set_cols(geometry.panel_size);
            options.set_chain_length(geometry.chain_length);
            options.set_parallel(geometry.parallel);
            options.set_hardware_mapping("regular");

            let mut runtime = LedRuntimeOptions::new();
            runtime.set_drop_privileges(false);

            let matrix = LedMatrix::new(Some(options), Some(runtime)).map_err(|reason| {
                SinkError::Io {
                    target: TARGET.to_string(),
                    source: std::io::Error::other(reason),
                }
            })?;
            let canvas = matrix.offscreen_canvas();

            info!(
                chain_length = geometry.chain_length,
                parallel = geometry.parallel,
                size = geometry.panel_size,
                "rgb matrix initialised"
            );
            Ok(Self {
                matrix,
                canvas: Some(canvas),
                geometry,
                order,
            })
        }
    }

    impl DisplaySink for MatrixSink {
        fn pixel_order(&self) -> PixelOrder {
            self.order
        }

        fn present(&mut self, frame: &EncodedFrame<'_>) -> Result<(), SinkError> {
            let mut canvas = self.canvas.take().ok_or(SinkError::Closed)?;

            let (width, height) = self.geometry.frame_size();
            let expected = width as usize * height as usize * 3;
            if (frame.width, frame.height) != (width, height) || frame.bytes.len() != expected {
                self.canvas = Some(canvas);
                return Err(SinkError::FrameSize {
                    expected,
                    found: frame.bytes.len(),
                });
            }

            // Bytes are already in the wiring's order; pass them through.
            for (i, px) in frame.bytes.chunks_exact(3).enumerate() {
                let x = (i % width as usize) as i32;
                let y = (i / width as usize) as i32;
                let colour = LedColor {
                    red: px[0],
                    green: px[1],
                    blue: px[2],
                };
                canvas.set(x, y, &colour);
            }

            self.canvas = Some(self.matrix.swap(canvas));
            Ok(())
        }

        fn close(&mut self) -> Result<(), SinkError> {
            if let Some(mut canvas) = self.canvas.take() {
                canvas.clear();
                self.matrix.swap(canvas);
            }
            Ok(())
        }
    }
}
