//! Display sink implementations.
//!
//! The [`DisplaySink`](crate::application::compose_frame::DisplaySink) trait
//! is defined in the application layer; this module provides the adapters:
//!
//! - [`stream::RawStreamSink`] – physical mode.  Writes every chained frame
//!   as raw packed pixels to stdout or a FIFO, where the panel driver reads
//!   it and swaps it onto the hardware.
//! - [`ppm::PpmSnapshotSink`] – preview mode.  Rewrites a PPM image on every
//!   frame so any image viewer can follow the canvas.
//! - [`matrix`] – physical mode on the controller itself.  With the
//!   `hardware` feature, `matrix::MatrixSink` drives the panels directly
//!   through the hzeller driver.
//! - [`mock::MockDisplaySink`] – records frames in memory for tests.

pub mod matrix;
pub mod mock;
pub mod ppm;
pub mod stream;
