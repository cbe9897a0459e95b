//! Infrastructure layer for the LED wall runtime.
//!
//! Contains OS-facing adapters: configuration file loading, display sinks,
//! helper process supervision, and the host identity check.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `ledwall_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod display;
pub mod helper;
pub mod host;
pub mod storage;
