//! Application layer for the LED wall runtime.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure layout rules in `ledwall-core`) and the infrastructure (files,
//! processes, display drivers).
//!
//! Code in this layer:
//!
//! - **Orchestrates** domain objects to produce frames.
//! - **Depends on abstractions** ([`compose_frame::DisplaySink`],
//!   [`scenes::Scene`], [`frame_loop::Readiness`]) rather than concrete
//!   implementations.
//! - **Contains no file system access and no process management**.
//!
//! # Sub-modules
//!
//! - **`compose_frame`** – Cuts the virtual canvas into panel squares and
//!   rearranges them into the chained hardware frame (or scales it for
//!   preview), then hands the frame to the display sink.
//!
//! - **`scenes`** – What gets painted on the canvas each tick.
//!
//! - **`frame_loop`** – The fixed-rate update → paint → present loop.

pub mod compose_frame;
pub mod frame_loop;
pub mod scenes;
