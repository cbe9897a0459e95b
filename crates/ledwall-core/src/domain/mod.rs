//! Domain entities for LedWall.
//!
//! # What is the "domain" layer? (for beginners)
//!
//! The domain layer holds the pure rules of the problem: no file system,
//! no threads, no hardware.  Everything here can be unit-tested with plain
//! values.
//!
//! # Sub-modules
//!
//! - **`layout`** – [`layout::PanelLayout`], the validated panel grid.
//! - **`mapping`** – Turns the textual mapping grid into a layout.
//! - **`geometry`** – Rectangles derived from the grid's occupancy.
//! - **`addressing`** – Canvas-to-chain address translation.

pub mod addressing;
pub mod geometry;
pub mod layout;
pub mod mapping;
