//! # ledwall-core
//!
//! Shared library for LedWall containing the panel layout model, the
//! geometry engine, the chained-panel address translator, and the pixel
//! surfaces the runtime composes frames into.
//!
//! It has zero dependencies on OS APIs, display drivers, or the file system.
//!
//! # Architecture overview (for beginners)
//!
//! An LED wall is built from identical square panels hung on a wall in a
//! grid.  Some grid cells are left empty (a "deadzone").  Electrically, the
//! panels are wired in series into one or more *chains*; the driver sees
//! each chain as a single long strip of panels.  The application draws on one
//! big virtual canvas covering the whole grid, and every frame that canvas
//! has to be cut into panel-sized squares and rearranged into the order the
//! chains expect.
//!
//! - **`domain::layout`** – The validated grid: which cell holds which panel.
//!
//! - **`domain::mapping`** – Parses the `mapping` text from the config file
//!   into a [`PanelLayout`].
//!
//! - **`domain::geometry`** – Deadzone and panel rectangles, plus the largest
//!   fully-populated rectangle (handy for centering overlays).
//!
//! - **`domain::addressing`** – Where each panel's square lives on the canvas
//!   and where it has to go in the chained hardware frame.
//!
//! - **`frame`** – Plain RGB pixel surfaces with fill, blit, scale, and
//!   byte encoding.

pub mod domain;
pub mod frame;

// Re-export the most-used types at the crate root so callers can write
// `ledwall_core::PanelLayout` instead of `ledwall_core::domain::layout::PanelLayout`.
pub use domain::addressing::{AddressMap, ChainAddress, PanelAddress};
pub use domain::geometry::{CellRect, Occupancy, Rect, SizeMetric};
pub use domain::layout::{GridCell, LayoutError, PanelId, PanelLayout};
pub use domain::mapping::{parse_mapping, parse_panel_layout, EMPTY_CELL};
pub use frame::{Canvas, PixelOrder, Rgb};
