//! Geometry derived from a layout's occupancy grid.
//!
//! All functions here depend only on which cells are occupied.  Results are
//! expressed either in grid cells ([`CellRect`]) or in canvas pixels
//! ([`Rect`]), where a cell is `panel_size × panel_size` pixels.
//!
//! # Largest rectangle search (for beginners)
//!
//! [`Occupancy::largest_rectangle`] answers "what is the biggest block of the
//! wall with no holes in it?".  Candidate shapes `(height, width)` are tried
//! from biggest to smallest under the chosen [`SizeMetric`]; for each shape,
//! every placement is tested and the first fully-occupied one wins.
//!
//! Testing a placement is O(1): a summed-area table stores, for every cell,
//! how many occupied cells lie above and to the left of it, so the number of
//! occupied cells inside any rectangle is four table lookups.

use std::cmp::Reverse;

use super::layout::{GridCell, PanelId, PanelLayout};

/// An axis-aligned rectangle in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: u32,
    /// Y coordinate of the top-left corner.
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The square covered by grid cell `cell`.
    pub fn from_cell(cell: GridCell, panel_size: u32) -> Self {
        Self::new(
            cell.col as u32 * panel_size,
            cell.row as u32 * panel_size,
            panel_size,
            panel_size,
        )
    }

    /// Returns the rightmost X coordinate (exclusive).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Returns the bottommost Y coordinate (exclusive).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Returns `true` if pixel `(x, y)` lies inside the rectangle.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Returns `true` if this rectangle overlaps with `other`.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// How "largest" is measured when comparing rectangle shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeMetric {
    /// Number of cells, `h * w`.
    #[default]
    Area,
    /// Squared diagonal, `h² + w²`.  Favours long thin rectangles.
    Diagonal,
}

impl SizeMetric {
    /// Scores a `height × width` cell shape; larger is better.
    pub fn score(self, height: usize, width: usize) -> u64 {
        let (h, w) = (height as u64, width as u64);
        match self {
            SizeMetric::Area => h * w,
            SizeMetric::Diagonal => h * h + w * w,
        }
    }
}

/// An axis-aligned rectangle measured in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRect {
    /// Top-left cell.
    pub origin: GridCell,
    /// Height in cells.
    pub height: usize,
    /// Width in cells.
    pub width: usize,
}

impl CellRect {
    /// Converts to canvas pixels for panels of `panel_size` LEDs.
    pub fn to_pixels(&self, panel_size: u32) -> Rect {
        Rect::new(
            self.origin.col as u32 * panel_size,
            self.origin.row as u32 * panel_size,
            self.width as u32 * panel_size,
            self.height as u32 * panel_size,
        )
    }
}

/// Boolean occupancy grid with a summed-area table for rectangle queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    rows: usize,
    cols: usize,
    /// `(rows + 1) × (cols + 1)` prefix sums; entry `(r, c)` counts occupied
    /// cells in rows `0..r`, columns `0..c`.
    sums: Vec<u32>,
}

impl Occupancy {
    /// Builds the table from row-major occupancy flags.
    ///
    /// Rows shorter than the first row are treated as padded with empty cells.
    pub fn new(grid: &[Vec<bool>]) -> Self {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        let stride = cols + 1;
        let mut sums = vec![0u32; (rows + 1) * stride];

        for (r, row) in grid.iter().enumerate() {
            let mut running = 0u32;
            for c in 0..cols {
                running += u32::from(row.get(c).copied().unwrap_or(false));
                sums[(r + 1) * stride + c + 1] = sums[r * stride + c + 1] + running;
            }
        }

        Self { rows, cols, sums }
    }

    /// Occupancy of a validated layout.
    pub fn of_layout(layout: &PanelLayout) -> Self {
        let grid: Vec<Vec<bool>> = (0..layout.rows())
            .map(|row| {
                (0..layout.cols())
                    .map(|col| layout.panel_at(GridCell { row, col }).is_some())
                    .collect()
            })
            .collect();
        Self::new(&grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of occupied cells inside `rect`.
    fn occupied_in(&self, rect: &CellRect) -> u32 {
        let stride = self.cols + 1;
        let (top, left) = (rect.origin.row, rect.origin.col);
        let (bottom, right) = (top + rect.height, left + rect.width);
        let at = |r: usize, c: usize| self.sums[r * stride + c];
        at(bottom, right) + at(top, left) - at(top, right) - at(bottom, left)
    }

    /// Returns `true` if every cell of `rect` is occupied.
    pub fn is_full(&self, rect: &CellRect) -> bool {
        rect.origin.row + rect.height <= self.rows
            && rect.origin.col + rect.width <= self.cols
            && self.occupied_in(rect) as usize == rect.height * rect.width
    }

    /// Finds the largest fully-occupied rectangle under `metric`.
    ///
    /// Shapes with equal scores are tried taller first, then wider.  For a
    /// given shape, placements are scanned row-major by top-left cell.
    /// Returns `None` only when no cell is occupied.
    pub fn largest_rectangle(&self, metric: SizeMetric) -> Option<CellRect> {
        let mut shapes: Vec<(usize, usize)> = (1..=self.rows)
            .rev()
            .flat_map(|h| (1..=self.cols).rev().map(move |w| (h, w)))
            .collect();
        // Stable sort keeps the (h desc, w desc) order among equal scores.
        shapes.sort_by_key(|&(h, w)| Reverse(metric.score(h, w)));

        shapes.into_iter().find_map(|(height, width)| {
            (0..=self.rows - height)
                .flat_map(|row| (0..=self.cols - width).map(move |col| GridCell { row, col }))
                .map(|origin| CellRect {
                    origin,
                    height,
                    width,
                })
                .find(|rect| self.is_full(rect))
        })
    }
}

impl PanelLayout {
    /// Yields one panel-sized pixel rectangle per deadzone cell, row-major.
    ///
    /// The iterator borrows the layout; call again to restart.
    pub fn deadzones(&self) -> impl Iterator<Item = Rect> + '_ {
        let size = self.panel_size();
        self.cells()
            .filter(|(_, id)| id.is_none())
            .map(move |(cell, _)| Rect::from_cell(cell, size))
    }

    /// Yields one panel-sized pixel rectangle per occupied cell, row-major.
    pub fn panel_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        let size = self.panel_size();
        self.panels().map(move |(cell, _)| Rect::from_cell(cell, size))
    }

    /// Canvas rectangle of panel `id`.
    pub fn panel_rect(&self, id: PanelId) -> Option<Rect> {
        self.position_of(id)
            .map(|cell| Rect::from_cell(cell, self.panel_size()))
    }

    /// The largest fully-populated rectangle of the wall, in canvas pixels.
    ///
    /// A validated layout always has at least one panel, so this only
    /// returns `None` for degenerate grids built outside [`PanelLayout::new`].
    pub fn largest_rectangle(&self, metric: SizeMetric) -> Option<Rect> {
        Occupancy::of_layout(self)
            .largest_rectangle(metric)
            .map(|rect| rect.to_pixels(self.panel_size()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
