//! Panel layout domain entity.
//!
//! The layout describes a wall of identical square LED panels arranged on a
//! grid.  Each grid cell either holds a panel, identified by its 1-based
//! position along the hardware chains, or is empty (a deadzone).  Grid cell
//! `(row, col)` covers the canvas square whose top-left pixel is
//! `(col * panel_size, row * panel_size)`.
//!
//! A [`PanelLayout`] can only be obtained through [`PanelLayout::new`], which
//! enforces every invariant up front; afterwards the layout is immutable.

use std::collections::BTreeSet;

use thiserror::Error;

/// Identifier of a physical panel: its 1-based index across all chains.
pub type PanelId = u32;

/// Errors that can occur when building a layout.
///
/// Every variant names the invariant that was violated and carries the
/// offending value so the startup error message is actionable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The mapping has no rows, or its first row has no cells.
    #[error("panel mapping is empty")]
    EmptyMapping,

    /// A row does not have the same number of cells as the first row.
    #[error("row {row} has {found} cells, expected {expected}: every row needs the same number of panels")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A mapping token is neither the empty placeholder nor an integer.
    #[error("invalid token {token:?} at row {row}, column {col}: expected '.' or an integer")]
    InvalidToken {
        row: usize,
        col: usize,
        token: String,
    },

    /// The same panel id appears in more than one cell.
    #[error("panel id {id} appears more than once")]
    DuplicatePanelId { id: PanelId },

    /// Some ids of `1..=panel_count` are absent.  `out_of_range` lists the ids
    /// found in their place.
    #[error(
        "panel ids must form the sequence 1..={panel_count}: missing {missing:?}, out of range {out_of_range:?}"
    )]
    MissingPanelIds {
        panel_count: u32,
        missing: Vec<PanelId>,
        out_of_range: Vec<i64>,
    },

    /// The mapping contains only deadzones.
    #[error("panel mapping contains no panels")]
    NoPanels,

    /// `parallel` is zero.
    #[error("channel count must be at least 1")]
    ZeroChannels,

    /// The panels cannot be shared evenly between the parallel chains.
    #[error("each channel must have the same number of panels: {panel_count} panels for {channel_count} channels")]
    UnevenChannels {
        panel_count: u32,
        channel_count: u32,
    },

    /// `led-rows` / `led-cols` is zero.
    #[error("panel size must be at least 1 LED")]
    ZeroPanelSize,

    /// `led-rows` and `led-cols` differ.
    #[error("only square panels are supported: led-rows = {led_rows}, led-cols = {led_cols}")]
    NonSquarePanels { led_rows: u32, led_cols: u32 },
}

/// Position of a cell on the layout grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

/// The validated panel grid.
///
/// Invariants (checked by [`PanelLayout::new`]):
///
/// 1. every row has exactly `cols` cells;
/// 2. the panel ids are exactly `1..=panel_count`, each used once;
/// 3. `panel_count` is a non-zero multiple of `channel_count`;
/// 4. `panel_size > 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLayout {
    cells: Vec<Vec<Option<PanelId>>>,
    cols: usize,
    panel_size: u32,
    channel_count: u32,
    /// `positions[id - 1]` is the grid cell holding panel `id`.
    positions: Vec<GridCell>,
}

impl PanelLayout {
    /// Builds a layout from raw cell values as written in the mapping.
    ///
    /// `None` marks a deadzone; `Some(n)` is a panel id.  Ids are taken as
    /// `i64` so that zero or negative values surface as range violations
    /// rather than parse failures.
    ///
    /// # Errors
    ///
    /// Returns the [`LayoutError`] for the first violated invariant.
    pub fn new(
        cells: Vec<Vec<Option<i64>>>,
        panel_size: u32,
        channel_count: u32,
    ) -> Result<Self, LayoutError> {
        let cols = cells.first().map_or(0, Vec::len);
        if cols == 0 {
            return Err(LayoutError::EmptyMapping);
        }
        if let Some((row, found)) = cells
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != cols)
        {
            return Err(LayoutError::RaggedRow {
                row,
                expected: cols,
                found,
            });
        }
        if panel_size == 0 {
            return Err(LayoutError::ZeroPanelSize);
        }
        if channel_count == 0 {
            return Err(LayoutError::ZeroChannels);
        }

        let panel_count = cells.iter().flatten().filter(|cell| cell.is_some()).count();
        if panel_count == 0 {
            return Err(LayoutError::NoPanels);
        }
        let panel_count = u32::try_from(panel_count).unwrap_or(u32::MAX);

        let mut positions: Vec<Option<GridCell>> = vec![None; panel_count as usize];
        let mut out_of_range = Vec::new();
        let mut validated = Vec::with_capacity(cells.len());

        for (row, raw_row) in cells.into_iter().enumerate() {
            let mut validated_row = Vec::with_capacity(cols);
            for (col, raw) in raw_row.into_iter().enumerate() {
                let Some(raw_id) = raw else {
                    validated_row.push(None);
                    continue;
                };
                let id = match PanelId::try_from(raw_id) {
                    Ok(id) if (1..=panel_count).contains(&id) => id,
                    _ => {
                        out_of_range.push(raw_id);
                        validated_row.push(None);
                        continue;
                    }
                };
                let slot = &mut positions[(id - 1) as usize];
                if slot.is_some() {
                    return Err(LayoutError::DuplicatePanelId { id });
                }
                *slot = Some(GridCell { row, col });
                validated_row.push(Some(id));
            }
            validated.push(validated_row);
        }

        let missing: Vec<PanelId> = positions
            .iter()
            .zip(1..)
            .filter(|(slot, _)| slot.is_none())
            .map(|(_, id)| id)
            .collect();
        if !missing.is_empty() {
            return Err(LayoutError::MissingPanelIds {
                panel_count,
                missing,
                out_of_range,
            });
        }

        if panel_count % channel_count != 0 {
            return Err(LayoutError::UnevenChannels {
                panel_count,
                channel_count,
            });
        }

        Ok(Self {
            cells: validated,
            cols,
            panel_size,
            channel_count,
            positions: positions.into_iter().flatten().collect(),
        })
    }

    /// Like [`PanelLayout::new`], but takes the two panel dimensions from the
    /// configuration and rejects non-square panels.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NonSquarePanels`] when `led_rows != led_cols`,
    /// otherwise whatever [`PanelLayout::new`] returns.
    pub fn with_led_dimensions(
        cells: Vec<Vec<Option<i64>>>,
        led_rows: u32,
        led_cols: u32,
        channel_count: u32,
    ) -> Result<Self, LayoutError> {
        if led_rows != led_cols {
            return Err(LayoutError::NonSquarePanels { led_rows, led_cols });
        }
        Self::new(cells, led_rows, channel_count)
    }

    /// Number of grid rows.
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// Number of grid columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// LEDs per panel side.
    pub fn panel_size(&self) -> u32 {
        self.panel_size
    }

    /// Number of parallel hardware chains.
    pub fn channel_count(&self) -> u32 {
        self.channel_count
    }

    /// Number of physical panels (non-empty cells).
    pub fn panel_count(&self) -> u32 {
        self.positions.len() as u32
    }

    /// Number of panels wired in series on each chain.
    pub fn panels_per_channel(&self) -> u32 {
        self.panel_count() / self.channel_count
    }

    /// Size of the virtual canvas covering the whole grid, in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        (
            self.cols as u32 * self.panel_size,
            self.rows() as u32 * self.panel_size,
        )
    }

    /// Returns the panel at `cell`, or `None` for a deadzone or a cell
    /// outside the grid.
    pub fn panel_at(&self, cell: GridCell) -> Option<PanelId> {
        self.cells.get(cell.row)?.get(cell.col).copied().flatten()
    }

    /// Returns the grid cell holding panel `id`.
    pub fn position_of(&self, id: PanelId) -> Option<GridCell> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.positions.get(index).copied()
    }

    /// Iterates every grid cell in row-major order with its panel, if any.
    pub fn cells(&self) -> impl Iterator<Item = (GridCell, Option<PanelId>)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, id)| (GridCell { row, col }, *id))
        })
    }

    /// Iterates the occupied cells in row-major order.
    pub fn panels(&self) -> impl Iterator<Item = (GridCell, PanelId)> + '_ {
        self.cells()
            .filter_map(|(cell, id)| id.map(|id| (cell, id)))
    }

    /// Ids of all panels, `1..=panel_count`.
    pub fn panel_ids(&self) -> BTreeSet<PanelId> {
        self.panels().map(|(_, id)| id).collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// The wall used throughout the docs:
    ///
    /// ```text
    /// .  .  1  .
    /// 2  3  4  .
    /// 5  6  7  8
    /// ```
    fn sample_cells() -> Vec<Vec<Option<i64>>> {
        vec![
            vec![None, None, Some(1), None],
            vec![Some(2), Some(3), Some(4), None],
            vec![Some(5), Some(6), Some(7), Some(8)],
        ]
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn test_new_accepts_sample_wall() {
        let layout = PanelLayout::new(sample_cells(), 64, 1).expect("valid layout");

        assert_eq!(layout.rows(), 3);
        assert_eq!(layout.cols(), 4);
        assert_eq!(layout.panel_count(), 8);
        assert_eq!(layout.panels_per_channel(), 8);
        assert_eq!(layout.canvas_size(), (256, 192));
    }

    #[test]
    fn test_new_splits_panels_across_channels() {
        let layout = PanelLayout::new(sample_cells(), 64, 2).unwrap();
        assert_eq!(layout.channel_count(), 2);
        assert_eq!(layout.panels_per_channel(), 4);
    }

    #[test]
    fn test_new_rejects_empty_mapping() {
        assert_eq!(PanelLayout::new(vec![], 32, 1), Err(LayoutError::EmptyMapping));
        assert_eq!(
            PanelLayout::new(vec![vec![]], 32, 1),
            Err(LayoutError::EmptyMapping)
        );
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        // Arrange
        let cells = vec![vec![Some(1), Some(2)], vec![Some(3), Some(4), Some(5)]];

        // Act
        let result = PanelLayout::new(cells, 32, 1);

        // Assert
        assert_eq!(
            result,
            Err(LayoutError::RaggedRow {
                row: 1,
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_new_rejects_duplicate_id() {
        let cells = vec![vec![Some(1), Some(2), Some(2)]];
        assert_eq!(
            PanelLayout::new(cells, 32, 1),
            Err(LayoutError::DuplicatePanelId { id: 2 })
        );
    }

    #[test]
    fn test_new_names_missing_id() {
        // Arrange: three panels numbered 1, 2, 4 – panel 3 is missing
        let cells = vec![vec![Some(1), Some(2), Some(4)]];

        // Act
        let err = PanelLayout::new(cells, 32, 1).unwrap_err();

        // Assert
        assert_eq!(
            err,
            LayoutError::MissingPanelIds {
                panel_count: 3,
                missing: vec![3],
                out_of_range: vec![4],
            }
        );
        assert!(err.to_string().contains("missing [3]"));
    }

    #[test]
    fn test_new_rejects_zero_and_negative_ids() {
        let cells = vec![vec![Some(0), Some(-1)]];
        let err = PanelLayout::new(cells, 32, 1).unwrap_err();
        assert_eq!(
            err,
            LayoutError::MissingPanelIds {
                panel_count: 2,
                missing: vec![1, 2],
                out_of_range: vec![0, -1],
            }
        );
    }

    #[test]
    fn test_new_rejects_all_deadzones() {
        let cells = vec![vec![None, None], vec![None, None]];
        assert_eq!(PanelLayout::new(cells, 32, 1), Err(LayoutError::NoPanels));
    }

    #[test]
    fn test_new_rejects_uneven_channels() {
        assert_eq!(
            PanelLayout::new(sample_cells(), 64, 3),
            Err(LayoutError::UnevenChannels {
                panel_count: 8,
                channel_count: 3
            })
        );
    }

    #[test]
    fn test_new_rejects_zero_channels_and_zero_size() {
        assert_eq!(
            PanelLayout::new(sample_cells(), 64, 0),
            Err(LayoutError::ZeroChannels)
        );
        assert_eq!(
            PanelLayout::new(sample_cells(), 0, 1),
            Err(LayoutError::ZeroPanelSize)
        );
    }

    #[test]
    fn test_with_led_dimensions_rejects_non_square_panels() {
        assert_eq!(
            PanelLayout::with_led_dimensions(sample_cells(), 32, 64, 1),
            Err(LayoutError::NonSquarePanels {
                led_rows: 32,
                led_cols: 64
            })
        );
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    #[test]
    fn test_position_of_finds_every_panel() {
        let layout = PanelLayout::new(sample_cells(), 64, 1).unwrap();

        assert_eq!(layout.position_of(1), Some(GridCell { row: 0, col: 2 }));
        assert_eq!(layout.position_of(5), Some(GridCell { row: 2, col: 0 }));
        assert_eq!(layout.position_of(8), Some(GridCell { row: 2, col: 3 }));
        assert_eq!(layout.position_of(0), None);
        assert_eq!(layout.position_of(9), None);
    }

    #[test]
    fn test_panel_at_returns_none_for_deadzone_and_outside_grid() {
        let layout = PanelLayout::new(sample_cells(), 64, 1).unwrap();

        assert_eq!(layout.panel_at(GridCell { row: 0, col: 0 }), None);
        assert_eq!(layout.panel_at(GridCell { row: 1, col: 1 }), Some(3));
        assert_eq!(layout.panel_at(GridCell { row: 7, col: 0 }), None);
    }

    #[test]
    fn test_panel_ids_form_contiguous_sequence() {
        let layout = PanelLayout::new(sample_cells(), 64, 1).unwrap();
        let expected: BTreeSet<PanelId> = (1..=8).collect();
        assert_eq!(layout.panel_ids(), expected);
    }

    #[test]
    fn test_cells_visits_grid_in_row_major_order() {
        let layout = PanelLayout::new(sample_cells(), 64, 1).unwrap();
        let visited: Vec<_> = layout.cells().map(|(cell, _)| (cell.row, cell.col)).collect();

        assert_eq!(visited.len(), 12);
        assert_eq!(visited[0], (0, 0));
        assert_eq!(visited[4], (1, 0));
        assert_eq!(visited[11], (2, 3));
    }
}
