//! Parser for the textual panel mapping.
//!
//! The mapping is written in the configuration file as a small grid:
//!
//! ```text
//! ., ., 1, .
//! 2, 3, 4, .
//! 5, 6, 7, 8
//! ```
//!
//! Rows are separated by line breaks, cells by commas.  A cell is either the
//! [`EMPTY_CELL`] placeholder (no panel there) or a base-10 panel id.
//! Surrounding whitespace and blank lines are ignored.
//!
//! Parsing is a single pass producing a typed `Option<i64>` grid; all
//! cross-cell rules (row lengths, id sequence, channel split) are then
//! enforced by [`PanelLayout::new`].

use super::layout::{LayoutError, PanelLayout};

/// Placeholder token marking a deadzone cell.
pub const EMPTY_CELL: &str = ".";

/// Parses mapping text into a raw cell grid.
///
/// # Errors
///
/// Returns [`LayoutError::InvalidToken`] for a cell that is neither
/// [`EMPTY_CELL`] nor an integer, and [`LayoutError::EmptyMapping`] when the
/// text contains no rows.  Row lengths are *not* checked here.
pub fn parse_mapping(text: &str) -> Result<Vec<Vec<Option<i64>>>, LayoutError> {
    let rows = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(row, line)| {
            line.split(',')
                .map(str::trim)
                .enumerate()
                .map(|(col, token)| parse_token(row, col, token))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Err(LayoutError::EmptyMapping);
    }
    Ok(rows)
}

/// Parses mapping text and validates it into a [`PanelLayout`].
///
/// # Errors
///
/// Returns the first [`LayoutError`] encountered, parse errors first.
pub fn parse_panel_layout(
    text: &str,
    led_rows: u32,
    led_cols: u32,
    channel_count: u32,
) -> Result<PanelLayout, LayoutError> {
    let cells = parse_mapping(text)?;
    PanelLayout::with_led_dimensions(cells, led_rows, led_cols, channel_count)
}

fn parse_token(row: usize, col: usize, token: &str) -> Result<Option<i64>, LayoutError> {
    if token == EMPTY_CELL {
        return Ok(None);
    }
    token
        .parse::<i64>()
        .map(Some)
        .map_err(|_| LayoutError::InvalidToken {
            row,
            col,
            token: token.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "., ., 1, .\n2, 3, 4, .\n5, 6, 7, 8";

    #[test]
    fn test_parse_mapping_reads_placeholders_and_ids() {
        let cells = parse_mapping(SAMPLE).unwrap();

        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], vec![None, None, Some(1), None]);
        assert_eq!(cells[2], vec![Some(5), Some(6), Some(7), Some(8)]);
    }

    #[test]
    fn test_parse_mapping_ignores_blank_lines_and_indentation() {
        // TOML multi-line strings keep the trailing newline and any indentation.
        let text = "\n    1, 2\n\n    3, .\n";
        let cells = parse_mapping(text).unwrap();
        assert_eq!(cells, vec![vec![Some(1), Some(2)], vec![Some(3), None]]);
    }

    #[test]
    fn test_parse_mapping_rejects_garbage_token() {
        let err = parse_mapping("1, x\n2, 3").unwrap_err();
        assert_eq!(
            err,
            LayoutError::InvalidToken {
                row: 0,
                col: 1,
                token: "x".to_string()
            }
        );
    }

    #[test]
    fn test_parse_mapping_rejects_empty_token() {
        assert!(matches!(
            parse_mapping("1,,2"),
            Err(LayoutError::InvalidToken { col: 1, .. })
        ));
    }

    #[test]
    fn test_parse_mapping_rejects_blank_text() {
        assert_eq!(parse_mapping("  \n \n"), Err(LayoutError::EmptyMapping));
    }

    #[test]
    fn test_parse_panel_layout_catches_ragged_rows_before_geometry() {
        assert_eq!(
            parse_panel_layout("1,2\n3,4,5", 32, 32, 1),
            Err(LayoutError::RaggedRow {
                row: 1,
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_parse_panel_layout_builds_valid_layout() {
        let layout = parse_panel_layout(SAMPLE, 64, 64, 2).unwrap();
        assert_eq!(layout.panel_count(), 8);
        assert_eq!(layout.panels_per_channel(), 4);
    }

    #[test]
    fn test_parse_panel_layout_rejects_non_square_panels() {
        assert_eq!(
            parse_panel_layout(SAMPLE, 32, 64, 1),
            Err(LayoutError::NonSquarePanels {
                led_rows: 32,
                led_cols: 64
            })
        );
    }
}
