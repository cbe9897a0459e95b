//! What gets painted on the virtual canvas each tick.
//!
//! A [`Scene`] is the renderer seam: the frame loop calls
//! [`Scene::update`] then [`Scene::draw`] once per tick and never looks at
//! what a scene paints.  The canvas always has the full canvas size of the
//! layout (`cols * size` by `rows * size`), deadzones included.
//!
//! Built-in scenes:
//!
//! - [`ScreenTestScene`] – checks that the mapping matches the wall.
//! - [`BlankScene`] – keeps the wall dark.
//! - [`WaitScene`] – animated indicator shown while the helper starts.

use std::sync::Arc;

use ledwall_core::{Canvas, PanelId, PanelLayout, Rect, Rgb, SizeMetric};
use serde::{Deserialize, Serialize};

/// A renderer driven by the frame loop.
#[cfg_attr(test, mockall::automock)]
pub trait Scene: Send {
    /// Called once before the first tick.
    fn setup(&mut self, canvas: &mut Canvas);

    /// Advances the scene's state by one tick.
    fn update(&mut self);

    /// Paints the current state onto `canvas`.
    fn draw(&mut self, canvas: &mut Canvas);
}

/// Scene selected in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneKind {
    #[default]
    ScreenTest,
    Blank,
}

/// Builds the scene for `kind`.
pub fn build_scene(kind: SceneKind, layout: Arc<PanelLayout>) -> Box<dyn Scene> {
    match kind {
        SceneKind::ScreenTest => Box::new(ScreenTestScene::new(layout)),
        SceneKind::Blank => Box::new(BlankScene),
    }
}

// ── Screen test ───────────────────────────────────────────────────────────────

/// Pastel palette cycled through by the screen test.
pub const PALETTE: [Rgb; 6] = [
    Rgb::new(0x92, 0xC6, 0xFF),
    Rgb::new(0x97, 0xF0, 0xAA),
    Rgb::new(0xFF, 0x9F, 0x9A),
    Rgb::new(0xD0, 0xBB, 0xFF),
    Rgb::new(0xFF, 0xFE, 0xA3),
    Rgb::new(0xB0, 0xE0, 0xE6),
];

/// Ticks spent filling one panel.
pub const TICKS_PER_PANEL: u32 = 100;

const MARK: Rgb = Rgb::BLACK;

/// Colours every grid cell, crosses out deadzones, then fills one panel at a
/// time from the top so each panel's position and id can be checked.
///
/// Panels are visited in id order, so on the wall the fill travels along the
/// chain wiring.
pub struct ScreenTestScene {
    layout: Arc<PanelLayout>,
    palette_cursor: usize,
    ticks: u32,
    current: Option<(PanelId, Rgb)>,
}

impl ScreenTestScene {
    pub fn new(layout: Arc<PanelLayout>) -> Self {
        Self {
            layout,
            palette_cursor: 0,
            ticks: 0,
            current: None,
        }
    }

    /// Panel currently being filled, if the first tick has run.
    pub fn current_panel(&self) -> Option<PanelId> {
        self.current.map(|(panel, _)| panel)
    }

    /// Rows of the current panel that [`Scene::draw`] fills.
    pub fn filled_rows(&self) -> u32 {
        let size = self.layout.panel_size();
        (size * self.ticks + TICKS_PER_PANEL / 2) / TICKS_PER_PANEL
    }

    fn next_colour(&mut self) -> Rgb {
        let colour = PALETTE[self.palette_cursor % PALETTE.len()];
        self.palette_cursor += 1;
        colour
    }

    fn next_panel(&self) -> PanelId {
        match self.current {
            Some((panel, _)) if panel < self.layout.panel_count() => panel + 1,
            _ => 1,
        }
    }
}

impl Scene for ScreenTestScene {
    fn setup(&mut self, canvas: &mut Canvas) {
        let size = self.layout.panel_size();
        let cells: Vec<_> = self.layout.cells().collect();
        for (cell, panel) in cells {
            let rect = Rect::from_cell(cell, size);
            let colour = self.next_colour();
            canvas.fill_rect(rect, colour);
            match panel {
                None => draw_cross(canvas, rect, MARK),
                Some(id) => draw_tally(canvas, rect, id, MARK),
            }
        }
    }

    fn update(&mut self) {
        if self.ticks % TICKS_PER_PANEL == 0 {
            let panel = self.next_panel();
            let colour = self.next_colour();
            self.current = Some((panel, colour));
            self.ticks = 0;
        }
        self.ticks += 1;
    }

    fn draw(&mut self, canvas: &mut Canvas) {
        let Some((panel, colour)) = self.current else {
            return;
        };
        let Some(rect) = self.layout.panel_rect(panel) else {
            return;
        };

        canvas.fill_rect(rect, Rgb::BLACK);
        canvas.fill_rect(
            Rect::new(rect.x, rect.y, rect.width, self.filled_rows()),
            colour,
        );
        draw_tally(canvas, rect, panel, MARK);
    }
}

/// Two diagonals across `rect`, a few pixels thick.
fn draw_cross(canvas: &mut Canvas, rect: Rect, colour: Rgb) {
    let side = rect.width.min(rect.height);
    let thickness = (side / 16).max(1);
    for i in 0..side {
        for t in 0..thickness {
            let along = (i + t).min(side - 1);
            canvas.set(rect.x + i, rect.y + along, colour);
            canvas.set(rect.x + side - 1 - i, rect.y + along, colour);
        }
    }
}

/// `id` small squares along the top-left of `rect`, wrapping into rows.
fn draw_tally(canvas: &mut Canvas, rect: Rect, id: PanelId, colour: Rgb) {
    let dot = (rect.width / 16).max(1);
    let pitch = dot * 2;
    let per_row = (rect.width / pitch).max(1);
    for n in 0..id {
        let x = rect.x + dot + (n % per_row) * pitch;
        let y = rect.y + dot + (n / per_row) * pitch;
        canvas.fill_rect(Rect::new(x, y, dot, dot), colour);
    }
}

// ── Blank ─────────────────────────────────────────────────────────────────────

/// Keeps the whole canvas black.
pub struct BlankScene;

impl Scene for BlankScene {
    fn setup(&mut self, canvas: &mut Canvas) {
        canvas.fill(Rgb::BLACK);
    }

    fn update(&mut self) {}

    fn draw(&mut self, _canvas: &mut Canvas) {}
}

// ── Wait screen ───────────────────────────────────────────────────────────────

/// Segments in the wait indicator bar.
pub const WAIT_SEGMENTS: u32 = 10;

/// Loading bar drawn inside `area` while the helper process starts.
///
/// One more segment lights up every `fps / 6` ticks; after the last segment
/// the bar starts over.
pub struct WaitScene {
    area: Rect,
    step_ticks: u32,
    ticks: u32,
    lit: u32,
}

impl WaitScene {
    /// Wait screen centred in `area` for a loop running at `fps`.
    pub fn new(area: Rect, fps: u32) -> Self {
        Self {
            area,
            step_ticks: (fps / 6).max(1),
            ticks: 0,
            lit: 0,
        }
    }

    /// Wait screen centred in the layout's largest fully-populated rectangle,
    /// or the whole canvas when the layout has none.
    pub fn for_layout(layout: &PanelLayout, fps: u32) -> Self {
        let area = layout
            .largest_rectangle(SizeMetric::Area)
            .unwrap_or_else(|| {
                let (width, height) = layout.canvas_size();
                Rect::new(0, 0, width, height)
            });
        Self::new(area, fps)
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Number of lit segments, `1..=WAIT_SEGMENTS` once running.
    pub fn lit_segments(&self) -> u32 {
        self.lit
    }

    /// Bounding box of segment `index`, centred in the area.
    fn segment(&self, index: u32) -> Rect {
        let pitch = (self.area.width / (WAIT_SEGMENTS + 2)).max(2);
        let width = (pitch - pitch / 4).max(1);
        let height = (self.area.height / 6).max(1);
        let bar = pitch * WAIT_SEGMENTS;
        let left = self.area.x + self.area.width.saturating_sub(bar) / 2;
        let top = self.area.y + self.area.height.saturating_sub(height) / 2;
        Rect::new(left + index * pitch, top, width, height)
    }
}

impl Scene for WaitScene {
    fn setup(&mut self, canvas: &mut Canvas) {
        canvas.fill(Rgb::BLACK);
    }

    fn update(&mut self) {
        if self.ticks % self.step_ticks == 0 {
            self.lit = self.lit % WAIT_SEGMENTS + 1;
        }
        self.ticks = self.ticks.wrapping_add(1);
    }

    fn draw(&mut self, canvas: &mut Canvas) {
        canvas.fill(Rgb::BLACK);
        for index in 0..WAIT_SEGMENTS {
            let colour = if index < self.lit {
                Rgb::WHITE
            } else {
                Rgb::new(40, 40, 40)
            };
            canvas.fill_rect(self.segment(index), colour);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layout() -> Arc<PanelLayout> {
        Arc::new(
            PanelLayout::new(
                vec![
                    vec![None, None, Some(1), None],
                    vec![Some(2), Some(3), Some(4), None],
                    vec![Some(5), Some(6), Some(7), Some(8)],
                ],
                32,
                1,
            )
            .unwrap(),
        )
    }

    fn blank_canvas(layout: &PanelLayout) -> Canvas {
        let (w, h) = layout.canvas_size();
        Canvas::new(w, h)
    }

    // ── ScreenTestScene ──────────────────────────────────────────────────────

    #[test]
    fn test_screen_test_setup_colours_cells_in_palette_order() {
        // Arrange
        let layout = sample_layout();
        let mut canvas = blank_canvas(&layout);
        let mut scene = ScreenTestScene::new(Arc::clone(&layout));

        // Act
        scene.setup(&mut canvas);

        // Assert: bottom-right pixel of each cell keeps the cell colour
        assert_eq!(canvas.get(31, 20), Some(PALETTE[0]));
        assert_eq!(canvas.get(63, 20), Some(PALETTE[1]));
        assert_eq!(canvas.get(127, 60), Some(PALETTE[7 % PALETTE.len()]));
        assert_eq!(canvas.get(60, 40), Some(PALETTE[5]));
    }

    #[test]
    fn test_screen_test_setup_crosses_out_deadzones() {
        let layout = sample_layout();
        let mut canvas = blank_canvas(&layout);
        let mut scene = ScreenTestScene::new(Arc::clone(&layout));

        scene.setup(&mut canvas);

        // Cell (0, 0) is a deadzone: both diagonals are marked
        assert_eq!(canvas.get(16, 16), Some(MARK));
        assert_eq!(canvas.get(31, 0), Some(MARK));
    }

    #[test]
    fn test_screen_test_cycles_panels_every_hundred_ticks() {
        let mut scene = ScreenTestScene::new(sample_layout());

        scene.update();
        assert_eq!(scene.current_panel(), Some(1));

        for _ in 1..TICKS_PER_PANEL {
            scene.update();
        }
        assert_eq!(scene.current_panel(), Some(1));

        scene.update();
        assert_eq!(scene.current_panel(), Some(2));
    }

    #[test]
    fn test_screen_test_wraps_to_first_panel_after_last() {
        let mut scene = ScreenTestScene::new(sample_layout());
        for _ in 0..8 * TICKS_PER_PANEL + 1 {
            scene.update();
        }
        assert_eq!(scene.current_panel(), Some(1));
    }

    #[test]
    fn test_screen_test_fills_panel_progressively_from_top() {
        // Arrange
        let layout = sample_layout();
        let mut canvas = blank_canvas(&layout);
        let mut scene = ScreenTestScene::new(Arc::clone(&layout));
        scene.setup(&mut canvas);

        // Act: half-way through panel 1
        for _ in 0..50 {
            scene.update();
        }
        scene.draw(&mut canvas);

        // Assert: round(32 * 50 / 100) = 16 rows filled, the rest black
        assert_eq!(scene.filled_rows(), 16);
        let panel = layout.panel_rect(1).unwrap();
        assert_ne!(canvas.get(panel.x + 20, panel.y + 15), Some(Rgb::BLACK));
        assert_eq!(canvas.get(panel.x + 20, panel.y + 16), Some(Rgb::BLACK));
        assert_eq!(canvas.get(panel.x + 20, panel.bottom() - 1), Some(Rgb::BLACK));
    }

    #[test]
    fn test_screen_test_filled_rows_rounds_to_nearest() {
        let layout = Arc::new(PanelLayout::new(vec![vec![Some(1)]], 3, 1).unwrap());
        let mut scene = ScreenTestScene::new(layout);
        for _ in 0..50 {
            scene.update();
        }
        // 3 * 50 / 100 = 1.5 rounds up
        assert_eq!(scene.filled_rows(), 2);
    }

    #[test]
    fn test_screen_test_draw_before_update_paints_nothing() {
        let layout = sample_layout();
        let mut canvas = blank_canvas(&layout);
        let mut scene = ScreenTestScene::new(Arc::clone(&layout));

        scene.draw(&mut canvas);

        assert!(canvas.pixels().iter().all(|p| *p == Rgb::BLACK));
    }

    // ── WaitScene ────────────────────────────────────────────────────────────

    #[test]
    fn test_wait_scene_uses_largest_rectangle() {
        let scene = WaitScene::for_layout(&sample_layout(), 15);
        assert_eq!(scene.area(), Rect::new(0, 32, 96, 64));
    }

    #[test]
    fn test_wait_scene_steps_every_sixth_of_a_second() {
        let mut scene = WaitScene::new(Rect::new(0, 0, 128, 64), 12);

        scene.update();
        assert_eq!(scene.lit_segments(), 1);
        scene.update();
        assert_eq!(scene.lit_segments(), 1);
        scene.update();
        assert_eq!(scene.lit_segments(), 2);
    }

    #[test]
    fn test_wait_scene_restarts_after_last_segment() {
        let mut scene = WaitScene::new(Rect::new(0, 0, 128, 64), 6);
        for _ in 0..WAIT_SEGMENTS + 1 {
            scene.update();
        }
        assert_eq!(scene.lit_segments(), 1);
    }

    #[test]
    fn test_wait_scene_draws_only_inside_area() {
        // Arrange
        let area = Rect::new(32, 32, 96, 32);
        let mut canvas = Canvas::new(160, 96);
        let mut scene = WaitScene::new(area, 15);

        // Act
        scene.update();
        scene.draw(&mut canvas);

        // Assert
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if !area.contains(x, y) {
                    assert_eq!(canvas.get(x, y), Some(Rgb::BLACK), "pixel ({x}, {y})");
                }
            }
        }
        assert!(canvas.pixels().contains(&Rgb::WHITE));
    }

    #[test]
    fn test_build_scene_blank_keeps_canvas_black() {
        let layout = sample_layout();
        let mut canvas = blank_canvas(&layout);
        canvas.fill(Rgb::WHITE);
        let mut scene = build_scene(SceneKind::Blank, layout);

        scene.setup(&mut canvas);
        scene.update();
        scene.draw(&mut canvas);

        assert!(canvas.pixels().iter().all(|p| *p == Rgb::BLACK));
    }
}
