//! Integration tests for the config → scene → compositor → sink pipeline.
//!
//! These tests drive the runtime through its public API the same way
//! `main.rs` does, with a [`MockDisplaySink`] standing in for the panel
//! driver.  They verify:
//!
//! - A configuration file yields frames with the chained geometry.
//! - Deadzone pixels on the canvas never reach the physical frame.
//! - Preview mode presents the scaled canvas instead.
//! - Cancellation stops the loop and cleanup closes the sink once.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use ledwall::{
    application::{
        compose_frame::RunMode,
        frame_loop::{FrameLoop, LoopExit},
        scenes::{build_scene, Scene, SceneKind},
    },
    infrastructure::{display::mock::MockDisplaySink, storage::config::WallConfig},
};
use ledwall_core::{AddressMap, Canvas, PanelLayout, PixelOrder, Rgb};

const CONFIG: &str = r#"
[matrix]
mapping = """
., ., 1, .
2, 3, 4, .
5, 6, 7, 8
"""
led-rows = 8
led-cols = 8
parallel = 2

[runtime]
fps = 500
"#;

const DEADZONE: Rgb = Rgb::new(255, 0, 255);

fn load_layout() -> PanelLayout {
    WallConfig::from_toml_str(CONFIG)
        .expect("valid config")
        .layout()
        .expect("valid layout")
}

/// Paints deadzones magenta and each panel in a shade of its id.
struct MarkerScene {
    layout: PanelLayout,
}

impl Scene for MarkerScene {
    fn setup(&mut self, canvas: &mut Canvas) {
        for rect in self.layout.deadzones() {
            canvas.fill_rect(rect, DEADZONE);
        }
    }

    fn update(&mut self) {}

    fn draw(&mut self, canvas: &mut Canvas) {
        for id in self.layout.panel_ids() {
            let rect = self.layout.panel_rect(id).expect("panel exists");
            canvas.fill_rect(rect, Rgb::new(id as u8 * 10, 0, 0));
        }
    }
}

// ── Physical mode ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_physical_frames_follow_chain_wiring() {
    // Arrange
    let layout = load_layout();
    let sink = MockDisplaySink::new(PixelOrder::Rgb);
    let running = Arc::new(AtomicBool::new(true));
    let mut frame_loop =
        FrameLoop::new(&layout, RunMode::Physical, Box::new(sink.clone()), 500, running)
            .unwrap()
            .with_tick_limit(2);
    let mut scene = MarkerScene {
        layout: layout.clone(),
    };

    // Act
    let exit = frame_loop.run(&mut scene).await.unwrap();

    // Assert
    assert_eq!(exit, LoopExit::TickLimit);
    assert_eq!(sink.frame_count(), 2);

    let frame = sink.last_frame().unwrap();
    assert_eq!((frame.width, frame.height), (32, 16));

    // Every destination square carries its own panel's shade.
    let map = AddressMap::new(&layout);
    for address in &map {
        let dest = address.destination;
        let offset = ((dest.y * frame.width + dest.x) * 3) as usize;
        assert_eq!(frame.bytes[offset], address.panel as u8 * 10, "panel {}", address.panel);
    }

    // No deadzone colour anywhere in the physical frame.
    assert!(!frame
        .bytes
        .chunks_exact(3)
        .any(|px| px == [DEADZONE.r, DEADZONE.g, DEADZONE.b]));
}

#[tokio::test]
async fn test_screen_test_scene_runs_against_mock_sink() {
    let layout = load_layout();
    let sink = MockDisplaySink::new(PixelOrder::Bgr);
    let running = Arc::new(AtomicBool::new(true));
    let mut frame_loop =
        FrameLoop::new(&layout, RunMode::Physical, Box::new(sink.clone()), 500, running)
            .unwrap()
            .with_tick_limit(5);
    let mut scene = build_scene(SceneKind::ScreenTest, Arc::new(layout));

    frame_loop.run(scene.as_mut()).await.unwrap();

    let frames = sink.frames();
    assert_eq!(frames.len(), 5);
    assert!(frames.iter().all(|f| f.order == PixelOrder::Bgr));
    assert!(frames.iter().all(|f| f.bytes.len() == 32 * 16 * 3));
}

// ── Preview mode ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_preview_frames_show_scaled_canvas_with_deadzones() {
    let layout = load_layout();
    let sink = MockDisplaySink::new(PixelOrder::Rgb);
    let running = Arc::new(AtomicBool::new(true));
    let mut frame_loop = FrameLoop::new(
        &layout,
        RunMode::Preview { scale: 2 },
        Box::new(sink.clone()),
        500,
        running,
    )
    .unwrap()
    .with_tick_limit(1);
    let mut scene = MarkerScene {
        layout: layout.clone(),
    };

    frame_loop.run(&mut scene).await.unwrap();

    let frame = sink.last_frame().unwrap();
    assert_eq!((frame.width, frame.height), (64, 48));
    assert_eq!(&frame.bytes[..3], &[DEADZONE.r, DEADZONE.g, DEADZONE.b]);
}

// ── Cancellation and cleanup ──────────────────────────────────────────────────

#[tokio::test]
async fn test_cancelled_loop_closes_sink_in_cleanup() {
    // Arrange
    let layout = load_layout();
    let sink = MockDisplaySink::new(PixelOrder::Rgb);
    let running = Arc::new(AtomicBool::new(true));
    let mut frame_loop = FrameLoop::new(
        &layout,
        RunMode::Physical,
        Box::new(sink.clone()),
        500,
        Arc::clone(&running),
    )
    .unwrap();
    let mut scene = build_scene(SceneKind::Blank, Arc::new(layout));

    // Act: request shutdown from another task, as the signal listener does
    let stopper = tokio::spawn({
        let running = Arc::clone(&running);
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            running.store(false, Ordering::SeqCst);
        }
    });
    let exit = frame_loop.run(scene.as_mut()).await.unwrap();
    stopper.await.unwrap();
    frame_loop.close().unwrap();

    // Assert
    assert_eq!(exit, LoopExit::Cancelled);
    assert!(sink.frame_count() >= 1);
    assert!(sink.is_closed());
}
