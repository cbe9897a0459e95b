//! Integration tests for the helper → wait screen → scene startup sequence.
//!
//! A `sh -c` script stands in for the helper process and a
//! [`MockDisplaySink`] for the panel driver.  They verify:
//!
//! - A helper that prints its marker hands over to the scene.
//! - A helper that exits without the marker fails startup.
//! - A helper that cannot be started fails startup without a process.
//! - The tick limit covers the wait screen and the scene together.

#![cfg(unix)]

use std::{
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};

use ledwall::{
    application::{
        compose_frame::RunMode,
        frame_loop::{FrameLoop, LoopExit, ReadyState, Readiness},
    },
    infrastructure::{display::mock::MockDisplaySink, storage::config::WallConfig},
    runtime::{release, run_wall, RunError},
};
use ledwall_core::PixelOrder;

const GRACE: Duration = Duration::from_secs(5);

fn config(helper_script: Option<&str>) -> WallConfig {
    let mut text = String::from(
        r#"
[matrix]
mapping = """
1, 2
., 3
"""
led-rows = 4
led-cols = 4

[runtime]
fps = 1000
scene = "blank"
"#,
    );
    if let Some(script) = helper_script {
        text.push_str(&format!(
            "\n[helper]\ncommand = \"sh\"\nargs = [\"-c\", \"{script}\"]\n"
        ));
    }
    WallConfig::from_toml_str(&text).expect("valid config")
}

fn make_loop(config: &WallConfig, sink: &MockDisplaySink, ticks: u64) -> FrameLoop {
    let layout = config.layout().unwrap();
    FrameLoop::new(
        &layout,
        RunMode::Physical,
        Box::new(sink.clone()),
        config.runtime.fps,
        Arc::new(AtomicBool::new(true)),
    )
    .unwrap()
    .with_tick_limit(ticks)
}

#[tokio::test]
async fn test_ready_helper_hands_over_to_scene() {
    // Arrange
    let config = config(Some("echo booting; echo 'info: Listening on 5000'; sleep 30"));
    let sink = MockDisplaySink::new(PixelOrder::Rgb);
    let mut frame_loop = make_loop(&config, &sink, 1_500);
    let layout = Arc::new(config.layout().unwrap());

    // Act
    let outcome = run_wall(&mut frame_loop, &config, layout).await;

    // Assert
    assert!(matches!(outcome.result, Ok(LoopExit::TickLimit)));
    let helper = outcome.helper.expect("helper is handed back");
    assert_eq!(helper.readiness().state(), ReadyState::Ready);
    assert_eq!(frame_loop.ticks(), 1_500);
    assert_eq!(sink.frame_count(), 1_500);

    release(Some(helper), &mut frame_loop, GRACE).await;
    assert!(sink.is_closed());
}

#[tokio::test]
async fn test_helper_exiting_before_ready_fails_startup() {
    // Arrange
    let config = config(Some("echo booting"));
    let sink = MockDisplaySink::new(PixelOrder::Rgb);
    let mut frame_loop = make_loop(&config, &sink, 5_000);
    let layout = Arc::new(config.layout().unwrap());

    // Act
    let outcome = run_wall(&mut frame_loop, &config, layout).await;

    // Assert
    match &outcome.result {
        Err(RunError::HelperExited { command }) => assert_eq!(command, "sh"),
        other => panic!("expected HelperExited, got {other:?}"),
    }
    assert!(frame_loop.ticks() < 5_000);

    release(outcome.helper, &mut frame_loop, GRACE).await;
    assert!(sink.is_closed());
}

#[tokio::test]
async fn test_unstartable_helper_fails_without_process() {
    let mut config = config(Some("true"));
    if let Some(helper) = config.helper.as_mut() {
        helper.command = "/nonexistent/ledwall-helper".to_string();
    }
    let sink = MockDisplaySink::new(PixelOrder::Rgb);
    let mut frame_loop = make_loop(&config, &sink, 10);
    let layout = Arc::new(config.layout().unwrap());

    let outcome = run_wall(&mut frame_loop, &config, layout).await;

    assert!(matches!(outcome.result, Err(RunError::Helper(_))));
    assert!(outcome.helper.is_none());
    assert_eq!(sink.frame_count(), 0);
}

#[tokio::test]
async fn test_without_helper_scene_runs_to_limit() {
    let config = config(None);
    let sink = MockDisplaySink::new(PixelOrder::Rgb);
    let mut frame_loop = make_loop(&config, &sink, 3);
    let layout = Arc::new(config.layout().unwrap());

    let outcome = run_wall(&mut frame_loop, &config, layout).await;
    release(outcome.helper, &mut frame_loop, GRACE).await;

    assert!(matches!(outcome.result, Ok(LoopExit::TickLimit)));
    assert_eq!(sink.frame_count(), 3);
    assert!(sink.is_closed());
}
