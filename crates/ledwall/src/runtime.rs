//! Startup and shutdown sequence around the frame loop.
//!
//! [`run_wall`] starts the configured helper, shows the wait screen until the
//! helper is ready, then runs the configured scene.  The helper is always
//! handed back in [`WallRun`] so that [`release`] can stop it, whatever the
//! outcome was.

use std::{sync::Arc, time::Duration};

use ledwall_core::PanelLayout;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    application::{
        compose_frame::SinkError,
        frame_loop::{FrameLoop, LoopExit},
        scenes::{build_scene, WaitScene},
    },
    infrastructure::{
        helper::{HelperError, HelperProcess},
        storage::config::WallConfig,
    },
};

/// Error type for a wall run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Helper(#[from] HelperError),

    /// The helper's output closed before it printed its readiness marker.
    #[error("helper `{command}` exited before reporting ready")]
    HelperExited { command: String },

    #[error("frame loop failed: {0}")]
    Sink(#[from] SinkError),
}

/// Outcome of [`run_wall`] plus the helper that still needs stopping.
#[derive(Debug)]
pub struct WallRun {
    pub helper: Option<HelperProcess>,
    pub result: Result<LoopExit, RunError>,
}

/// Starts the helper (if any), shows the wait screen, then runs the scene.
pub async fn run_wall(
    frame_loop: &mut FrameLoop,
    config: &WallConfig,
    layout: Arc<PanelLayout>,
) -> WallRun {
    let helper = match &config.helper {
        Some(helper_config) => match HelperProcess::spawn(helper_config) {
            Ok(helper) => Some(helper),
            Err(e) => {
                return WallRun {
                    helper: None,
                    result: Err(e.into()),
                }
            }
        },
        None => None,
    };

    let result = show(frame_loop, config, layout, helper.as_ref()).await;
    WallRun { helper, result }
}

async fn show(
    frame_loop: &mut FrameLoop,
    config: &WallConfig,
    layout: Arc<PanelLayout>,
    helper: Option<&HelperProcess>,
) -> Result<LoopExit, RunError> {
    if let Some(process) = helper {
        let mut wait = WaitScene::for_layout(&layout, config.runtime.fps);
        let mut readiness = process.readiness();
        match frame_loop.wait_until_ready(&mut wait, &mut readiness).await? {
            LoopExit::Ready => {}
            LoopExit::Abandoned => {
                return Err(RunError::HelperExited {
                    command: process.command().to_string(),
                })
            }
            exit => return Ok(exit),
        }
    }

    let mut scene = build_scene(config.runtime.scene, layout);
    Ok(frame_loop.run(scene.as_mut()).await?)
}

/// Stops the helper, then closes the display sink.  Runs once, at exit.
///
/// Failures are logged; there is nothing left to recover at this point.
pub async fn release(helper: Option<HelperProcess>, frame_loop: &mut FrameLoop, grace: Duration) {
    if let Some(helper) = helper {
        match helper.shutdown(grace).await {
            Ok(Some(ring)) => {
                for line in ring.iter() {
                    debug!(target: "ledwall::helper", "{line}");
                }
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "failed to stop helper"),
        }
    }
    if let Err(e) = frame_loop.close() {
        warn!(error = %e, "failed to close display sink");
    }
}
