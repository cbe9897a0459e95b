//! The fixed-rate frame loop.
//!
//! Every tick runs three phases in order: [`Scene::update`],
//! [`Scene::draw`] onto the virtual canvas, then
//! [`FrameCompositor::present`].  Ticks are paced by a
//! [`tokio::time::Interval`] with [`MissedTickBehavior::Delay`], so a slow
//! tick stretches the schedule instead of triggering a burst of catch-up
//! frames: the target rate is a soft cap.
//!
//! # Cancellation
//!
//! The loop owns no signal handling.  It observes a shared `running` flag at
//! the top of every tick and returns [`LoopExit::Cancelled`] once the flag is
//! cleared.  A tick that has started always completes.  Cleanup (closing the
//! sink, stopping the helper) is the caller's job and happens exactly once,
//! after the loop has returned.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use ledwall_core::{Canvas, PanelLayout};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::application::{
    compose_frame::{DisplaySink, FrameCompositor, ModeError, RunMode, SinkError},
    scenes::Scene,
};

/// What a readiness source has reported so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    #[default]
    Pending,
    Ready,
    /// The source went away without ever becoming ready.
    Abandoned,
}

/// Answers "has the helper process signalled it is ready?" without blocking.
pub trait Readiness: Send {
    fn state(&mut self) -> ReadyState;
}

/// Why a loop phase returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The running flag was cleared.
    Cancelled,
    /// The configured tick limit was reached.
    TickLimit,
    /// The readiness source reported ready.
    Ready,
    /// The readiness source gave up before becoming ready.
    Abandoned,
}

/// Drives a [`Scene`] and presents every frame to a [`DisplaySink`].
pub struct FrameLoop {
    canvas: Canvas,
    compositor: FrameCompositor,
    sink: Box<dyn DisplaySink>,
    running: Arc<AtomicBool>,
    period: Duration,
    max_ticks: Option<u64>,
    ticks: u64,
}

impl FrameLoop {
    /// Creates a loop running at `fps` frames per second.
    ///
    /// `fps` must be non-zero; configuration loading guarantees it.
    ///
    /// # Errors
    ///
    /// Returns [`ModeError`] if `mode` asks for an output that cannot be
    /// allocated.
    pub fn new(
        layout: &PanelLayout,
        mode: RunMode,
        sink: Box<dyn DisplaySink>,
        fps: u32,
        running: Arc<AtomicBool>,
    ) -> Result<Self, ModeError> {
        let (width, height) = layout.canvas_size();
        Ok(Self {
            canvas: Canvas::new(width, height),
            compositor: FrameCompositor::new(layout, mode)?,
            sink,
            running,
            period: Duration::from_secs(1) / fps.max(1),
            max_ticks: None,
            ticks: 0,
        })
    }

    /// Stops once `max_ticks` ticks have run in total, across the wait
    /// screen and the scene.
    pub fn with_tick_limit(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks run so far, across all phases.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn compositor(&self) -> &FrameCompositor {
        &self.compositor
    }

    /// Runs `scene` until cancelled or the tick limit is reached.
    ///
    /// # Errors
    ///
    /// Returns the first [`SinkError`]; the loop does not retry.
    pub async fn run(&mut self, scene: &mut dyn Scene) -> Result<LoopExit, SinkError> {
        info!(period_ms = self.period.as_millis() as u64, "frame loop started");
        let exit = self.drive(scene, || ReadyState::Pending).await?;
        info!(?exit, ticks = self.ticks, "frame loop stopped");
        Ok(exit)
    }

    /// Shows `scene` until `readiness` reports ready or abandoned.
    ///
    /// Returns [`LoopExit::Ready`] or [`LoopExit::Abandoned`] accordingly,
    /// or the cancellation / tick-limit exit that came first.
    pub async fn wait_until_ready(
        &mut self,
        scene: &mut dyn Scene,
        readiness: &mut dyn Readiness,
    ) -> Result<LoopExit, SinkError> {
        let exit = self.drive(scene, || readiness.state()).await?;
        debug!(?exit, "wait screen finished");
        Ok(exit)
    }

    /// Releases the display sink.
    pub fn close(&mut self) -> Result<(), SinkError> {
        self.sink.close()
    }

    async fn drive<F>(&mut self, scene: &mut dyn Scene, mut done: F) -> Result<LoopExit, SinkError>
    where
        F: FnMut() -> ReadyState,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        scene.setup(&mut self.canvas);

        loop {
            if !self.running.load(Ordering::SeqCst) {
                return Ok(LoopExit::Cancelled);
            }
            match done() {
                ReadyState::Pending => {}
                ReadyState::Ready => return Ok(LoopExit::Ready),
                ReadyState::Abandoned => return Ok(LoopExit::Abandoned),
            }
            if self.max_ticks.is_some_and(|max| self.ticks >= max) {
                return Ok(LoopExit::TickLimit);
            }

            ticker.tick().await;
            let started = Instant::now();

            scene.update();
            scene.draw(&mut self.canvas);
            self.compositor.present(&self.canvas, self.sink.as_mut())?;

            self.ticks += 1;

            let elapsed = started.elapsed();
            if elapsed > self.period {
                debug!(
                    tick = self.ticks,
                    elapsed_ms = elapsed.as_millis() as u64,
                    period_ms = self.period.as_millis() as u64,
                    "slow tick"
                );
            } else {
                trace!(tick = self.ticks, "tick");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
