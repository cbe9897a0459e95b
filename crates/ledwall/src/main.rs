//! LED wall runtime — entry point.
//!
//! Drives a wall of chained LED panels from one virtual canvas.  The panel
//! arrangement comes from a TOML configuration file; every frame the canvas
//! is cut into panel squares and rearranged into the chained frame the panel
//! driver expects.
//!
//! # Usage
//!
//! ```text
//! ledwall <CONFIG> [OPTIONS]
//!
//! Options:
//!   --demo[=N]          Preview mode, canvas scaled by N [default: 1]
//!   --output <PATH>     Raw frame stream (physical) or PPM snapshot (preview)
//!   --frames <N>        Stop after N frames
//!   --skip-host-check   Drive the panels from any host
//! ```
//!
//! Logs go to stderr; in physical mode stdout carries the frame stream
//! unless `--output` names a FIFO or file.  Built with the `hardware`
//! feature, physical mode without `--output` drives the panels directly.
//!
//! # What happens at startup
//!
//! 1. CLI arguments are parsed with `clap`.
//! 2. The configuration file is loaded and the panel layout validated.  Any
//!    error aborts here.
//! 3. `tracing_subscriber` is initialised from `RUST_LOG`, falling back to
//!    the configured `log-level`.
//! 4. Physical mode checks the host name against `allowed-hosts`.
//! 5. The display sink is opened and a signal listener is spawned; it clears
//!    a shared `AtomicBool` on Ctrl+C or SIGTERM.
//! 6. If a helper is configured it is started and a wait screen runs until it
//!    reports ready.
//! 7. The configured scene runs until the flag is cleared, then the helper
//!    and the sink are released exactly once.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use ledwall::{
    application::{
        compose_frame::{DisplaySink, RunMode, MAX_PREVIEW_SCALE},
        frame_loop::FrameLoop,
    },
    infrastructure::{
        display::{ppm::PpmSnapshotSink, stream::RawStreamSink},
        host::{check_host, hostname},
        storage::config::{load_config, WallConfig},
    },
    runtime::{release, run_wall},
};
use ledwall_core::{AddressMap, PanelLayout, SizeMetric};

/// How long the helper gets to exit after SIGTERM.
const HELPER_GRACE: Duration = Duration::from_secs(3);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Drives chained LED panels from a single virtual canvas.
#[derive(Debug, Parser)]
#[command(name = "ledwall", version)]
struct Cli {
    /// Path to the wall's TOML configuration file.
    #[arg(value_parser = existing_file)]
    config: PathBuf,

    /// Preview on this machine instead of driving the panels.
    ///
    /// `--demo` alone scales the canvas by 1; `--demo=3` by 3 (at most 16).
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "1",
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PREVIEW_SCALE))
    )]
    demo: Option<u32>,

    /// Physical mode: file or FIFO for the raw frame stream [default: stdout].
    /// Preview mode: PPM snapshot path [default: preview.ppm].
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    frames: Option<u64>,

    /// Allow physical mode on hosts not listed in `allowed-hosts`.
    #[arg(long, env = "LEDWALL_SKIP_HOST_CHECK")]
    skip_host_check: bool,
}

impl Cli {
    fn run_mode(&self) -> RunMode {
        match self.demo {
            Some(scale) => RunMode::Preview { scale },
            None => RunMode::Physical,
        }
    }
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("{value} should be a path to the config file"))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // Logs go to stderr: stdout may be the frame stream.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.runtime.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let layout = Arc::new(config.layout()?);
    let mode = cli.run_mode();
    info!(
        config = %cli.config.display(),
        rows = layout.rows(),
        cols = layout.cols(),
        panels = layout.panel_count(),
        channels = layout.channel_count(),
        ?mode,
        "ledwall starting"
    );

    // ── Environment check ─────────────────────────────────────────────────────
    if mode == RunMode::Physical {
        if cli.skip_host_check {
            warn!("host check skipped");
        } else {
            check_host(&hostname(), &config.runtime.allowed_hosts)?;
        }
        info!("{}", chain_banner(&layout));
    }
    match layout.largest_rectangle(SizeMetric::Area) {
        Some(rect) => debug!(?rect, "largest fully populated rectangle"),
        None => debug!("layout has no fully populated rectangle"),
    }

    // ── Display sink ──────────────────────────────────────────────────────────
    let sink = open_sink(&cli, &config, &layout, mode)?;

    // ── Cancellation ──────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    spawn_signal_listener(Arc::clone(&running));

    let mut frame_loop = FrameLoop::new(&layout, mode, sink, config.runtime.fps, running)?;
    if let Some(frames) = cli.frames {
        frame_loop = frame_loop.with_tick_limit(frames);
    }

    let outcome = run_wall(&mut frame_loop, &config, layout).await;

    // ── Cleanup (runs once) ───────────────────────────────────────────────────
    release(outcome.helper, &mut frame_loop, HELPER_GRACE).await;

    info!(frames = frame_loop.ticks(), "ledwall stopped");
    let exit = outcome.result?;
    debug!(?exit, "run finished");
    Ok(())
}

fn open_sink(
    cli: &Cli,
    config: &WallConfig,
    layout: &PanelLayout,
    mode: RunMode,
) -> anyhow::Result<Box<dyn DisplaySink>> {
    let sink: Box<dyn DisplaySink> = match mode {
        RunMode::Physical => {
            let order = config.runtime.pixel_order;
            match &cli.output {
                Some(path) => Box::new(
                    RawStreamSink::to_path(path, AddressMap::new(layout).physical_size(), order)
                        .context("failed to open frame stream")?,
                ),
                #[cfg(feature = "hardware")]
                None => {
                    use ledwall::infrastructure::display::matrix::{MatrixGeometry, MatrixSink};
                    Box::new(
                        MatrixSink::open(MatrixGeometry::for_layout(layout), order)
                            .context("failed to open rgb matrix")?,
                    )
                }
                #[cfg(not(feature = "hardware"))]
                None => Box::new(RawStreamSink::to_stdout(
                    AddressMap::new(layout).physical_size(),
                    order,
                )),
            }
        }
        RunMode::Preview { .. } => {
            let path = cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from("preview.ppm"));
            info!(path = %path.display(), "writing preview snapshots");
            Box::new(PpmSnapshotSink::new(path))
        }
    };
    Ok(sink)
}

/// `"2 channel(s) of [4*64=256 LED] X [64 LED]"`.
fn chain_banner(layout: &PanelLayout) -> String {
    let size = layout.panel_size();
    let per_chain = layout.panels_per_channel();
    format!(
        "{} channel(s) of [{}*{}={} LED] X [{} LED]",
        layout.channel_count(),
        per_chain,
        size,
        per_chain * size,
        size
    )
}

// ── Signal handling ───────────────────────────────────────────────────────────

/// Clears `running` on the first Ctrl+C or SIGTERM.  Cleanup is left to the
/// frame loop's caller.
fn spawn_signal_listener(running: Arc<AtomicBool>) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown requested");
        running.store(false, Ordering::SeqCst);
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
