//! Helper process supervision.
//!
//! # What is the helper? (for beginners)
//!
//! Some walls run a companion program next to the renderer, for example a
//! small web server that turns phones into gamepads.  The runtime starts it,
//! shows a wait screen, and switches to the real scene once the helper prints
//! its readiness marker (by default `info: Listening on 5000`).
//!
//! # Threads of control
//!
//! - A reader task owns the helper's stdout.  It keeps the last few lines in
//!   a [`LineRing`], publishes a [`ReadyState`] through a `tokio::sync::watch`
//!   channel, and returns the ring when the stream closes.  Output is read as
//!   bytes and decoded lossily, so a stray non-UTF-8 line never stops the
//!   reader.  A stream that closes before the marker was seen publishes
//!   [`ReadyState::Abandoned`].
//! - The frame loop polls [`HelperReadiness`] once per tick and never blocks.
//!
//! # Shutdown
//!
//! The helper is spawned as the leader of its own process group.  Shutdown
//! sends `SIGTERM` to the whole group (helpers often fork workers), waits a
//! bounded time, then kills the leader if it is still alive.

pub mod ring;

use std::{process::Stdio, time::Duration};

use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, Command},
    sync::watch,
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, info, warn};

use crate::{
    application::frame_loop::{ReadyState, Readiness},
    infrastructure::storage::config::HelperConfig,
};

pub use ring::LineRing;

/// Error type for helper process management.
#[derive(Debug, Error)]
pub enum HelperError {
    /// The helper executable could not be started.
    #[error("failed to start helper `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The child was spawned without a stdout pipe.
    #[error("helper stdout is not captured")]
    MissingStdout,

    /// Signalling or killing the helper failed.
    #[error("failed to terminate helper: {0}")]
    Terminate(#[source] std::io::Error),

    /// Waiting for the helper to exit failed.
    #[error("failed to reap helper: {0}")]
    Wait(#[source] std::io::Error),
}

/// Non-blocking view of the helper's readiness.
#[derive(Debug, Clone)]
pub struct HelperReadiness {
    rx: watch::Receiver<ReadyState>,
}

impl Readiness for HelperReadiness {
    fn state(&mut self) -> ReadyState {
        *self.rx.borrow()
    }
}

/// A running helper process and its output reader.
#[derive(Debug)]
pub struct HelperProcess {
    command: String,
    child: Child,
    ready: watch::Receiver<ReadyState>,
    reader: JoinHandle<LineRing>,
}

impl HelperProcess {
    /// Starts the helper described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HelperError::Spawn`] if the executable cannot be started.
    /// A child that was started but is unusable is killed before returning.
    pub fn spawn(config: &HelperConfig) -> Result<Self, HelperError> {
        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| HelperError::Spawn {
            command: config.command.clone(),
            source,
        })?;

        let Some(stdout) = child.stdout.take() else {
            // Best-effort release; the error below is what matters.
            let _ = child.start_kill();
            return Err(HelperError::MissingStdout);
        };

        let (ready, reader) =
            spawn_reader(stdout, config.ready_marker.clone(), config.ring_capacity);

        info!(
            command = %config.command,
            pid = child.id(),
            marker = %config.ready_marker,
            "helper started"
        );

        Ok(Self {
            command: config.command.clone(),
            child,
            ready,
            reader,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn readiness(&self) -> HelperReadiness {
        HelperReadiness {
            rx: self.ready.clone(),
        }
    }

    /// Terminates the helper's process group and reaps the helper.
    ///
    /// Returns the helper's last output lines when the reader finished in
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`HelperError::Terminate`] or [`HelperError::Wait`] if the
    /// process could not be stopped or reaped.
    pub async fn shutdown(mut self, grace: Duration) -> Result<Option<LineRing>, HelperError> {
        self.signal_group()?;

        match timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status.map_err(HelperError::Wait)?;
                info!(command = %self.command, %status, "helper exited");
            }
            Err(_) => {
                warn!(command = %self.command, "helper ignored SIGTERM, killing it");
                self.child.start_kill().map_err(HelperError::Terminate)?;
                self.child.wait().await.map_err(HelperError::Wait)?;
            }
        }

        match timeout(grace, &mut self.reader).await {
            Ok(Ok(ring)) => Ok(Some(ring)),
            Ok(Err(e)) => {
                warn!(error = %e, "helper output reader failed");
                Ok(None)
            }
            Err(_) => {
                // A grandchild outside the group may still hold the pipe open.
                self.reader.abort();
                Ok(None)
            }
        }
    }

    #[cfg(unix)]
    fn signal_group(&mut self) -> Result<(), HelperError> {
        let Some(pid) = self.child.id() else {
            // Already reaped.
            return Ok(());
        };
        let pgid = libc::pid_t::try_from(pid)
            .map_err(|e| HelperError::Terminate(std::io::Error::other(e)))?;

        // SAFETY: killpg only sends a signal; it has no memory-safety
        // preconditions.  The group id is the helper's own pid because it was
        // spawned with process_group(0).
        let rc = unsafe { libc::killpg(pgid, libc::SIGTERM) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ESRCH) {
                return Err(HelperError::Terminate(err));
            }
        }
        debug!(pgid, "sent SIGTERM to helper process group");
        Ok(())
    }

    #[cfg(not(unix))]
    fn signal_group(&mut self) -> Result<(), HelperError> {
        self.child.start_kill().map_err(HelperError::Terminate)
    }
}

/// Spawns the reader task for `stream`.
///
/// The returned receiver moves to [`ReadyState::Ready`] the first time a line
/// containing `marker` is read and stays there.  If the stream ends first it
/// moves to [`ReadyState::Abandoned`].  The task finishes at end of stream
/// and yields the last `capacity` lines.
pub fn spawn_reader<R>(
    stream: R,
    marker: String,
    capacity: usize,
) -> (watch::Receiver<ReadyState>, JoinHandle<LineRing>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = watch::channel(ReadyState::Pending);
    let handle = tokio::spawn(read_lines(stream, marker, LineRing::new(capacity), tx));
    (rx, handle)
}

async fn read_lines<R>(
    stream: R,
    marker: String,
    mut ring: LineRing,
    ready: watch::Sender<ReadyState>,
) -> LineRing
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                if *ready.borrow() == ReadyState::Pending && line.contains(&marker) {
                    info!("helper is ready");
                    ready.send_replace(ReadyState::Ready);
                }
                ring.push(line.to_string());
            }
            Err(e) => {
                warn!(error = %e, "error reading helper output");
                break;
            }
        }
    }
    if *ready.borrow() == ReadyState::Pending {
        warn!("helper output closed before it reported ready");
        ready.send_replace(ReadyState::Abandoned);
    }
    debug!(lines = ring.len(), "helper output closed");
    ring
}

// ── Tests ─────────────────────────────────────────────────────────────────────
