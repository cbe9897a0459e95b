//! Host identity check for physical mode.
//!
//! Driving the panels from a development machine would write a raw frame
//! stream into a terminal, so physical mode only starts on a host whose name
//! is listed in `runtime.allowed-hosts`.

use thiserror::Error;

/// Error type for startup environment checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvironmentError {
    /// Physical mode was requested on a host that is not a wall controller.
    #[error("host {host:?} is not a wall controller (allowed: {allowed:?}); use --demo to preview on this machine")]
    UnrecognizedHost { host: String, allowed: Vec<String> },
}

/// Returns the machine's host name.
///
/// Reads the kernel's host name on Linux, then falls back to `HOSTNAME` and
/// finally to `"unknown"`.
pub fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|name| name.trim().to_string())
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Checks that `host` is one of `allowed`.
///
/// # Errors
///
/// Returns [`EnvironmentError::UnrecognizedHost`] otherwise.
pub fn check_host(host: &str, allowed: &[String]) -> Result<(), EnvironmentError> {
    if allowed.iter().any(|name| name == host) {
        Ok(())
    } else {
        Err(EnvironmentError::UnrecognizedHost {
            host: host.to_string(),
            allowed: allowed.to_vec(),
        })
    }
}
