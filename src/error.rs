//! Error types shared across the probe.
//!
//! Per-cycle failures travel as `anyhow::Error` so every step can attach
//! context; the enums here exist for the cases callers need to match on.

use std::time::Duration;
use thiserror::Error;

/// Conditions that stop the process before the first cycle.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("required setting {0} is not set")]
    MissingSetting(&'static str),

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("could not resolve device identifier: {0}")]
    DeviceIdUnavailable(String),
}

/// Ways an external reading can fail. All of them mean "source failed"
/// to the sampler; the variant only shapes the message.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to launch {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed with exit code {code}: {stderr}")]
    ExitStatus {
        command: String,
        code: String,
        stderr: String,
    },

    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    #[error("{what} timed out after {after:?}")]
    Timeout { what: &'static str, after: Duration },

    #[error("request to {endpoint} failed: {reason}")]
    Http { endpoint: String, reason: String },

    #[error("{0} returned an empty response")]
    EmptyResponse(String),
}
