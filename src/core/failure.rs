use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which step of a cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorContext {
    /// The location utility failed or produced unusable output
    Location,

    /// The public address lookup failed
    Address,

    /// The sample could not be written to the sink
    Persistence,
}

impl ErrorContext {
    pub const ALL: [ErrorContext; 3] = [
        ErrorContext::Location,
        ErrorContext::Address,
        ErrorContext::Persistence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorContext::Location => "location",
            ErrorContext::Address => "address",
            ErrorContext::Persistence => "persistence",
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cycle that could not produce a [`Sample`](super::Sample).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    timestamp: DateTime<Utc>,
    error_message: String,
    error_context: ErrorContext,
}

impl FailureRecord {
    pub fn new(context: ErrorContext, message: impl Into<String>) -> Self {
        Self::new_at(context, message, Utc::now())
    }

    pub fn new_at(
        context: ErrorContext,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: at.trunc_subsecs(3),
            error_message: message.into(),
            error_context: context,
        }
    }

    /// Build a record from an error chain, keeping every `context` layer.
    pub fn from_error(context: ErrorContext, error: &anyhow::Error) -> Self {
        Self::new(context, format!("{error:#}"))
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn error_context(&self) -> ErrorContext {
        self.error_context
    }
}
