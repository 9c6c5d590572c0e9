//! Core types for the record lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a configuration or operation record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for an execution attempt
    #[default]
    Initializing,
    /// An execution attempt is in flight
    Processing,
    /// The last attempt completed
    Succeeded,
    /// The last attempt errored or timed out
    Failed,
}

impl Phase {
    /// Check if the phase is quiescent (nothing in flight, nothing pending)
    pub fn is_quiescent(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Name as persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Processing => "Processing",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted status of a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub phase: Phase,
    /// Short, stable failure code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Human-readable failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    /// When the last attempt finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execution_time: Option<DateTime<Utc>>,
}

/// How a record kind reacts to drift once it has settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Re-applied whenever drift is detected
    Continuous,
    /// Applied once per explicit trigger; drift is ignored after success
    OneShot,
}

/// Inputs to the reconcile decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    /// Recorded fingerprint matches the desired configuration
    pub stable: bool,
    /// An explicit re-run was requested
    pub rerun: bool,
}

/// What a reconciliation pass should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Run an execution attempt
    Execute,
    /// Return to `Initializing` before attempting again
    Reset,
    /// Nothing to do
    Idle,
}
