//! Scope states, execution outcomes, and the execution report.

use crate::errors::{DisposalFailure, ScopeError};
use crate::sweep::SweepReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The lifecycle state of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeState {
    /// Ready to execute.
    Idle,
    /// Required configuration is being checked.
    Validating,
    /// The operation is racing its deadline.
    Running,
    /// The operation finished in time; children may be running.
    Completed,
    /// The operation or a child failed.
    Faulted,
    /// The deadline elapsed first.
    TimedOut,
    /// The cleanup sweep is running.
    CleaningUp,
    /// Execution finished; reset before executing again.
    Done,
}

impl Default for ScopeState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for ScopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Faulted => write!(f, "faulted"),
            Self::TimedOut => write!(f, "timed_out"),
            Self::CleaningUp => write!(f, "cleaning_up"),
            Self::Done => write!(f, "done"),
        }
    }
}

impl ScopeState {
    /// Returns true if the state is terminal for one execution.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// The tagged outcome of one scope execution. Exactly one is produced
/// per execution.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// The operation and all children finished without error.
    Completed,
    /// The operation or a child failed.
    Faulted(ScopeError),
    /// The deadline elapsed (or the scope was cancelled) first.
    TimedOut,
}

impl ExecutionOutcome {
    /// Returns true for a completed execution.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true for a faulted execution.
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted(_))
    }

    /// Returns true for a timed-out execution.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    /// Returns the fault, if the execution faulted.
    #[must_use]
    pub fn fault(&self) -> Option<&ScopeError> {
        match self {
            Self::Faulted(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Faulted(e) => write!(f, "faulted: {e}"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// The report produced by one scope execution.
#[derive(Debug)]
pub struct ScopeReport {
    /// Unique id of this execution, shared with its log records.
    pub scope_run_id: Uuid,
    /// The execution outcome.
    pub outcome: ExecutionOutcome,
    /// What the cleanup sweep did.
    pub sweep: SweepReport,
    /// Declared output slot. Completion sets it to its default empty
    /// value; producing a real output is an external concern.
    pub output: Option<serde_json::Value>,
    /// The deadline the execution ran under, in milliseconds.
    pub timeout_ms: u64,
    /// When execution started (UTC).
    pub started_at: DateTime<Utc>,
    /// When execution finished, cleanup included (UTC).
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

impl ScopeReport {
    /// Returns the resources that failed to release during cleanup.
    #[must_use]
    pub fn disposal_failures(&self) -> &[DisposalFailure] {
        &self.sweep.failures
    }

    /// Converts the outcome into a `Result`, consuming the report.
    ///
    /// A timed-out execution becomes [`ScopeError::Timeout`] carrying
    /// the deadline it ran under.
    pub fn into_result(self) -> Result<(), ScopeError> {
        match self.outcome {
            ExecutionOutcome::Completed => Ok(()),
            ExecutionOutcome::Faulted(e) => Err(e),
            ExecutionOutcome::TimedOut => Err(ScopeError::Timeout {
                timeout_ms: self.timeout_ms,
            }),
        }
    }
}
