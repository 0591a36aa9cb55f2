//! Error types for scoped execution.

use crate::scope::ScopeState;
use thiserror::Error;

/// The main error type for scope execution.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// Required configuration was missing; the scope never executed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The deadline elapsed before the operation finished.
    #[error("scope deadline of {timeout_ms} ms elapsed")]
    Timeout {
        /// The configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The wrapped operation failed.
    #[error("scope operation failed: {cause}")]
    Operation {
        /// The operation's own error.
        cause: anyhow::Error,
    },

    /// A scheduled child faulted; remaining children were cancelled.
    #[error("child '{child}' faulted: {message}")]
    ChildFault {
        /// Name of the faulting child.
        child: String,
        /// The child's error message.
        message: String,
    },

    /// `execute` was called on a scope that has already run.
    #[error("scope is not idle (state: {state}); call reset() before re-executing")]
    NotIdle {
        /// The state the scope was in.
        state: ScopeState,
    },
}

impl ScopeError {
    /// Creates an operation fault from the operation's error.
    #[must_use]
    pub fn operation(cause: anyhow::Error) -> Self {
        Self::Operation { cause }
    }

    /// Creates a child fault.
    #[must_use]
    pub fn child_fault(child: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ChildFault {
            child: child.into(),
            message: message.into(),
        }
    }
}

/// Error raised when required scope configuration is missing.
///
/// Validation failures short-circuit before the operation starts, so no
/// resources exist and no cleanup runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required scope configuration: {}", missing.join(", "))]
pub struct ValidationError {
    /// Names of the required fields that were absent.
    pub missing: Vec<String>,
}

impl ValidationError {
    /// Creates a validation error from the missing field names.
    #[must_use]
    pub fn new(missing: Vec<String>) -> Self {
        Self { missing }
    }
}

/// A single resource that failed to release during the cleanup sweep.
///
/// Failures are collected and surfaced in aggregate; one bad resource
/// never blocks release of the others.
#[derive(Debug, Clone, Error)]
#[error("resource '{resource}' failed to release: {message}")]
pub struct DisposalFailure {
    /// Type name of the resource that failed.
    pub resource: String,
    /// The release error message.
    pub message: String,
}

impl DisposalFailure {
    /// Creates a new disposal failure.
    #[must_use]
    pub fn new(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            message: message.into(),
        }
    }
}
