//! Cleanup sweep over a scope's container.

use crate::container::ObjectContainer;
use crate::errors::DisposalFailure;
use tracing::{debug, warn};

/// Releases every disposable member of a container, then empties it.
///
/// The sweep is best-effort: a failing member is recorded and the sweep
/// moves on to the next one. Sweeping an already-emptied container is a
/// no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupSweep;

impl CleanupSweep {
    /// Creates a new sweep.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs the sweep: releases disposable members in insertion order,
    /// collects failures, and clears the container.
    pub fn run(&self, container: &mut ObjectContainer) -> SweepReport {
        let total = container.len();
        let mut attempted = 0;
        let mut failures = Vec::new();

        for slot in container.slots_mut() {
            let resource = slot.type_name();
            if let Some(disposable) = slot.as_disposable_mut() {
                attempted += 1;
                if let Err(e) = disposable.release() {
                    warn!(resource, error = %e, "resource failed to release");
                    failures.push(DisposalFailure::new(resource, e.to_string()));
                }
            }
        }

        container.clear();
        debug!(members = total, attempted, failed = failures.len(), "cleanup sweep finished");

        SweepReport {
            members: total,
            attempted,
            failures,
        }
    }
}

/// The result of one cleanup sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Members present in the container when the sweep started.
    pub members: usize,
    /// Members whose release operation was attempted.
    pub attempted: usize,
    /// Members whose release operation failed.
    pub failures: Vec<DisposalFailure>,
}

impl SweepReport {
    /// Returns the number of members released without error.
    #[must_use]
    pub fn released(&self) -> usize {
        self.attempted - self.failures.len()
    }

    /// Returns true if every attempted release succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
