//! The scope lifecycle state machine.
//!
//! One execution runs `Idle -> Validating -> Running -> (Completed |
//! Faulted | TimedOut) -> CleaningUp -> Done`. Cleanup is invoked from a
//! single exit point and runs on every path that started the operation.

use crate::cancellation::CancellationToken;
use crate::container::ObjectContainer;
use crate::errors::ScopeError;
use crate::observability::{ScopeSpanAttributes, SpanTimer};
use crate::race::{run_with_deadline, RaceOutcome};
use crate::scope::{
    ChildWork, ExecutionOutcome, ScopeConfig, ScopeOperation, ScopeReport, ScopeState,
};
use crate::sweep::CleanupSweep;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// A scope: owns one container, runs one timed operation, hands control
/// to children, then cleans up.
///
/// A scope instance covers one execution. After it reaches `Done`,
/// [`Scope::reset`] re-arms it with a fresh cancellation token.
pub struct Scope {
    config: ScopeConfig,
    container: ObjectContainer,
    children: Vec<Box<dyn ChildWork>>,
    token: Arc<CancellationToken>,
    state: ScopeState,
}

impl Scope {
    /// Creates a scope with a default-constructed container.
    #[must_use]
    pub fn new(config: ScopeConfig) -> Self {
        Self::with_container(config, ObjectContainer::new())
    }

    /// Creates a scope owning an explicit container.
    #[must_use]
    pub fn with_container(config: ScopeConfig, container: ObjectContainer) -> Self {
        Self {
            config,
            container,
            children: Vec::new(),
            token: Arc::new(CancellationToken::new()),
            state: ScopeState::Idle,
        }
    }

    /// Adds a child, builder style.
    #[must_use]
    pub fn child(mut self, child: impl ChildWork + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    /// Adds a child.
    pub fn add_child(&mut self, child: Box<dyn ChildWork>) {
        self.children.push(child);
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    /// Returns the container.
    #[must_use]
    pub fn container(&self) -> &ObjectContainer {
        &self.container
    }

    /// Mutable access to the container, for setup before execution.
    pub fn container_mut(&mut self) -> &mut ObjectContainer {
        &mut self.container
    }

    /// Returns the shared cancellation token for this execution.
    #[must_use]
    pub fn cancel_token(&self) -> Arc<CancellationToken> {
        self.token.clone()
    }

    /// Requests cancellation of the running execution.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.token.cancel(reason);
    }

    /// Re-arms a finished scope: releases anything still in the
    /// container, replaces the cancellation token, and returns to
    /// `Idle`.
    pub fn reset(&mut self) {
        if !self.container.is_empty() {
            let _ = CleanupSweep::new().run(&mut self.container);
        }
        self.token = Arc::new(CancellationToken::new());
        self.state = ScopeState::Idle;
    }

    /// Executes the scope: validate, race the operation against the
    /// deadline, schedule children on success, then sweep the container.
    ///
    /// Validation failures short-circuit before the operation starts and
    /// are returned as `Err`; every other path produces a report whose
    /// cleanup has already run.
    ///
    /// # Errors
    ///
    /// [`ScopeError::NotIdle`] if the scope has already executed, or
    /// [`ScopeError::Validation`] if a required configuration field is
    /// missing.
    pub async fn execute<O>(&mut self, op: &mut O) -> Result<ScopeReport, ScopeError>
    where
        O: ScopeOperation + ?Sized,
    {
        if self.state != ScopeState::Idle {
            return Err(ScopeError::NotIdle { state: self.state });
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = SpanTimer::start("scope.execute");

        self.state = ScopeState::Validating;
        if let Err(e) = self.config.validate() {
            self.state = ScopeState::Done;
            warn!(scope_run_id = %run_id, error = %e, "scope validation failed");
            return Err(e.into());
        }

        self.state = ScopeState::Running;
        debug!(
            scope_run_id = %run_id,
            timeout_ms = self.config.timeout_ms,
            "scope operation started"
        );

        let race_outcome = {
            let token = self.token.clone();
            let op_future = op.run(&mut self.container, token);
            run_with_deadline(op_future, self.config.timeout(), &self.token).await
        };

        let outcome = match race_outcome {
            RaceOutcome::Finished(Ok(())) => {
                self.state = ScopeState::Completed;
                debug!(
                    scope_run_id = %run_id,
                    children = self.children.len(),
                    "scope operation completed"
                );
                match self.run_children(run_id).await {
                    Ok(()) => ExecutionOutcome::Completed,
                    Err(fault) => {
                        self.state = ScopeState::Faulted;
                        ExecutionOutcome::Faulted(fault)
                    }
                }
            }
            RaceOutcome::Finished(Err(cause)) => {
                self.state = ScopeState::Faulted;
                warn!(scope_run_id = %run_id, error = %cause, "scope operation faulted");
                ExecutionOutcome::Faulted(ScopeError::operation(cause))
            }
            RaceOutcome::DeadlineElapsed => {
                self.state = ScopeState::TimedOut;
                warn!(
                    scope_run_id = %run_id,
                    reason = ?self.token.reason(),
                    "scope deadline reached"
                );
                ExecutionOutcome::TimedOut
            }
        };

        // Single exit point: every path that started the operation
        // sweeps the container exactly once.
        self.state = ScopeState::CleaningUp;
        let sweep = CleanupSweep::new().run(&mut self.container);
        self.state = ScopeState::Done;

        let finished_at = Utc::now();
        let duration_ms = timer.finish();

        let mut attrs = ScopeSpanAttributes::new(run_id.to_string())
            .with_state(self.state.to_string())
            .with_timeout_ms(self.config.timeout_ms)
            .with_duration_ms(duration_ms);
        if let Some(fault) = outcome.fault() {
            attrs = attrs.with_error(fault.to_string());
        }
        debug!(
            attributes = ?attrs.to_otel_attributes(),
            outcome = %outcome,
            "scope finished"
        );

        Ok(ScopeReport {
            scope_run_id: run_id,
            outcome,
            sweep,
            output: None,
            timeout_ms: self.config.timeout_ms,
            started_at,
            finished_at,
            duration_ms,
        })
    }

    /// Runs every child concurrently against the container.
    ///
    /// The first fault cancels the shared token; the remaining children
    /// settle cooperatively before this returns, so cleanup never races
    /// a live child.
    async fn run_children(&self, run_id: Uuid) -> Result<(), ScopeError> {
        if self.children.is_empty() {
            return Ok(());
        }

        let mut pending: FuturesUnordered<_> = self
            .children
            .iter()
            .map(|child| {
                let token = self.token.clone();
                let container = &self.container;
                async move {
                    let result = child.run(container, token).await;
                    (child.name(), result)
                }
            })
            .collect();

        let mut first_fault: Option<ScopeError> = None;
        while let Some((name, result)) = pending.next().await {
            match result {
                Ok(()) => {
                    debug!(scope_run_id = %run_id, child = name, "child completed");
                }
                Err(cause) => {
                    if first_fault.is_none() {
                        self.token.cancel(format!("child '{name}' faulted"));
                        first_fault = Some(ScopeError::child_fault(name, cause.to_string()));
                    } else {
                        warn!(
                            scope_run_id = %run_id,
                            child = name,
                            error = %cause,
                            "additional child fault after cancellation"
                        );
                    }
                }
            }
        }

        first_fault.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("state", &self.state)
            .field("children", &self.children.len())
            .field("container", &self.container)
            .finish()
    }
}
