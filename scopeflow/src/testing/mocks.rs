//! Mock resources, operations, and children.

use crate::cancellation::CancellationToken;
use crate::container::{Disposable, ObjectContainer};
use crate::scope::{ChildWork, ScopeOperation};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A shared counter for observing a double after it moved into a scope.
#[derive(Debug, Clone, Default)]
pub struct CountProbe(Arc<AtomicUsize>);

impl CountProbe {
    /// Creates a probe at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current count.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A disposable resource that records its releases.
#[derive(Debug)]
pub struct TrackingResource {
    label: String,
    releases: CountProbe,
    fail_with: Option<String>,
}

impl TrackingResource {
    /// Creates a resource whose release succeeds.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            releases: CountProbe::new(),
            fail_with: None,
        }
    }

    /// Creates a resource whose release fails with the given message.
    #[must_use]
    pub fn failing(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            releases: CountProbe::new(),
            fail_with: Some(message.into()),
        }
    }

    /// Returns a probe counting release attempts.
    #[must_use]
    pub fn release_probe(&self) -> CountProbe {
        self.releases.clone()
    }

    /// Returns the resource label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Disposable for TrackingResource {
    fn release(&mut self) -> anyhow::Result<()> {
        self.releases.increment();
        match &self.fail_with {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        }
    }
}

/// An operation that registers resources into the container, then
/// optionally fails.
#[derive(Debug, Default)]
pub struct RegisteringOperation {
    resources: Vec<TrackingResource>,
    fail_with: Option<String>,
}

impl RegisteringOperation {
    /// Creates an operation registering the given resources.
    #[must_use]
    pub fn new(resources: Vec<TrackingResource>) -> Self {
        Self {
            resources,
            fail_with: None,
        }
    }

    /// Makes the operation fail after registering its resources.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }
}

#[async_trait]
impl ScopeOperation for RegisteringOperation {
    async fn run(
        &mut self,
        container: &mut ObjectContainer,
        _token: Arc<CancellationToken>,
    ) -> anyhow::Result<()> {
        for resource in self.resources.drain(..) {
            container.add_disposable(resource);
        }
        match &self.fail_with {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        }
    }
}

/// An operation that takes time before succeeding.
#[derive(Debug)]
pub struct SlowOperation {
    delay: Duration,
}

impl SlowOperation {
    /// Creates an operation sleeping for the given delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates an operation sleeping for `ms` milliseconds.
    #[must_use]
    pub fn with_delay_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl ScopeOperation for SlowOperation {
    async fn run(
        &mut self,
        _container: &mut ObjectContainer,
        _token: Arc<CancellationToken>,
    ) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// An operation that always fails.
#[derive(Debug)]
pub struct FailingOperation {
    message: String,
}

impl FailingOperation {
    /// Creates a failing operation.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ScopeOperation for FailingOperation {
    async fn run(
        &mut self,
        _container: &mut ObjectContainer,
        _token: Arc<CancellationToken>,
    ) -> anyhow::Result<()> {
        anyhow::bail!("{}", self.message)
    }
}

/// A child that records its runs and optionally fails.
#[derive(Debug)]
pub struct RecordingChild {
    name: String,
    runs: CountProbe,
    fail_with: Option<String>,
}

impl RecordingChild {
    /// Creates a child that succeeds.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs: CountProbe::new(),
            fail_with: None,
        }
    }

    /// Creates a child that fails with the given message.
    #[must_use]
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs: CountProbe::new(),
            fail_with: Some(message.into()),
        }
    }

    /// Returns a probe counting runs.
    #[must_use]
    pub fn run_probe(&self) -> CountProbe {
        self.runs.clone()
    }
}

#[async_trait]
impl ChildWork for RecordingChild {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        _container: &ObjectContainer,
        _token: Arc<CancellationToken>,
    ) -> anyhow::Result<()> {
        self.runs.increment();
        match &self.fail_with {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        }
    }
}

/// A child that waits out a delay unless the token cancels it first.
#[derive(Debug)]
pub struct SlowChild {
    name: String,
    delay: Duration,
    completions: CountProbe,
    cancellations: CountProbe,
}

impl SlowChild {
    /// Creates a child sleeping for the given delay.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
            completions: CountProbe::new(),
            cancellations: CountProbe::new(),
        }
    }

    /// Returns a probe counting undisturbed completions.
    #[must_use]
    pub fn completion_probe(&self) -> CountProbe {
        self.completions.clone()
    }

    /// Returns a probe counting observed cancellations.
    #[must_use]
    pub fn cancellation_probe(&self) -> CountProbe {
        self.cancellations.clone()
    }
}

#[async_trait]
impl ChildWork for SlowChild {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        _container: &ObjectContainer,
        token: Arc<CancellationToken>,
    ) -> anyhow::Result<()> {
        tokio::select! {
            () = token.cancelled() => {
                self.cancellations.increment();
            }
            () = tokio::time::sleep(self.delay) => {
                self.completions.increment();
            }
        }
        Ok(())
    }
}
