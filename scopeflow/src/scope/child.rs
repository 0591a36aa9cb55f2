//! Child work scheduled after a scope's operation completes.

use crate::cancellation::CancellationToken;
use crate::container::ObjectContainer;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// A unit of work scheduled only after the scope's operation completed.
///
/// Children receive shared read access to the container and must not
/// outlive the scope's cleanup; the lifecycle awaits every child before
/// sweeping. A child observing the cancelled token should settle
/// promptly.
#[async_trait]
pub trait ChildWork: Send + Sync {
    /// Returns the child's name, used in fault reporting.
    fn name(&self) -> &str;

    /// Executes the child against the scope's container.
    async fn run(
        &self,
        container: &ObjectContainer,
        token: Arc<CancellationToken>,
    ) -> anyhow::Result<()>;
}

/// A closure-based child.
pub struct FnChild<F> {
    name: String,
    func: F,
}

impl<F> FnChild<F>
where
    F: for<'a> Fn(&'a ObjectContainer, Arc<CancellationToken>) -> BoxFuture<'a, anyhow::Result<()>>
        + Send
        + Sync,
{
    /// Creates a new closure-based child.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> std::fmt::Debug for FnChild<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnChild").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> ChildWork for FnChild<F>
where
    F: for<'a> Fn(&'a ObjectContainer, Arc<CancellationToken>) -> BoxFuture<'a, anyhow::Result<()>>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        container: &ObjectContainer,
        token: Arc<CancellationToken>,
    ) -> anyhow::Result<()> {
        (self.func)(container, token).await
    }
}
