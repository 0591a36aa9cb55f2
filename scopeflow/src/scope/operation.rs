//! The operation a scope executes under its deadline.

use crate::cancellation::CancellationToken;
use crate::container::ObjectContainer;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// The unit of work a scope runs under its deadline.
///
/// The operation is the party that registers resources: it receives
/// exclusive access to the container during setup. It is expected to
/// observe the token and unwind cooperatively when cancelled.
#[async_trait]
pub trait ScopeOperation: Send {
    /// Executes the operation.
    async fn run(
        &mut self,
        container: &mut ObjectContainer,
        token: Arc<CancellationToken>,
    ) -> anyhow::Result<()>;
}

/// A closure-based operation.
pub struct FnOperation<F> {
    func: F,
}

impl<F> FnOperation<F>
where
    F: for<'a> FnMut(&'a mut ObjectContainer, Arc<CancellationToken>) -> BoxFuture<'a, anyhow::Result<()>>
        + Send,
{
    /// Creates a new closure-based operation.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> std::fmt::Debug for FnOperation<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOperation").finish()
    }
}

#[async_trait]
impl<F> ScopeOperation for FnOperation<F>
where
    F: for<'a> FnMut(&'a mut ObjectContainer, Arc<CancellationToken>) -> BoxFuture<'a, anyhow::Result<()>>
        + Send,
{
    async fn run(
        &mut self,
        container: &mut ObjectContainer,
        token: Arc<CancellationToken>,
    ) -> anyhow::Result<()> {
        (self.func)(container, token).await
    }
}
