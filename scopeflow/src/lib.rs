//! # Scopeflow
//!
//! Scoped execution with deadline racing and guaranteed resource
//! cleanup.
//!
//! A [`Scope`](scope::Scope) owns an insertion-ordered container of
//! heterogeneous resources, runs one operation under a hard deadline,
//! hands the container to child work on success, and releases every
//! disposable resource exactly once - whether the execution completed,
//! faulted, or timed out.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scopeflow::prelude::*;
//!
//! let mut scope = Scope::new(ScopeConfig::new().with_timeout_ms(5_000))
//!     .child(FnChild::new("consume", |container, _token| {
//!         Box::pin(async move {
//!             let session = container.get::<Session>().unwrap();
//!             session.ping().await
//!         })
//!     }));
//!
//! let report = scope.execute(&mut connect_operation).await?;
//! assert!(report.outcome.is_completed());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod container;
pub mod errors;
pub mod observability;
pub mod race;
pub mod scope;
pub mod sweep;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::container::{Disposable, ObjectContainer};
    pub use crate::errors::{DisposalFailure, ScopeError, ValidationError};
    pub use crate::race::{run_with_deadline, RaceOutcome};
    pub use crate::scope::{
        ChildWork, ExecutionOutcome, FnChild, FnOperation, Scope, ScopeConfig, ScopeOperation,
        ScopeReport, ScopeState,
    };
    pub use crate::sweep::{CleanupSweep, SweepReport};
}
