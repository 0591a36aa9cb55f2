//! Scope lifecycle: configuration, operation and child seams, state
//! machine, and execution reports.

mod child;
mod config;
mod lifecycle;
mod operation;
mod outcome;

mod integration_tests;

pub use child::{ChildWork, FnChild};
pub use config::ScopeConfig;
pub use lifecycle::Scope;
pub use operation::{FnOperation, ScopeOperation};
pub use outcome::{ExecutionOutcome, ScopeReport, ScopeState};
