//! Test doubles for scope executions.
//!
//! Resources, operations, and children that record what happened to
//! them, for use in this crate's tests and by downstream consumers
//! testing scope-hosted code.

mod mocks;

pub use mocks::{
    CountProbe, FailingOperation, RecordingChild, RegisteringOperation, SlowChild, SlowOperation,
    TrackingResource,
};
