//! Structured tracing for scope executions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Installs a global `tracing` subscriber reading `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Span attributes for a scope execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeSpanAttributes {
    /// The scope run id.
    pub scope_run_id: Option<String>,
    /// Final lifecycle state.
    pub state: Option<String>,
    /// Configured deadline in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
    /// Error message if the execution faulted.
    pub error: Option<String>,
}

impl ScopeSpanAttributes {
    /// Creates new scope span attributes.
    #[must_use]
    pub fn new(scope_run_id: impl Into<String>) -> Self {
        Self {
            scope_run_id: Some(scope_run_id.into()),
            ..Default::default()
        }
    }

    /// Sets the final state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Converts to OpenTelemetry attributes.
    #[must_use]
    pub fn to_otel_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        if let Some(ref v) = self.scope_run_id {
            attrs.insert("scope.run_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.state {
            attrs.insert("scope.state".to_string(), v.clone());
        }
        if let Some(v) = self.timeout_ms {
            attrs.insert("scope.timeout_ms".to_string(), v.to_string());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("scope.duration_ms".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error {
            attrs.insert("scope.error".to_string(), v.clone());
        }

        attrs
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}
