//! Scope configuration: timeout and required fields.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for one scope.
///
/// The field names carry no meaning to the lifecycle itself; callers
/// declare which ones are required and validation checks presence before
/// anything executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Execution deadline in milliseconds. Zero means an immediate
    /// deadline.
    pub timeout_ms: u64,
    /// Names of fields that must be present before execution.
    required: Vec<String>,
    /// Field values.
    fields: HashMap<String, serde_json::Value>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            required: Vec::new(),
            fields: HashMap::new(),
        }
    }
}

impl ScopeConfig {
    /// The default execution deadline.
    pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

    /// Creates a configuration with the default timeout and no fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the execution deadline in milliseconds.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Declares a field as required. Duplicate declarations are ignored.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Sets a field value.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Sets a field value in place.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns a field value, if set.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// Returns the declared required field names.
    #[must_use]
    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    /// Returns the deadline as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Checks every required field for presence.
    ///
    /// A field set to `null` counts as absent. All missing fields are
    /// reported together, in declaration order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| {
                self.fields
                    .get(name.as_str())
                    .map_or(true, serde_json::Value::is_null)
            })
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(missing))
        }
    }
}
