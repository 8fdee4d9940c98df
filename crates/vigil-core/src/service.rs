//! Monitored service abstraction

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value returned by a service call
pub type Response = serde_json::Value;

/// Monitoring-related configuration of a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfiguration {
    /// Human-readable label used in reports
    pub identifier: String,

    /// Whether calls to the service are tracked at all
    #[serde(default = "default_true")]
    pub monitored: bool,

    /// Whether the service is administratively turned on
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ServiceConfiguration {
    /// Create a monitored, enabled configuration
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            monitored: true,
            enabled: true,
        }
    }

    /// Set the monitored flag
    pub fn with_monitored(mut self, monitored: bool) -> Self {
        self.monitored = monitored;
        self
    }

    /// Set the enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether calls are tracked
    pub fn is_monitored(&self) -> bool {
        self.monitored
    }

    /// Whether the service is administratively on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Report label
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// A service whose calls can be wrapped by the monitor.
///
/// Hooks take `&self`; implementations that keep per-call state use
/// interior mutability.
pub trait Service: Send + Sync + fmt::Debug {
    /// Monitoring configuration
    fn configuration(&self) -> &ServiceConfiguration;

    /// Invoke the method named `method`
    fn call(&self, method: &str) -> Result<Response>;

    /// Called right before [`Service::call`]
    fn pre_call(&self, _method: &str) -> Result<()> {
        Ok(())
    }

    /// Receives the call start timestamp (seconds since the UNIX epoch)
    fn set_start(&self, _start: f64) {}

    /// Receives the call end timestamp (seconds since the UNIX epoch)
    fn set_end(&self, _end: f64) {}

    /// Called once the outcome of the call is known
    fn post_call(
        &self,
        _response: Option<&Response>,
        _extra: Option<&Response>,
        _error: Option<&Error>,
    ) -> Result<()> {
        Ok(())
    }
}
