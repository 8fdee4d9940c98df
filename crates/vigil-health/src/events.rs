//! Service call events
//!
//! Services fire a [`ServiceEvent`] before a call and once its outcome is
//! known. Listeners run in priority order (highest first); a panicking
//! listener is contained and does not stop the others.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Event emitted around a service call
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEvent {
    /// A call is about to be made
    Request {
        /// Service identifier
        identifier: String,
        /// Called method
        method: String,
    },
    /// A call completed
    Response {
        /// Service identifier
        identifier: String,
        /// Called method
        method: String,
        /// Call duration in seconds
        duration: Option<f64>,
    },
    /// A call failed
    Exception {
        /// Service identifier
        identifier: String,
        /// Called method
        method: String,
        /// Error message
        message: String,
    },
}

impl ServiceEvent {
    /// Service identifier
    pub fn identifier(&self) -> &str {
        match self {
            ServiceEvent::Request { identifier, .. }
            | ServiceEvent::Response { identifier, .. }
            | ServiceEvent::Exception { identifier, .. } => identifier,
        }
    }

    /// Called method
    pub fn method(&self) -> &str {
        match self {
            ServiceEvent::Request { method, .. }
            | ServiceEvent::Response { method, .. }
            | ServiceEvent::Exception { method, .. } => method,
        }
    }
}

/// Receives service events. Every handler defaults to a no-op.
pub trait ServiceListener: Send + Sync + fmt::Debug {
    /// Called before the request
    fn on_request(&self, _event: &ServiceEvent) {}

    /// Called after a successful response
    fn on_response(&self, _event: &ServiceEvent) {}

    /// Called after a failed call
    fn on_exception(&self, _event: &ServiceEvent) {}

    /// Dispatch priority; higher runs first
    fn priority(&self) -> i32 {
        0
    }
}

/// Synchronous, priority-ordered event dispatcher
#[derive(Debug, Default)]
pub struct EventDispatcher {
    listeners: Vec<Arc<dyn ServiceListener>>,
}

impl EventDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe(&mut self, listener: Arc<dyn ServiceListener>) {
        self.listeners.push(listener);
        // stable: equal priorities keep registration order
        self.listeners.sort_by_key(|l| std::cmp::Reverse(l.priority()));
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `event` to every listener
    pub fn dispatch(&self, event: &ServiceEvent) {
        for listener in &self.listeners {
            let result = panic::catch_unwind(AssertUnwindSafe(|| match event {
                ServiceEvent::Request { .. } => listener.on_request(event),
                ServiceEvent::Response { .. } => listener.on_response(event),
                ServiceEvent::Exception { .. } => listener.on_exception(event),
            }));
            if result.is_err() {
                warn!(service = %event.identifier(), "Service listener panicked");
            }
        }
    }
}

/// Logs every service event
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggerListener;

impl ServiceListener for LoggerListener {
    fn on_request(&self, event: &ServiceEvent) {
        info!(service = %event.identifier(), method = %event.method(), "Request will be send");
    }

    fn on_response(&self, event: &ServiceEvent) {
        if let ServiceEvent::Response {
            duration: Some(duration),
            ..
        } = event
        {
            info!(
                service = %event.identifier(),
                method = %event.method(),
                duration_secs = duration,
                "Response success"
            );
        } else {
            info!(service = %event.identifier(), method = %event.method(), "Response success");
        }
    }

    fn on_exception(&self, event: &ServiceEvent) {
        if let ServiceEvent::Exception { message, .. } = event {
            error!(
                service = %event.identifier(),
                method = %event.method(),
                error = %message,
                "Response KO"
            );
        }
    }

    fn priority(&self) -> i32 {
        -1
    }
}
