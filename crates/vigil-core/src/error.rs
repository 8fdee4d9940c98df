//! Error types for Vigil

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for Vigil
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A monitored call failed; the message is reported as-is
    #[error("{0}")]
    Failed(String),

    /// The service does not expose the requested method
    #[error("Unknown method '{method}' on service '{service}'")]
    UnknownMethod {
        /// Service identifier
        service: String,
        /// Requested method name
        method: String,
    },

    /// A probe could not reach its target
    #[error("Probe failed: {0}")]
    Probe(String),

    /// A probe gave up waiting
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A log sink rejected a write
    #[error("Sink '{sink}' write failed: {message}")]
    Sink {
        /// Sink name
        sink: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A wrapped call panicked
    #[error("Panicked: {0}")]
    Panic(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// Create a failure error
    pub fn failed(message: impl Into<String>) -> Self {
        Error::Failed(message.into())
    }

    /// Create an unknown method error
    pub fn unknown_method(service: impl Into<String>, method: impl Into<String>) -> Self {
        Error::UnknownMethod {
            service: service.into(),
            method: method.into(),
        }
    }

    /// Create a sink error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Sink {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Build an error from a caught panic payload
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Error::Panic(message)
    }
}
