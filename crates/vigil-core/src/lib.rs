//! # Vigil Core
//!
//! Core types, traits, and error handling for the Vigil health monitor.
//!
//! This crate provides the narrow interfaces the monitor consumes:
//! - [`Service`] and its [`ServiceConfiguration`]
//! - [`DiagnosticTest`] for self-contained checks
//! - [`LogSink`] for report destinations
//! - Error types

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod diagnostic;
pub mod error;
pub mod service;
pub mod sink;

pub use diagnostic::DiagnosticTest;
pub use error::{Error, Result};
pub use service::{Response, Service, ServiceConfiguration};
pub use sink::LogSink;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::diagnostic::DiagnosticTest;
    pub use crate::error::{Error, Result};
    pub use crate::service::{Response, Service, ServiceConfiguration};
    pub use crate::sink::LogSink;
}
