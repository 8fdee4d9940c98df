//! Self-contained diagnostic tests

use crate::error::Result;
use std::fmt;

/// A check that runs on its own, without a backing service.
///
/// `execute` returns an error when the check fails.
pub trait DiagnosticTest: Send + Sync + fmt::Debug {
    /// Run the check
    fn execute(&self) -> Result<()>;

    /// Report label
    fn identifier(&self) -> &str;
}
