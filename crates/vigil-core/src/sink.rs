//! Report destinations

use crate::error::Result;
use std::fmt;

/// A destination that receives rendered report text
pub trait LogSink: Send + Sync + fmt::Debug {
    /// Write one blob of text
    fn write(&self, text: &str) -> Result<()>;
}
