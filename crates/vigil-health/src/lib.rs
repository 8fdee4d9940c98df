//! # Vigil Health
//!
//! Service-health monitoring with:
//! - Timed, failure-absorbing wrappers around service calls and diagnostic tests
//! - An aggregator holding the records of one monitoring cycle
//! - A structured report with rich (HTML) and plain-text renderings
//! - Log sinks, service events, and ready-made probes

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod events;
pub mod monitoring;
pub mod probes;
pub mod record;
pub mod report;
pub mod sinks;

pub use events::{EventDispatcher, LoggerListener, ServiceEvent, ServiceListener};
pub use monitoring::{Monitoring, SharedMonitoring, ECHO_SINK};
pub use probes::{CommandProbe, EnvironmentProbe, Probe, ProbeService, ProbeTest, TcpProbe};
pub use record::{Subject, TestRecord};
pub use report::{to_plain_text, Outcome, Report, ReportLabels, ReportLine};
pub use sinks::{FileSink, MemorySink, StderrSink, StdoutSink, TracingSink};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::monitoring::{Monitoring, SharedMonitoring, ECHO_SINK};
    pub use crate::record::{Subject, TestRecord};
    pub use crate::report::{Outcome, Report, ReportLabels, ReportLine};
    pub use vigil_core::prelude::*;
}
