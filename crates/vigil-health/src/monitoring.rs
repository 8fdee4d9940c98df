//! Monitoring aggregator
//!
//! [`Monitoring`] owns the records of one monitoring cycle and the named log
//! sinks the report is written to. It is an explicit instance: build one per
//! cycle, or share one behind [`SharedMonitoring`].

use crate::record::TestRecord;
use crate::report::{to_plain_text, Report, ReportLabels, ReportLine};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vigil_core::{DiagnosticTest, LogSink, Service};

/// Sink name that receives rich markup; every other sink gets plain text
pub const ECHO_SINK: &str = "echo";

/// Aggregator guarded for shared use
pub type SharedMonitoring = Arc<Mutex<Monitoring>>;

/// Registry of records and log sinks
#[derive(Debug, Default)]
pub struct Monitoring {
    tests: Vec<TestRecord>,
    loggers: BTreeMap<String, Arc<dyn LogSink>>,
}

impl Monitoring {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty aggregator behind a mutex
    pub fn shared() -> SharedMonitoring {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Register `sink` under `name`, replacing any sink already there
    pub fn add_logger(&mut self, sink: Arc<dyn LogSink>, name: impl Into<String>) {
        let name = name.into();
        if self.loggers.insert(name.clone(), sink).is_some() {
            debug!(sink = %name, "Replaced log sink");
        }
    }

    /// Sink registered under `name`
    pub fn logger(&self, name: &str) -> Option<&Arc<dyn LogSink>> {
        self.loggers.get(name)
    }

    /// Names of the registered sinks
    pub fn logger_names(&self) -> impl Iterator<Item = &str> {
        self.loggers.keys().map(String::as_str)
    }

    /// Call `method` on `service` and append the resulting record
    pub fn add_service(&mut self, service: Arc<dyn Service>, method: &str) -> &TestRecord {
        self.push(TestRecord::run_service(service, method))
    }

    /// Execute `test` and append the resulting record
    pub fn add_test(&mut self, test: Arc<dyn DiagnosticTest>) -> &TestRecord {
        self.push(TestRecord::run_test(test))
    }

    /// Append an already-produced record
    pub fn push(&mut self, record: TestRecord) -> &TestRecord {
        self.tests.push(record);
        &self.tests[self.tests.len() - 1]
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.tests.clear();
    }

    /// Records in invocation order
    pub fn tests(&self) -> &[TestRecord] {
        &self.tests
    }

    /// Build the report without writing it anywhere
    pub fn report(&self, labels: &ReportLabels) -> Report {
        Report::from_records(&self.tests, labels.clone())
    }

    /// Build the report and write it to every sink
    pub fn log_report(&self, labels: &ReportLabels) -> Report {
        let report = self.report(labels);
        info!(
            records = self.tests.len(),
            healthy = report.is_healthy(),
            sinks = self.loggers.len(),
            "Logging monitoring report"
        );
        self.dispatch(&report.render_html());
        report
    }

    /// Write a free-form message to every sink
    pub fn log(&self, message: &str) {
        self.dispatch(message);
    }

    /// Render a single record's line
    pub fn report_for_record(record: &TestRecord, labels: &ReportLabels) -> String {
        ReportLine::classify(record).render_html(labels)
    }

    fn dispatch(&self, html: &str) {
        let mut plain: Option<String> = None;
        for (name, sink) in &self.loggers {
            let text = if name == ECHO_SINK {
                html
            } else {
                plain.get_or_insert_with(|| to_plain_text(html)).as_str()
            };
            if let Err(e) = sink.write(text) {
                warn!(sink = %name, error = %e, "Failed to write to log sink");
            }
        }
    }
}
