//! Monitoring cycle assembled from configuration

use std::sync::Arc;
use vigil_config::{Config, LabelsConfig, ProbeConfig, SinkConfig, SinkKind};
use vigil_core::{DiagnosticTest, Error, LogSink, Result, Service};
use vigil_health::{
    CommandProbe, EnvironmentProbe, EventDispatcher, FileSink, LoggerListener, Monitoring, Probe,
    ProbeService, ProbeTest, Report, ReportLabels, StderrSink, StdoutSink, TcpProbe, TracingSink,
};

/// Everything needed to run one cycle. Each run uses a fresh [`Monitoring`].
#[derive(Debug)]
pub struct Cycle {
    labels: ReportLabels,
    sinks: Vec<(String, Arc<dyn LogSink>)>,
    services: Vec<(Arc<dyn Service>, String)>,
    tests: Vec<Arc<dyn DiagnosticTest>>,
}

impl Cycle {
    /// Build sinks, services and tests from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut events = EventDispatcher::new();
        events.subscribe(Arc::new(LoggerListener));
        let events = Arc::new(events);

        let sinks = config
            .sinks
            .iter()
            .map(|sink| Ok((sink.name.clone(), build_sink(sink)?)))
            .collect::<Result<Vec<_>>>()?;

        let services = config
            .services
            .iter()
            .map(|entry| {
                let service = ProbeService::new(entry.configuration(), build_probe(&entry.probe))
                    .with_events(Arc::clone(&events));
                (Arc::new(service) as Arc<dyn Service>, entry.method.clone())
            })
            .collect();

        let tests = config
            .tests
            .iter()
            .map(|entry| {
                Arc::new(ProbeTest::new(entry.identifier.clone(), build_probe(&entry.probe)))
                    as Arc<dyn DiagnosticTest>
            })
            .collect();

        Ok(Self {
            labels: labels(&config.labels),
            sinks,
            services,
            tests,
        })
    }

    /// Run every service and test, in configuration order
    pub fn run(&self) -> Monitoring {
        let mut monitoring = Monitoring::new();
        for (name, sink) in &self.sinks {
            monitoring.add_logger(Arc::clone(sink), name.clone());
        }
        for (service, method) in &self.services {
            monitoring.add_service(Arc::clone(service), method);
        }
        for test in &self.tests {
            monitoring.add_test(Arc::clone(test));
        }
        monitoring
    }

    /// Run the cycle and write the report to every sink
    pub fn run_and_log(&self) -> Report {
        self.run().log_report(&self.labels)
    }

    /// Number of services and tests run per cycle
    pub fn check_count(&self) -> usize {
        self.services.len() + self.tests.len()
    }
}

fn labels(config: &LabelsConfig) -> ReportLabels {
    ReportLabels {
        work: config.work.clone(),
        fail: config.fail.clone(),
        global_work: config.global_work.clone(),
        global_fail: config.global_fail.clone(),
    }
}

fn build_sink(config: &SinkConfig) -> Result<Arc<dyn LogSink>> {
    let sink: Arc<dyn LogSink> = match config.kind {
        SinkKind::Stdout => Arc::new(StdoutSink),
        SinkKind::Stderr => Arc::new(StderrSink),
        SinkKind::Tracing => Arc::new(TracingSink::new(config.name.clone())),
        SinkKind::File => {
            let path = config.path.as_ref().ok_or_else(|| {
                Error::Config(format!("file sink '{}' requires a path", config.name))
            })?;
            Arc::new(FileSink::new(path.clone()))
        }
    };
    Ok(sink)
}

fn build_probe(config: &ProbeConfig) -> Box<dyn Probe> {
    match config {
        ProbeConfig::Tcp {
            host,
            port,
            timeout,
        } => Box::new(TcpProbe::new(host.clone(), *port, *timeout)),
        ProbeConfig::Environment { variable } => Box::new(EnvironmentProbe::new(variable.clone())),
        ProbeConfig::Command { program, args } => {
            Box::new(CommandProbe::new(program.clone(), args.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use vigil_config::{ConfigBuilder, ServiceEntry};

    #[test]
    fn test_cycle_runs_services_then_tests() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("report.log");

        let config = ConfigBuilder::new()
            .file_sink("audit", &log)
            .add_service(ServiceEntry {
                identifier: "pinger".to_string(),
                monitored: true,
                enabled: true,
                method: "ping".to_string(),
                probe: ProbeConfig::Environment {
                    variable: "VIGIL_CYCLE_UNUSED".to_string(),
                },
            })
            .add_test(
                "path",
                ProbeConfig::Environment {
                    variable: "PATH".to_string(),
                },
            )
            .build()
            .unwrap();

        let cycle = Cycle::from_config(&config).unwrap();
        assert_eq!(cycle.check_count(), 2);

        let monitoring = cycle.run();
        let ids: Vec<_> = monitoring.tests().iter().map(|r| r.identifier()).collect();
        assert_eq!(ids, vec!["pinger", "path"]);

        let report = cycle.run_and_log();
        assert!(report.is_healthy());

        let written = fs::read_to_string(&log).unwrap();
        assert!(written.starts_with("pinger\r\nOK ("));
        assert!(written.trim_end().ends_with("[GLOBAL : OKSFR]"));
    }

    #[test]
    fn test_unknown_method_fails_the_cycle() {
        let config = ConfigBuilder::new()
            .add_service(ServiceEntry {
                identifier: "typo".to_string(),
                monitored: true,
                enabled: true,
                method: "chekc".to_string(),
                probe: ProbeConfig::Environment {
                    variable: "PATH".to_string(),
                },
            })
            .build()
            .unwrap();

        let report = Cycle::from_config(&config).unwrap().run_and_log();
        assert!(!report.is_healthy());
        assert!(report.render_plain().contains("Unknown method 'chekc'"));
    }
}
