//! Ready-made probes, usable as diagnostic tests or as monitored services

use crate::events::{EventDispatcher, ServiceEvent};
use parking_lot::Mutex;
use serde_json::json;
use std::env;
use std::fmt;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use vigil_core::{DiagnosticTest, Error, Response, Result, Service, ServiceConfiguration};

/// A single reachability or sanity check
pub trait Probe: Send + Sync + fmt::Debug {
    /// Run the check
    fn probe(&self) -> Result<()>;

    /// Short description of the target
    fn target(&self) -> String;
}

/// Opens a TCP connection
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    /// Create a TCP probe
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }
}

impl Probe for TcpProbe {
    fn probe(&self) -> Result<()> {
        let addr = self.target();
        debug!(addr = %addr, "Performing TCP probe");

        let candidates = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::Probe(format!("Failed to resolve {addr}: {e}")))?;

        let mut last_error = None;
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, self.timeout) {
                Ok(_) => return Ok(()),
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) if e.kind() == io::ErrorKind::TimedOut => Err(Error::Timeout(self.timeout)),
            Some(e) => Err(Error::Probe(format!("Connection error: {e}"))),
            None => Err(Error::Probe(format!("No address found for {addr}"))),
        }
    }

    fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Passes when an environment variable is set and non-empty
#[derive(Debug, Clone)]
pub struct EnvironmentProbe {
    variable: String,
}

impl EnvironmentProbe {
    /// Create an environment probe
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl Probe for EnvironmentProbe {
    fn probe(&self) -> Result<()> {
        match env::var(&self.variable) {
            Ok(value) if !value.is_empty() => Ok(()),
            Ok(_) => Err(Error::failed(format!(
                "Environment variable '{}' is empty",
                self.variable
            ))),
            Err(_) => Err(Error::failed(format!(
                "Environment variable '{}' is not set",
                self.variable
            ))),
        }
    }

    fn target(&self) -> String {
        format!("${}", self.variable)
    }
}

/// Runs a command; passes on a zero exit status
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    /// Create a command probe
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Probe for CommandProbe {
    fn probe(&self) -> Result<()> {
        let output = Command::new(&self.program).args(&self.args).output()?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            Err(Error::failed(format!("`{}` exited with {}", self.target(), output.status)))
        } else {
            Err(Error::failed(format!(
                "`{}` exited with {}: {stderr}",
                self.target(),
                output.status
            )))
        }
    }

    fn target(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A probe run as a diagnostic test
#[derive(Debug)]
pub struct ProbeTest {
    identifier: String,
    probe: Box<dyn Probe>,
}

impl ProbeTest {
    /// Wrap `probe` under `identifier`
    pub fn new(identifier: impl Into<String>, probe: Box<dyn Probe>) -> Self {
        Self {
            identifier: identifier.into(),
            probe,
        }
    }
}

impl DiagnosticTest for ProbeTest {
    fn execute(&self) -> Result<()> {
        self.probe.probe()
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug, Default)]
struct CallState {
    method: String,
    start: Option<f64>,
    end: Option<f64>,
}

/// A probe exposed as a monitored service.
///
/// Methods: `check` runs the probe, `ping` succeeds without touching the
/// target. Calls are announced to the optional event dispatcher.
#[derive(Debug)]
pub struct ProbeService {
    configuration: ServiceConfiguration,
    probe: Box<dyn Probe>,
    events: Option<Arc<EventDispatcher>>,
    state: Mutex<CallState>,
}

impl ProbeService {
    /// Create a service around `probe`
    pub fn new(configuration: ServiceConfiguration, probe: Box<dyn Probe>) -> Self {
        Self {
            configuration,
            probe,
            events: None,
            state: Mutex::new(CallState::default()),
        }
    }

    /// Announce calls to `events`
    pub fn with_events(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = Some(events);
        self
    }

    /// Start timestamp of the last call
    pub fn last_start(&self) -> Option<f64> {
        self.state.lock().start
    }

    /// End timestamp of the last call
    pub fn last_end(&self) -> Option<f64> {
        self.state.lock().end
    }

    fn emit(&self, event: ServiceEvent) {
        if let Some(events) = &self.events {
            events.dispatch(&event);
        }
    }
}

impl Service for ProbeService {
    fn configuration(&self) -> &ServiceConfiguration {
        &self.configuration
    }

    fn call(&self, method: &str) -> Result<Response> {
        match method {
            "check" => {
                self.probe.probe()?;
                Ok(json!({ "target": self.probe.target() }))
            }
            "ping" => Ok(json!("pong")),
            other => Err(Error::unknown_method(self.configuration.identifier(), other)),
        }
    }

    fn pre_call(&self, method: &str) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.method = method.to_string();
            state.start = None;
            state.end = None;
        }
        self.emit(ServiceEvent::Request {
            identifier: self.configuration.identifier().to_string(),
            method: method.to_string(),
        });
        Ok(())
    }

    fn set_start(&self, start: f64) {
        self.state.lock().start = Some(start);
    }

    fn set_end(&self, end: f64) {
        self.state.lock().end = Some(end);
    }

    fn post_call(
        &self,
        _response: Option<&Response>,
        _extra: Option<&Response>,
        error: Option<&Error>,
    ) -> Result<()> {
        let (method, duration) = {
            let state = self.state.lock();
            let duration = state.start.zip(state.end).map(|(start, end)| end - start);
            (state.method.clone(), duration)
        };
        let identifier = self.configuration.identifier().to_string();

        let event = match error {
            Some(e) => ServiceEvent::Exception {
                identifier,
                method,
                message: e.to_string(),
            },
            None => ServiceEvent::Response {
                identifier,
                method,
                duration,
            },
        };
        self.emit(event);
        Ok(())
    }
}
