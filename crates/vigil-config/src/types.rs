//! Configuration types

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use vigil_core::ServiceConfiguration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Report labels
    #[serde(default)]
    pub labels: LabelsConfig,

    /// Report destinations
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,

    /// Monitored services
    #[serde(default)]
    pub services: Vec<ServiceEntry>,

    /// Diagnostic tests
    #[serde(default)]
    pub tests: Vec<TestEntry>,

    /// HTTP surface
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Labels used when rendering a report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LabelsConfig {
    /// Working record label
    pub work: String,
    /// Failed record label
    pub fail: String,
    /// Global label when healthy
    pub global_work: String,
    /// Global label when unhealthy
    pub global_fail: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            work: "OK".to_string(),
            fail: "KO".to_string(),
            global_work: "[GLOBAL : OKSFR]".to_string(),
            global_fail: "[GLOBAL : KOSFR]".to_string(),
        }
    }
}

/// Report destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SinkConfig {
    /// Sink name; `echo` receives the rich report
    pub name: String,

    /// Sink kind
    pub kind: SinkKind,

    /// Target file (file sinks only)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Sink kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
    /// Append to a file
    File,
    /// Emit through `tracing`
    Tracing,
}

/// Monitored service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceEntry {
    /// Report label
    pub identifier: String,

    /// Track calls at all
    #[serde(default = "default_true")]
    pub monitored: bool,

    /// Administratively on
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Method to call
    #[serde(default = "default_method")]
    pub method: String,

    /// What the service checks
    pub probe: ProbeConfig,
}

impl ServiceEntry {
    /// Monitoring configuration of the service
    pub fn configuration(&self) -> ServiceConfiguration {
        ServiceConfiguration::new(self.identifier.clone())
            .with_monitored(self.monitored)
            .with_enabled(self.enabled)
    }
}

/// Diagnostic test
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestEntry {
    /// Report label
    pub identifier: String,

    /// What the test checks
    pub probe: ProbeConfig,
}

/// Probe definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeConfig {
    /// TCP connect
    Tcp {
        /// Host name or address
        host: String,
        /// Port
        port: u16,
        /// Connect timeout
        #[serde(default = "default_probe_timeout", with = "humantime_serde")]
        timeout: Duration,
    },
    /// Environment variable presence
    Environment {
        /// Variable name
        variable: String,
    },
    /// Command exit status
    Command {
        /// Program to run
        program: String,
        /// Arguments
        #[serde(default)]
        args: Vec<String>,
    },
}

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Log format (json, text)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_method() -> String {
    "check".to_string()
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}
