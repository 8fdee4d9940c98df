//! Configuration builder

use crate::types::{
    Config, LabelsConfig, ProbeConfig, ServiceEntry, SinkConfig, SinkKind, TestEntry,
};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Builder for constructing configuration programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set report labels
    pub fn labels(mut self, labels: LabelsConfig) -> Self {
        self.config.labels = labels;
        self
    }

    /// Add a sink
    pub fn sink(mut self, name: impl Into<String>, kind: SinkKind) -> Self {
        self.config.sinks.push(SinkConfig {
            name: name.into(),
            kind,
            path: None,
        });
        self
    }

    /// Add a file sink
    pub fn file_sink(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.config.sinks.push(SinkConfig {
            name: name.into(),
            kind: SinkKind::File,
            path: Some(path.into()),
        });
        self
    }

    /// Add a monitored service
    pub fn add_service(mut self, service: ServiceEntry) -> Self {
        self.config.services.push(service);
        self
    }

    /// Add a diagnostic test
    pub fn add_test(mut self, identifier: impl Into<String>, probe: ProbeConfig) -> Self {
        self.config.tests.push(TestEntry {
            identifier: identifier.into(),
            probe,
        });
        self
    }

    /// Set listen address
    pub fn listen(mut self, addr: SocketAddr) -> Self {
        self.config.server.listen = addr;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> vigil_core::Result<Config> {
        crate::validator::validate_config(&self.config)?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let addr: SocketAddr = "127.0.0.1:9100".parse().unwrap();

        let config = ConfigBuilder::new()
            .sink("echo", SinkKind::Stdout)
            .file_sink("audit", "/tmp/vigil.log")
            .add_test(
                "home",
                ProbeConfig::Environment {
                    variable: "HOME".to_string(),
                },
            )
            .listen(addr)
            .build()
            .unwrap();

        assert_eq!(config.server.listen, addr);
        assert_eq!(config.sinks.len(), 2);
        assert_eq!(config.tests.len(), 1);
    }

    #[test]
    fn test_builder_rejects_invalid() {
        let result = ConfigBuilder::new()
            .sink("echo", SinkKind::Stdout)
            .sink("echo", SinkKind::Stderr)
            .build();
        assert!(result.is_err());
    }
}
