//! Configuration validation

use crate::types::{Config, ProbeConfig, SinkKind};
use std::collections::HashSet;
use vigil_core::{Error, Result};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_labels(config)?;

    validate_sinks(config)?;

    validate_services(config)?;

    validate_tests(config)?;

    Ok(())
}

fn validate_labels(config: &Config) -> Result<()> {
    let labels = &config.labels;
    for (name, value) in [
        ("work", &labels.work),
        ("fail", &labels.fail),
        ("global_work", &labels.global_work),
        ("global_fail", &labels.global_fail),
    ] {
        if value.trim().is_empty() {
            return Err(Error::Config(format!("label '{name}' cannot be empty")));
        }
    }
    Ok(())
}

fn validate_sinks(config: &Config) -> Result<()> {
    let mut names = HashSet::new();
    for sink in &config.sinks {
        if sink.name.is_empty() {
            return Err(Error::Config("sink name cannot be empty".to_string()));
        }
        if !names.insert(sink.name.as_str()) {
            return Err(Error::Config(format!("duplicate sink name: {}", sink.name)));
        }
        match (sink.kind, &sink.path) {
            (SinkKind::File, None) => {
                return Err(Error::Config(format!(
                    "file sink '{}' requires a path",
                    sink.name
                )));
            }
            (SinkKind::File, Some(_)) => {}
            (_, Some(_)) => {
                tracing::warn!(sink = %sink.name, "path is ignored for non-file sinks");
            }
            (_, None) => {}
        }
    }

    if config.sinks.is_empty() {
        tracing::warn!("No sinks configured, reports will not be written anywhere");
    }

    Ok(())
}

fn validate_services(config: &Config) -> Result<()> {
    for service in &config.services {
        if service.identifier.is_empty() {
            return Err(Error::Config("service identifier cannot be empty".to_string()));
        }
        if service.method.is_empty() {
            return Err(Error::Config(format!(
                "service '{}' method cannot be empty",
                service.identifier
            )));
        }
        validate_probe(&service.identifier, &service.probe)?;
    }
    Ok(())
}

fn validate_tests(config: &Config) -> Result<()> {
    for test in &config.tests {
        if test.identifier.is_empty() {
            return Err(Error::Config("test identifier cannot be empty".to_string()));
        }
        validate_probe(&test.identifier, &test.probe)?;
    }
    Ok(())
}

fn validate_probe(owner: &str, probe: &ProbeConfig) -> Result<()> {
    match probe {
        ProbeConfig::Tcp {
            host,
            port,
            timeout,
        } => {
            if host.is_empty() {
                return Err(Error::Config(format!("'{owner}': tcp host cannot be empty")));
            }
            if *port == 0 {
                return Err(Error::Config(format!("'{owner}': tcp port must be > 0")));
            }
            if timeout.is_zero() {
                return Err(Error::Config(format!("'{owner}': tcp timeout must be > 0")));
            }
            if timeout.as_secs() > 60 {
                tracing::warn!(owner, "tcp timeout is very high (>1 minute)");
            }
        }
        ProbeConfig::Environment { variable } => {
            if variable.is_empty() {
                return Err(Error::Config(format!(
                    "'{owner}': environment variable name cannot be empty"
                )));
            }
        }
        ProbeConfig::Command { program, .. } => {
            if program.is_empty() {
                return Err(Error::Config(format!("'{owner}': command program cannot be empty")));
            }
        }
    }
    Ok(())
}
