//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `lifeline-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure and provides a loader. Every field has a default
//! matching the reference deployment, so an absent file or a partial one
//! is fine.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration for the dispatch system.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LifelineConfig {
    /// Dispatch assignment parameters.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Movement simulation loop parameters.
    #[serde(default)]
    pub mover: MoverConfig,

    /// HTTP server binding.
    #[serde(default)]
    pub server: HttpConfig,
}

impl LifelineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the server binding:
    /// `LIFELINE_HOST` and `LIFELINE_PORT`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.server.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.server.apply_env_overrides();
        Ok(config)
    }
}

/// Dispatch assignment parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DispatchConfig {
    /// Assumed road speed in km/h used for ETA estimates. Larger values
    /// shrink ETAs without changing the actual movement rate.
    #[serde(default = "default_assumed_speed_kmh")]
    pub assumed_speed_kmh: f64,

    /// Uniform jitter (decimal degrees) applied around the reporting
    /// camera's position when locating a new incident.
    #[serde(default = "default_jitter_deg")]
    pub jitter_deg: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            assumed_speed_kmh: default_assumed_speed_kmh(),
            jitter_deg: default_jitter_deg(),
        }
    }
}

/// Movement simulation loop parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoverConfig {
    /// Tick period in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Angular step (decimal degrees) each en-route ambulance moves per
    /// tick. Larger values mean faster perceived movement and fewer
    /// ticks to arrival.
    #[serde(default = "default_step_deg")]
    pub step_deg: f64,
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            step_deg: default_step_deg(),
        }
    }
}

/// HTTP server binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// The host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl HttpConfig {
    /// Apply `LIFELINE_HOST` / `LIFELINE_PORT` environment overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("LIFELINE_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("LIFELINE_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
        {
            self.port = port;
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_assumed_speed_kmh() -> f64 {
    60.0
}

fn default_jitter_deg() -> f64 {
    0.001
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_step_deg() -> f64 {
    0.0001
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8000
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = LifelineConfig::default();
        assert!((config.dispatch.assumed_speed_kmh - 60.0).abs() < f64::EPSILON);
        assert!((config.mover.step_deg - 0.0001).abs() < f64::EPSILON);
        assert_eq!(config.mover.tick_interval_ms, 1000);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = LifelineConfig::parse("mover:\n  tick_interval_ms: 250\n").unwrap();
        assert_eq!(config.mover.tick_interval_ms, 250);
        assert!((config.mover.step_deg - 0.0001).abs() < f64::EPSILON);
        assert!((config.dispatch.assumed_speed_kmh - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn full_yaml_roundtrip() {
        let yaml = r"
dispatch:
  assumed_speed_kmh: 80.0
  jitter_deg: 0.002
mover:
  tick_interval_ms: 500
  step_deg: 0.0002
server:
  host: 127.0.0.1
  port: 9000
";
        let config = LifelineConfig::parse(yaml).unwrap();
        assert!((config.dispatch.assumed_speed_kmh - 80.0).abs() < f64::EPSILON);
        assert!((config.dispatch.jitter_deg - 0.002).abs() < f64::EPSILON);
        assert_eq!(config.mover.tick_interval_ms, 500);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(LifelineConfig::parse("mover: [not a map").is_err());
    }
}
