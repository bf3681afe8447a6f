//! Configuration for the demo harness binary.
//!
//! None of this reaches the broker or the adapter -- both are configured
//! entirely per-call (see the embedding API). This is ambient harness-only
//! configuration: how large a synthetic population to build and for how
//! long to run it.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur while loading harness configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read harness config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse harness config YAML: {source}")]
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

/// Top-level harness configuration, normally loaded from
/// `netmeter-demo.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HarnessConfig {
    /// Number of ticks to run before stopping.
    #[serde(default = "default_tick_count")]
    pub tick_count: u64,

    /// Fixed delta time passed to every `run_converters` call.
    #[serde(default = "default_delta_time")]
    pub delta_time: f64,

    /// Number of distinct resources the synthetic population spans.
    #[serde(default = "default_resource_count")]
    pub resource_count: u32,

    /// Number of producer converters to create per resource.
    #[serde(default = "default_producers_per_resource")]
    pub producers_per_resource: u32,

    /// Number of required-consumer converters to create per resource.
    #[serde(default = "default_required_consumers_per_resource")]
    pub required_consumers_per_resource: u32,

    /// Number of optional-consumer converters to create per resource.
    #[serde(default = "default_optional_consumers_per_resource")]
    pub optional_consumers_per_resource: u32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tick_count: default_tick_count(),
            delta_time: default_delta_time(),
            resource_count: default_resource_count(),
            producers_per_resource: default_producers_per_resource(),
            required_consumers_per_resource: default_required_consumers_per_resource(),
            optional_consumers_per_resource: default_optional_consumers_per_resource(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

const fn default_tick_count() -> u64 {
    120
}

const fn default_delta_time() -> f64 {
    1.0
}

const fn default_resource_count() -> u32 {
    4
}

const fn default_producers_per_resource() -> u32 {
    2
}

const fn default_required_consumers_per_resource() -> u32 {
    3
}

const fn default_optional_consumers_per_resource() -> u32 {
    2
}
