//! Configuration management for the model graph
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (cwm.toml)
//! - Environment variables (CWM__*)
//!
//! ## Example config file (cwm.toml):
//! ```toml
//! [naming]
//! separator = "."
//! # surround = "\""
//!
//! [defaults]
//! visibility = "public"
//! is_abstract = false
//! nullable = true
//!
//! [graph]
//! reject_cycles = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::graph::{GraphOptions, NamingOptions};
use crate::model::{ElementDefaults, StandardFactory};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Qualified name formatting
    #[serde(default)]
    pub naming: NamingOptions,

    /// Factory defaults for optional element fields
    #[serde(default)]
    pub defaults: ElementDefaults,

    /// Graph behaviour
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Graph behaviour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Refuse links that close a cycle over ownership or generalization
    #[serde(default)]
    pub reject_cycles: bool,
}

impl ModelConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["cwm.toml", ".cwm.toml", "config/cwm.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(xdg_config) = Self::user_config_path() {
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (CWM__NAMING__SEPARATOR, ...)
        builder = builder.add_source(
            Environment::with_prefix("CWM")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Per-user config file location
    pub fn user_config_path() -> Option<std::path::PathBuf> {
        directories::ProjectDirs::from("org", "cwm", "cwm-model")
            .map(|dirs| dirs.config_dir().join("cwm.toml"))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Options for a new [`ModelGraph`](crate::graph::ModelGraph)
    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            reject_cycles: self.graph.reject_cycles,
            naming: self.naming.clone(),
        }
    }

    /// Factory using the configured defaults
    pub fn factory(&self) -> StandardFactory {
        StandardFactory::new(self.defaults.clone())
    }
}
