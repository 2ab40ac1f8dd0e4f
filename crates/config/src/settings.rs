//! Process-level server settings

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{ConfigError, Result};

/// Bind address and storage location for the server process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4173
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

impl ServerSettings {
    /// Load settings from an optional TOML/JSON file overlaid with
    /// `STACKPILOT_`-prefixed environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix("STACKPILOT").try_parsing(true))
            .build()?;
        let settings: ServerSettings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: ServerSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        let settings: ServerSettings = serde_json::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError("port must be non-zero".to_string()));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "data_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Path of the persisted service-request collection.
    pub fn requests_file(&self) -> PathBuf {
        self.data_dir.join("service-requests.json")
    }

    /// Path of the provider-config override file.
    pub fn provider_config_file(&self) -> PathBuf {
        self.data_dir.join("provider-config.json")
    }
}
