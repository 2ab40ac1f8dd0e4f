//! Configuration for the Stackpilot control plane
//!
//! This crate covers the two configuration surfaces of the server:
//! - Process settings (bind address, data directory) loaded from an
//!   optional TOML/JSON file with environment overrides
//! - Provider settings resolved through an explicit chain: environment
//!   variable, then the persisted provider-config override file, then the
//!   caller-supplied default, with no hidden process-wide cache

mod overrides;
mod resolver;
mod settings;

pub use overrides::*;
pub use resolver::*;
pub use settings::*;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config library error: {0}")]
    ConfigLibError(#[from] ::config::ConfigError),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
