//! ---
//! crv_section: "01-configuration"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Configuration document model, loading, and validation."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
