//! ---
//! crv_section: "01-configuration"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Configuration document model, loading, and validation."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
//! Configuration for a single revocation run.
//!
//! The document is read once at startup and never mutated afterwards. YAML is
//! the native format; files ending in `.toml` are parsed as TOML instead.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;
use url::Url;

mod error;

pub use error::{ConfigError, Result};

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_vault_binary() -> String {
    "vault".to_owned()
}

/// Inputs required to discover and revoke certificates.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevokerConfig {
    /// Instant-query endpoint of the metrics backend (e.g. `.../api/v1/query`).
    pub vm_url: Url,
    /// Metrics query selecting the certificate series.
    pub vm_query: String,
    /// Vault PKI mount path used as the revocation target.
    pub vault_pki_path: String,
    /// Request timeout; `0` disables it.
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub vm_timeout_secs: Duration,
    /// Optional PEM bundle replacing the platform trust roots.
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,
    /// PEM client certificate presented to the metrics backend.
    pub client_cert_path: PathBuf,
    /// PEM private key matching `client_cert_path`.
    pub client_key_path: PathBuf,
    /// Executable invoked for revocation.
    #[serde(default = "default_vault_binary")]
    pub vault_binary: String,
}

/// Serialisation format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension, defaulting to YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

impl RevokerConfig {
    /// Load and validate a configuration document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, ConfigFormat::from_path(path))
    }

    /// Parse and validate a configuration document held in memory.
    pub fn parse(contents: &str, format: ConfigFormat) -> Result<Self> {
        let config: RevokerConfig = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
            ConfigFormat::Toml => toml::from_str(contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.vm_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "vm_url must use http or https, got {}",
                self.vm_url.scheme()
            )));
        }
        if self.vm_query.trim().is_empty() {
            return Err(ConfigError::Invalid("vm_query must not be empty".into()));
        }
        if self.mount_path().is_empty() {
            return Err(ConfigError::Invalid(
                "vault_pki_path must not be empty".into(),
            ));
        }
        if self.client_cert_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "client_cert_path must not be empty".into(),
            ));
        }
        if self.client_key_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "client_key_path must not be empty".into(),
            ));
        }
        if self.vault_binary.trim().is_empty() {
            return Err(ConfigError::Invalid("vault_binary must not be empty".into()));
        }
        Ok(())
    }

    /// CA bundle path, treating an empty value as absent.
    pub fn ca_bundle(&self) -> Option<&Path> {
        self.ca_cert_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Effective per-request timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        (!self.vm_timeout_secs.is_zero()).then_some(self.vm_timeout_secs)
    }

    /// PKI mount path without surrounding whitespace or a trailing slash.
    pub fn mount_path(&self) -> &str {
        self.vault_pki_path.trim().trim_end_matches('/')
    }
}

impl std::str::FromStr for RevokerConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(content, ConfigFormat::Yaml)
    }
}
