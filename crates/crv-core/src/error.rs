//! ---
//! crv_section: "03-revocation-pipeline"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Error taxonomy for the revocation pipeline."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use std::path::PathBuf;
use std::process::ExitStatus;

use crv_config::ConfigError;
use reqwest::StatusCode;
use thiserror::Error;

/// Failures while assembling the mTLS client. Always fatal.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unable to read {what} at {}: {source}", .path.display())]
    ReadMaterial {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load client certificate and key: {0}")]
    ClientIdentity(#[source] reqwest::Error),
    #[error("failed to parse CA bundle {}: {source}", .path.display())]
    CaBundle {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },
    #[error("CA bundle {} contains no usable certificates", .0.display())]
    EmptyCaBundle(PathBuf),
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Failures while querying the metrics backend. Always fatal.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("request to metrics backend failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("metrics query failed: {0}")]
    Status(StatusCode),
    #[error("failed to decode metrics response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The operator-supplied pattern does not compile.
#[derive(Debug, Error)]
#[error("invalid filter regex {pattern:?}: {source}")]
pub struct SelectionError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Failure to revoke one certificate. Recoverable at the batch level.
#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("certificate has no serial number")]
    MissingSerial,
    #[error("revocation command {program:?} not found")]
    CommandNotFound { program: String },
    #[error("unable to start revocation command {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("revocation command {program:?} failed: {status}")]
    CommandFailed { program: String, status: ExitStatus },
}

/// Reasons a run aborts before reaching its end.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}
