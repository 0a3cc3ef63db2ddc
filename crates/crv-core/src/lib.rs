//! ---
//! crv_section: "03-revocation-pipeline"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Discovery, selection, confirmation, and revocation pipeline."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
//! Certificate revocation pipeline.
//!
//! Certificates still visible in the metrics backend are discovered over
//! mutual TLS, narrowed by a common-name regex, confirmed one by one by the
//! operator, and revoked through the Vault CLI. Everything runs on the
//! calling thread; every wait is a blocking call.

pub mod certificate;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod gate;
pub mod orchestrator;
pub mod selector;
pub mod transport;

pub use certificate::CertificateDescriptor;
pub use discovery::{CertificateSource, DiscoveryClient};
pub use error::{DiscoveryError, PipelineError, RevocationError, SelectionError, TransportError};
pub use executor::{RevocationExecutor, RevocationOutcome, Revoker, VaultCli};
pub use gate::{DecisionSource, ScriptedDecisions, TerminalGate};
pub use orchestrator::{run_pipeline, Orchestrator, RunOptions, RunSummary};
pub use selector::CertificateSelector;
pub use transport::build_client;
