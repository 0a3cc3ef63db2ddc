//! ---
//! crv_section: "03-revocation-pipeline"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Revocation through the certificate authority's CLI."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use std::io;
use std::process::{Command, Stdio};

use crv_config::RevokerConfig;
use crv_logging::{EventSink, PipelineEvent};

use crate::certificate::CertificateDescriptor;
use crate::error::RevocationError;

/// Capability to revoke one certificate at the authority.
pub trait Revoker {
    fn revoke(&self, mount_path: &str, serial: &str) -> Result<(), RevocationError>;

    /// Human-readable form of the request, for logging.
    fn describe(&self, mount_path: &str, serial: &str) -> String {
        format!("revoke {mount_path} serial_number={serial}")
    }
}

/// Arguments passed to the Vault CLI for one revocation.
pub fn revocation_args(mount_path: &str, serial: &str) -> [String; 3] {
    [
        "write".to_owned(),
        format!("{mount_path}/revoke"),
        format!("serial_number={serial}"),
    ]
}

/// Revokes through `vault write <mount>/revoke serial_number=<serial>`.
///
/// The child inherits stdout and stderr so the operator sees Vault's own
/// output. Authentication comes from the usual `VAULT_*` environment.
#[derive(Debug, Clone)]
pub struct VaultCli {
    program: String,
}

impl VaultCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &RevokerConfig) -> Self {
        Self::new(config.vault_binary.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for VaultCli {
    fn default() -> Self {
        Self::new("vault")
    }
}

impl Revoker for VaultCli {
    fn revoke(&self, mount_path: &str, serial: &str) -> Result<(), RevocationError> {
        let status = Command::new(&self.program)
            .args(revocation_args(mount_path, serial))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => RevocationError::CommandNotFound {
                    program: self.program.clone(),
                },
                _ => RevocationError::Spawn {
                    program: self.program.clone(),
                    source,
                },
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(RevocationError::CommandFailed {
                program: self.program.clone(),
                status,
            })
        }
    }

    fn describe(&self, mount_path: &str, serial: &str) -> String {
        let mut line = self.program.clone();
        for arg in revocation_args(mount_path, serial) {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

/// What the executor did for an approved candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationOutcome {
    Simulated,
    Revoked,
}

/// Revokes approved candidates, or only reports them in dry-run mode.
pub struct RevocationExecutor<'a> {
    revoker: &'a dyn Revoker,
    mount_path: String,
    dry_run: bool,
}

impl<'a> RevocationExecutor<'a> {
    pub fn new(revoker: &'a dyn Revoker, mount_path: impl Into<String>, dry_run: bool) -> Self {
        Self {
            revoker,
            mount_path: mount_path.into(),
            dry_run,
        }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Revoke one certificate. Descriptors without a serial are refused
    /// before anything else happens, dry run included.
    pub fn execute(
        &self,
        certificate: &CertificateDescriptor,
        sink: &dyn EventSink,
    ) -> Result<RevocationOutcome, RevocationError> {
        if !certificate.is_actionable() {
            return Err(RevocationError::MissingSerial);
        }
        let serial = &certificate.serial_number;

        if self.dry_run {
            sink.record(&PipelineEvent::DryRunRevocation {
                serial: serial.clone(),
                common_name: certificate.common_name.clone(),
            });
            return Ok(RevocationOutcome::Simulated);
        }

        sink.record(&PipelineEvent::RevocationStarted {
            serial: serial.clone(),
            command: self.revoker.describe(&self.mount_path, serial),
        });
        self.revoker.revoke(&self.mount_path, serial)?;
        sink.record(&PipelineEvent::Revoked {
            serial: serial.clone(),
        });
        Ok(RevocationOutcome::Revoked)
    }
}
