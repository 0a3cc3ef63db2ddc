//! ---
//! crv_section: "15-testing-qa-runbook"
//! crv_subsection: "fixtures"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Shared fixtures for pipeline and CLI tests."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
//! Fixtures for running the revocation pipeline end to end without a real
//! certificate authority or metrics backend: throwaway mTLS material,
//! configuration documents, canned query responses, and a revoker that only
//! records what it was asked to do.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crv_core::{CertificateDescriptor, RevocationError, Revoker};
use parking_lot::Mutex;
use rcgen::{BasicConstraints, Certificate, CertificateParams, DnType, IsCa, SanType};
use serde::Serialize;
use serde_json::{json, Value};
use tempfile::TempDir;

mod tls;

pub use tls::TlsBackend;

/// A throwaway CA with a client pair and a `127.0.0.1` server pair signed by it.
///
/// Client material and the CA are written as PEM for configuration files;
/// the CA and server pair are also kept as DER for [`TlsBackend`].
#[derive(Debug, Clone)]
pub struct MtlsMaterial {
    pub ca_path: PathBuf,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub ca_der: Vec<u8>,
    pub server_cert_der: Vec<u8>,
    pub server_key_der: Vec<u8>,
}

impl MtlsMaterial {
    /// Generate a CA and a client pair and write them under `dir`.
    pub fn generate(dir: &Path) -> Result<Self> {
        let mut ca_params = CertificateParams::new(Vec::<String>::new());
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "crv test CA");
        let ca = Certificate::from_params(ca_params)?;

        let mut client_params = CertificateParams::new(vec!["revoker.test".to_owned()]);
        client_params
            .distinguished_name
            .push(DnType::CommonName, "crv-revoke");
        let client = Certificate::from_params(client_params)?;

        let mut server_params = CertificateParams::new(Vec::<String>::new());
        server_params.subject_alt_names = vec![
            SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            SanType::DnsName("localhost".to_owned()),
        ];
        server_params
            .distinguished_name
            .push(DnType::CommonName, "vm.test");
        let server = Certificate::from_params(server_params)?;

        let material = Self {
            ca_path: dir.join("ca.pem"),
            cert_path: dir.join("client.pem"),
            key_path: dir.join("client-key.pem"),
            ca_der: ca.serialize_der()?,
            server_cert_der: server.serialize_der_with_signer(&ca)?,
            server_key_der: server.serialize_private_key_der(),
        };
        write(&material.ca_path, &ca.serialize_pem()?)?;
        write(&material.cert_path, &client.serialize_pem_with_signer(&ca)?)?;
        write(&material.key_path, &client.serialize_private_key_pem())?;
        Ok(material)
    }
}

/// Serialisable mirror of the configuration document.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigDocument {
    pub vm_url: String,
    pub vm_query: String,
    pub vault_pki_path: String,
    pub vm_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,
    pub client_cert_path: PathBuf,
    pub client_key_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_binary: Option<String>,
}

/// Temporary directory holding mTLS material and configuration files.
pub struct Fixture {
    dir: TempDir,
    pub material: MtlsMaterial,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("unable to create fixture directory")?;
        let material = MtlsMaterial::generate(dir.path())?;
        Ok(Self { dir, material })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Configuration pointing at `vm_url` and using the fixture's key pair.
    pub fn document(&self, vm_url: impl Into<String>) -> ConfigDocument {
        ConfigDocument {
            vm_url: vm_url.into(),
            vm_query: "last_over_time(x509_cert_not_after[1d])".to_owned(),
            vault_pki_path: "pki_int".to_owned(),
            vm_timeout_secs: 5,
            ca_cert_path: None,
            client_cert_path: self.material.cert_path.clone(),
            client_key_path: self.material.key_path.clone(),
            vault_binary: None,
        }
    }

    /// Write `document` as YAML and return its path.
    pub fn write_config(&self, name: &str, document: &ConfigDocument) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        write(&path, &serde_yaml::to_string(document)?)?;
        Ok(path)
    }
}

/// Instant-query response body with one sample per descriptor.
pub fn metrics_response(certificates: &[CertificateDescriptor]) -> Value {
    let result: Vec<Value> = certificates
        .iter()
        .map(|cert| {
            json!({
                "metric": {
                    "__name__": "x509_cert_not_after",
                    "common_name": cert.common_name,
                    "organizational_unit": cert.organizational_unit,
                    "serial": cert.serial_number,
                },
                "value": [1718000000, "1750000000"]
            })
        })
        .collect();
    json!({
        "status": "success",
        "data": { "resultType": "vector", "result": result }
    })
}

/// Revoker that records requests instead of contacting an authority.
#[derive(Debug, Default)]
pub struct RecordingRevoker {
    calls: Mutex<Vec<(String, String)>>,
    failing: Vec<String>,
}

impl RecordingRevoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail requests for the given serials after recording them.
    pub fn failing<I, S>(serials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: serials.into_iter().map(Into::into).collect(),
        }
    }

    /// `(mount_path, serial)` pairs in request order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub fn serials(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, serial)| serial.clone()).collect()
    }
}

impl Revoker for RecordingRevoker {
    fn revoke(&self, mount_path: &str, serial: &str) -> Result<(), RevocationError> {
        self.calls
            .lock()
            .push((mount_path.to_owned(), serial.to_owned()));
        if self.failing.iter().any(|failing| failing == serial) {
            return Err(RevocationError::CommandNotFound {
                program: "vault".to_owned(),
            });
        }
        Ok(())
    }
}

fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("unable to write {}", path.display()))
}
