//! ---
//! crv_section: "03-revocation-pipeline"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Mutual-TLS HTTP client construction."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use std::fs;
use std::path::Path;

use crv_config::RevokerConfig;
use reqwest::blocking::Client;
use reqwest::{Certificate, Identity};
use tracing::debug;

use crate::error::TransportError;

/// Build the blocking mTLS client used for discovery.
///
/// The client key pair is mandatory. When a CA bundle is configured it
/// replaces the platform trust store entirely; otherwise the operating
/// system's native roots are trusted. Nothing is returned unless every piece loads.
pub fn build_client(config: &RevokerConfig) -> Result<Client, TransportError> {
    let mut builder = Client::builder().use_rustls_tls();

    if let Some(ca_path) = config.ca_bundle() {
        let roots = load_ca_bundle(ca_path)?;
        debug!(ca_path = %ca_path.display(), roots = roots.len(), "using configured trust roots");
        builder = builder.tls_built_in_root_certs(false);
        for root in roots {
            builder = builder.add_root_certificate(root);
        }
    }

    let identity = load_identity(&config.client_cert_path, &config.client_key_path)?;
    builder
        .identity(identity)
        .timeout(config.request_timeout())
        .build()
        .map_err(TransportError::Build)
}

/// Parse every certificate in a PEM bundle, rejecting bundles with none.
pub fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>, TransportError> {
    let pem = read_material("CA bundle", path)?;
    let roots = Certificate::from_pem_bundle(&pem).map_err(|source| TransportError::CaBundle {
        path: path.to_path_buf(),
        source,
    })?;
    if roots.is_empty() {
        return Err(TransportError::EmptyCaBundle(path.to_path_buf()));
    }
    Ok(roots)
}

/// Load the client certificate chain and private key as one identity.
pub fn load_identity(cert_path: &Path, key_path: &Path) -> Result<Identity, TransportError> {
    let mut pem = read_material("client certificate", cert_path)?;
    if !pem.ends_with(b"\n") {
        pem.push(b'\n');
    }
    pem.extend(read_material("client key", key_path)?);
    Identity::from_pem(&pem).map_err(TransportError::ClientIdentity)
}

fn read_material(what: &'static str, path: &Path) -> Result<Vec<u8>, TransportError> {
    fs::read(path).map_err(|source| TransportError::ReadMaterial {
        what,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rcgen::{BasicConstraints, Certificate as RcCertificate, CertificateParams, IsCa};
    use tempfile::TempDir;

    use super::*;

    struct Material {
        _dir: TempDir,
        ca: PathBuf,
        cert: PathBuf,
        key: PathBuf,
    }

    fn material() -> Material {
        let dir = tempfile::tempdir().unwrap();
        let mut ca_params = CertificateParams::new(Vec::<String>::new());
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let ca = RcCertificate::from_params(ca_params).unwrap();
        let client = rcgen::generate_simple_self_signed(vec!["revoker.local".to_owned()]).unwrap();

        let ca_path = dir.path().join("ca.pem");
        let cert_path = dir.path().join("client.pem");
        let key_path = dir.path().join("client-key.pem");
        fs::write(&ca_path, ca.serialize_pem().unwrap()).unwrap();
        fs::write(&cert_path, client.serialize_pem_with_signer(&ca).unwrap()).unwrap();
        fs::write(&key_path, client.serialize_private_key_pem()).unwrap();
        Material {
            _dir: dir,
            ca: ca_path,
            cert: cert_path,
            key: key_path,
        }
    }

    fn config(material: &Material, ca: Option<PathBuf>) -> RevokerConfig {
        let raw = format!(
            "vm_url: http://127.0.0.1:8428/api/v1/query\n\
             vm_query: x509_cert_not_after\n\
             vault_pki_path: pki\n\
             vm_timeout_secs: 5\n\
             client_cert_path: {}\n\
             client_key_path: {}\n",
            material.cert.display(),
            material.key.display()
        );
        let mut config: RevokerConfig = raw.parse().unwrap();
        config.ca_cert_path = ca;
        config
    }

    #[test]
    fn builds_with_platform_roots() {
        let material = material();
        assert!(build_client(&config(&material, None)).is_ok());
    }

    #[test]
    fn builds_with_custom_ca() {
        let material = material();
        let ca = material.ca.clone();
        assert!(build_client(&config(&material, Some(ca))).is_ok());
    }

    #[test]
    fn missing_client_key_is_rejected() {
        let material = material();
        let mut config = config(&material, None);
        config.client_key_path = material.cert.with_file_name("absent-key.pem");
        let err = build_client(&config).unwrap_err();
        assert!(matches!(err, TransportError::ReadMaterial { what: "client key", .. }));
    }

    #[test]
    fn key_file_without_key_is_rejected() {
        let material = material();
        let mut config = config(&material, None);
        config.client_key_path = material.cert.clone();
        let err = build_client(&config).unwrap_err();
        assert!(matches!(err, TransportError::ClientIdentity(_)));
    }

    #[test]
    fn ca_bundle_without_certificates_is_rejected() {
        let material = material();
        let bogus = material.ca.with_file_name("not-a-bundle.pem");
        fs::write(&bogus, "this is not PEM\n").unwrap();
        let err = build_client(&config(&material, Some(bogus))).unwrap_err();
        assert!(matches!(err, TransportError::EmptyCaBundle(_)));
    }

    #[test]
    fn empty_ca_path_falls_back_to_platform_roots() {
        let material = material();
        assert!(build_client(&config(&material, Some(PathBuf::new()))).is_ok());
    }
}
