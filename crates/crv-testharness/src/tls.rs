//! ---
//! crv_section: "15-testing-qa-runbook"
//! crv_subsection: "fixtures"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "One-shot HTTPS backend that requires a client certificate."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use rustls::crypto::ring;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig, ServerConnection, StreamOwned};

use crate::MtlsMaterial;

const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Metrics backend on `127.0.0.1` that serves exactly one mTLS connection.
///
/// Clients must present a certificate issued by the fixture CA. The single
/// request is answered with `body` as JSON.
pub struct TlsBackend {
    addr: SocketAddr,
    handle: JoinHandle<Result<String>>,
}

impl TlsBackend {
    pub fn start(material: &MtlsMaterial, body: impl Into<String>) -> Result<Self> {
        let config = Arc::new(server_config(material)?);
        let listener = TcpListener::bind("127.0.0.1:0").context("unable to bind TLS backend")?;
        let addr = listener.local_addr()?;
        let body = body.into();
        let handle = thread::spawn(move || serve_once(&listener, config, &body));
        Ok(Self { addr, handle })
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://{}{}", self.addr, path)
    }

    /// Wait for the connection to end. Returns the request line, or the
    /// handshake or I/O error that ended the connection.
    pub fn finish(self) -> Result<String> {
        self.handle
            .join()
            .map_err(|_| anyhow!("TLS backend thread panicked"))?
    }
}

fn server_config(material: &MtlsMaterial) -> Result<ServerConfig> {
    let provider = Arc::new(ring::default_provider());
    let mut roots = RootCertStore::empty();
    roots.add(CertificateDer::from(material.ca_der.clone()))?;
    let verifier =
        WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone()).build()?;
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(material.server_key_der.clone()));
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_client_cert_verifier(verifier)
        .with_single_cert(vec![CertificateDer::from(material.server_cert_der.clone())], key)?;
    Ok(config)
}

fn serve_once(listener: &TcpListener, config: Arc<ServerConfig>, body: &str) -> Result<String> {
    let (tcp, _) = listener.accept().context("TLS backend accept failed")?;
    tcp.set_read_timeout(Some(READ_TIMEOUT))?;
    let mut tls = StreamOwned::new(ServerConnection::new(config)?, tcp);

    let mut request_line = String::new();
    {
        let mut reader = BufReader::new(&mut tls);
        reader
            .read_line(&mut request_line)
            .context("TLS handshake or request read failed")?;
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header)? == 0 || header == "\r\n" {
                break;
            }
        }
    }

    write!(
        tls,
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    tls.conn.send_close_notify();
    tls.flush()?;
    Ok(request_line.trim_end().to_owned())
}
