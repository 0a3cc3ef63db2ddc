//! ---
//! crv_section: "03-revocation-pipeline"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Certificate discovery through the metrics query API."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use crv_config::RevokerConfig;
use indexmap::IndexMap;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::certificate::CertificateDescriptor;
use crate::error::DiscoveryError;

/// Anything able to produce the candidate set for a run.
pub trait CertificateSource {
    fn discover(&self) -> Result<Vec<CertificateDescriptor>, DiscoveryError>;
}

/// Instant-query client for VictoriaMetrics and Prometheus-compatible APIs.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    client: Client,
    endpoint: Url,
    query: String,
}

impl DiscoveryClient {
    pub fn new(client: Client, endpoint: Url, query: impl Into<String>) -> Self {
        Self {
            client,
            endpoint,
            query: query.into(),
        }
    }

    pub fn from_config(client: Client, config: &RevokerConfig) -> Self {
        Self::new(client, config.vm_url.clone(), config.vm_query.clone())
    }

    /// Endpoint with the query attached as the `query` parameter.
    pub fn query_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("query", &self.query);
        url
    }
}

impl CertificateSource for DiscoveryClient {
    fn discover(&self) -> Result<Vec<CertificateDescriptor>, DiscoveryError> {
        let url = self.query_url();
        debug!(url = %url, "querying metrics backend");
        let response = self.client.get(url).send().map_err(DiscoveryError::Request)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(DiscoveryError::Status(status));
        }
        let body = response.bytes().map_err(DiscoveryError::Request)?;
        decode_descriptors(&body)
    }
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: QueryData,
}

#[derive(Debug, Default, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<Sample>,
}

#[derive(Debug, Deserialize)]
struct Sample {
    #[serde(default)]
    metric: IndexMap<String, String>,
}

/// Decode a query response body into one descriptor per sample, in order.
pub fn decode_descriptors(body: &[u8]) -> Result<Vec<CertificateDescriptor>, DiscoveryError> {
    let response: QueryResponse = serde_json::from_slice(body)?;
    Ok(response
        .data
        .result
        .iter()
        .map(|sample| CertificateDescriptor::from_labels(&sample.metric))
        .collect())
}

#[cfg(test)]
mod tests {
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    use super::*;

    fn body() -> serde_json::Value {
        json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {
                        "metric": {"common_name": "svc-b", "organizational_unit": "ops", "serial": "222"},
                        "value": [1718000000, "1"]
                    },
                    {
                        "metric": {"common_name": "svc-a", "serial": "111"},
                        "value": [1718000000, "1"]
                    },
                    {
                        "metric": {"common_name": "svc-b", "organizational_unit": "ops", "serial": "222"},
                        "value": [1718000000, "1"]
                    }
                ]
            }
        })
    }

    fn client_for(server: &MockServer) -> DiscoveryClient {
        let endpoint = Url::parse(&server.url("/api/v1/query")).unwrap();
        DiscoveryClient::new(Client::new(), endpoint, "x509_cert_not_after{issuer=\"vault\"}")
    }

    #[test]
    fn decodes_rows_in_order_without_dedup() {
        let certs = decode_descriptors(body().to_string().as_bytes()).unwrap();
        let serials: Vec<_> = certs.iter().map(|c| c.serial_number.as_str()).collect();
        assert_eq!(serials, vec!["222", "111", "222"]);
        assert_eq!(certs[1].organizational_unit, "");
    }

    #[test]
    fn missing_data_is_an_empty_set() {
        let certs = decode_descriptors(br#"{"status":"success"}"#).unwrap();
        assert!(certs.is_empty());
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = decode_descriptors(b"<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, DiscoveryError::Decode(_)));
    }

    #[test]
    fn query_is_sent_as_url_parameter() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/query")
                .query_param("query", "x509_cert_not_after{issuer=\"vault\"}");
            then.status(200).json_body(body());
        });
        let certs = client_for(&server).discover().unwrap();
        mock.assert();
        assert_eq!(certs.len(), 3);
        assert_eq!(certs[0], CertificateDescriptor::new("svc-b", "ops", "222"));
    }

    #[test]
    fn existing_query_parameters_are_kept() {
        let endpoint = Url::parse("https://vm.local/select/0/prometheus/api/v1/query?nocache=1").unwrap();
        let client = DiscoveryClient::new(Client::new(), endpoint, "up");
        let url = client.query_url();
        let pairs: Vec<_> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("nocache".to_owned(), "1".to_owned()),
                ("query".to_owned(), "up".to_owned())
            ]
        );
    }

    #[test]
    fn non_ok_status_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/query");
            then.status(503).body("overloaded");
        });
        let err = client_for(&server).discover().unwrap_err();
        match err {
            DiscoveryError::Status(status) => assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn other_success_codes_are_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/query");
            then.status(204);
        });
        let err = client_for(&server).discover().unwrap_err();
        assert!(err.to_string().contains("204"));
    }

    #[test]
    fn unreachable_backend_is_a_request_error() {
        let endpoint = Url::parse("http://127.0.0.1:9/api/v1/query").unwrap();
        let client = DiscoveryClient::new(Client::new(), endpoint, "up");
        let err = client.discover().unwrap_err();
        assert!(matches!(err, DiscoveryError::Request(_)));
    }
}
