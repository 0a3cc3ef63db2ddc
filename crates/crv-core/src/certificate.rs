//! ---
//! crv_section: "03-revocation-pipeline"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Certificate descriptors extracted from metrics samples."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use indexmap::IndexMap;
use serde::Serialize;

pub const COMMON_NAME_LABEL: &str = "common_name";
pub const ORGANIZATIONAL_UNIT_LABEL: &str = "organizational_unit";
pub const SERIAL_LABEL: &str = "serial";

/// Identity of one issued certificate as reported by the metrics backend.
///
/// All three fields are opaque. Only `serial_number` is used as the
/// revocation key and only `common_name` is matched by the selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateDescriptor {
    pub common_name: String,
    pub organizational_unit: String,
    pub serial_number: String,
}

impl CertificateDescriptor {
    pub fn new(
        common_name: impl Into<String>,
        organizational_unit: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            common_name: common_name.into(),
            organizational_unit: organizational_unit.into(),
            serial_number: serial_number.into(),
        }
    }

    /// Build a descriptor from a sample's label set. Missing labels become
    /// empty strings.
    pub fn from_labels(labels: &IndexMap<String, String>) -> Self {
        let label = |name: &str| labels.get(name).cloned().unwrap_or_default();
        Self {
            common_name: label(COMMON_NAME_LABEL),
            organizational_unit: label(ORGANIZATIONAL_UNIT_LABEL),
            serial_number: label(SERIAL_LABEL),
        }
    }

    /// Whether the descriptor carries a usable revocation key.
    pub fn is_actionable(&self) -> bool {
        !self.serial_number.is_empty()
    }

    /// Question put to the operator before revoking.
    pub fn prompt(&self) -> String {
        format!(
            "Revoke certificate? Common Name: {}, Organizational Unit: {}, Serial: {}",
            self.common_name, self.organizational_unit, self.serial_number
        )
    }
}
