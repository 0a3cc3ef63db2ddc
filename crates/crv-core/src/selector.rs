//! ---
//! crv_section: "03-revocation-pipeline"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Common-name selection of discovered certificates."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use regex::Regex;

use crate::certificate::CertificateDescriptor;
use crate::error::SelectionError;

/// Narrows a candidate set to certificates whose common name matches a regex.
///
/// Matching is unanchored: `svc-a` selects `svc-a`, `svc-ab` and `old-svc-a`.
#[derive(Debug, Clone)]
pub struct CertificateSelector {
    pattern: Regex,
}

impl CertificateSelector {
    pub fn compile(pattern: &str) -> Result<Self, SelectionError> {
        let pattern = Regex::new(pattern).map_err(|source| SelectionError {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self { pattern })
    }

    /// Compile an optional pattern. Absent or empty means "select all", for
    /// which no selector is built.
    pub fn from_option(pattern: Option<&str>) -> Result<Option<Self>, SelectionError> {
        match pattern {
            Some(pattern) if !pattern.is_empty() => Self::compile(pattern).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, certificate: &CertificateDescriptor) -> bool {
        self.pattern.is_match(&certificate.common_name)
    }

    /// Keep matching descriptors, preserving their order.
    pub fn select(&self, candidates: Vec<CertificateDescriptor>) -> Vec<CertificateDescriptor> {
        candidates
            .into_iter()
            .filter(|certificate| self.matches(certificate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<CertificateDescriptor> {
        vec![
            CertificateDescriptor::new("svc-a", "ops", "111"),
            CertificateDescriptor::new("svc-b", "ops", "222"),
            CertificateDescriptor::new("legacy-svc-a", "payments", "333"),
            CertificateDescriptor::new("", "ops", "444"),
        ]
    }

    #[test]
    fn keeps_matching_common_names_in_order() {
        let selector = CertificateSelector::compile("svc-a").unwrap();
        let kept = selector.select(candidates());
        let serials: Vec<_> = kept.iter().map(|c| c.serial_number.as_str()).collect();
        assert_eq!(serials, vec!["111", "333"]);
    }

    #[test]
    fn anchored_patterns_are_honoured() {
        let selector = CertificateSelector::compile("^svc-[ab]$").unwrap();
        let kept = selector.select(candidates());
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|c| c.common_name.starts_with("svc-")));
    }

    #[test]
    fn organizational_unit_is_not_matched() {
        let selector = CertificateSelector::compile("payments").unwrap();
        assert!(selector.select(candidates()).is_empty());
    }

    #[test]
    fn duplicates_survive_selection() {
        let mut input = candidates();
        input.push(CertificateDescriptor::new("svc-a", "ops", "111"));
        let kept = CertificateSelector::compile("^svc-a$").unwrap().select(input);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn empty_pattern_builds_no_selector() {
        assert!(CertificateSelector::from_option(None).unwrap().is_none());
        assert!(CertificateSelector::from_option(Some("")).unwrap().is_none());
        let selector = CertificateSelector::from_option(Some("svc")).unwrap().unwrap();
        assert_eq!(selector.as_str(), "svc");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = CertificateSelector::compile("svc-(a").unwrap_err();
        assert_eq!(err.pattern, "svc-(a");
        assert!(CertificateSelector::from_option(Some("[")).is_err());
    }
}
