//! ---
//! crv_section: "03-revocation-pipeline"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Discovery, selection, confirmation, and revocation control flow."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use crv_config::RevokerConfig;
use crv_logging::{EventSink, PipelineEvent};
use tracing::debug;

use crate::discovery::{CertificateSource, DiscoveryClient};
use crate::error::PipelineError;
use crate::executor::{RevocationExecutor, RevocationOutcome, Revoker};
use crate::gate::DecisionSource;
use crate::selector::CertificateSelector;
use crate::transport::build_client;

/// Operator choices for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Regex restricting candidates by common name. Empty selects all.
    pub filter_regex: Option<String>,
    /// Report would-be revocations without contacting the authority.
    pub dry_run: bool,
}

/// Tally of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub selected: usize,
    pub approved: usize,
    pub declined: usize,
    pub revoked: usize,
    pub simulated: usize,
    pub failed: usize,
}

impl RunSummary {
    fn event(&self) -> PipelineEvent {
        PipelineEvent::RunCompleted {
            discovered: self.discovered,
            selected: self.selected,
            approved: self.approved,
            revoked: self.revoked,
            simulated: self.simulated,
            declined: self.declined,
            failed: self.failed,
        }
    }
}

/// Linear discovery → selection → confirmation → revocation pipeline.
///
/// Discovery failures abort the run. Revocation failures are recorded and
/// the loop moves on to the next candidate.
pub struct Orchestrator<'a> {
    source: &'a dyn CertificateSource,
    selector: Option<CertificateSelector>,
    executor: RevocationExecutor<'a>,
    sink: &'a dyn EventSink,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        source: &'a dyn CertificateSource,
        selector: Option<CertificateSelector>,
        executor: RevocationExecutor<'a>,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            source,
            selector,
            executor,
            sink,
        }
    }

    pub fn run(&self, gate: &mut dyn DecisionSource) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();

        let discovered = self.source.discover().map_err(|err| {
            self.sink.record(&PipelineEvent::DiscoveryFailed {
                error: err.to_string(),
            });
            err
        })?;
        summary.discovered = discovered.len();
        self.sink.record(&PipelineEvent::CertificatesRetrieved {
            count: discovered.len(),
        });
        if discovered.is_empty() {
            self.sink.record(&PipelineEvent::NoCertificates);
            return Ok(self.finish(summary));
        }

        let candidates = match &self.selector {
            Some(selector) => {
                let kept = selector.select(discovered);
                self.sink.record(&PipelineEvent::CertificatesFiltered {
                    pattern: selector.as_str().to_owned(),
                    count: kept.len(),
                });
                if kept.is_empty() {
                    self.sink.record(&PipelineEvent::NoMatches {
                        pattern: selector.as_str().to_owned(),
                    });
                    return Ok(self.finish(summary));
                }
                kept
            }
            None => discovered,
        };
        summary.selected = candidates.len();

        for certificate in &candidates {
            if !gate.confirm(&certificate.prompt()) {
                summary.declined += 1;
                self.sink.record(&PipelineEvent::CandidateDeclined {
                    serial: certificate.serial_number.clone(),
                    common_name: certificate.common_name.clone(),
                });
                continue;
            }
            summary.approved += 1;
            match self.executor.execute(certificate, self.sink) {
                Ok(RevocationOutcome::Simulated) => summary.simulated += 1,
                Ok(RevocationOutcome::Revoked) => summary.revoked += 1,
                Err(err) => {
                    summary.failed += 1;
                    self.sink.record(&PipelineEvent::RevocationFailed {
                        serial: certificate.serial_number.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(self.finish(summary))
    }

    fn finish(&self, summary: RunSummary) -> RunSummary {
        self.sink.record(&summary.event());
        summary
    }
}

/// Run the whole pipeline against the configured backend and authority.
///
/// The pattern is compiled and the mTLS client built before any network
/// traffic; either failing aborts the run.
pub fn run_pipeline(
    config: &RevokerConfig,
    options: &RunOptions,
    revoker: &dyn Revoker,
    gate: &mut dyn DecisionSource,
    sink: &dyn EventSink,
) -> Result<RunSummary, PipelineError> {
    let selector = CertificateSelector::from_option(options.filter_regex.as_deref())?;
    let client = build_client(config).map_err(|err| {
        sink.record(&PipelineEvent::ClientBuildFailed {
            error: err.to_string(),
        });
        err
    })?;
    let source = DiscoveryClient::from_config(client, config);
    debug!(
        mount_path = config.mount_path(),
        dry_run = options.dry_run,
        "revocation pipeline ready"
    );
    let executor = RevocationExecutor::new(revoker, config.mount_path(), options.dry_run);
    Orchestrator::new(&source, selector, executor, sink).run(gate)
}
