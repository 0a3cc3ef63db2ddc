//! ---
//! crv_section: "02-observability"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Structured logging setup and pipeline event sinks."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
/// Observable step of a revocation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The mTLS client could not be constructed.
    ClientBuildFailed {
        /// Rendered error chain.
        error: String,
    },
    /// The metrics backend query failed.
    DiscoveryFailed {
        /// Rendered error chain.
        error: String,
    },
    /// Discovery decoded this many descriptors.
    CertificatesRetrieved {
        /// Number of descriptors.
        count: usize,
    },
    /// Discovery returned nothing; the run ends.
    NoCertificates,
    /// The selector kept this many descriptors.
    CertificatesFiltered {
        /// Pattern applied to common names.
        pattern: String,
        /// Number of descriptors kept.
        count: usize,
    },
    /// The selector kept nothing; the run ends.
    NoMatches {
        /// Pattern applied to common names.
        pattern: String,
    },
    /// The operator declined a candidate.
    CandidateDeclined {
        /// Serial of the declined certificate.
        serial: String,
        /// Common name of the declined certificate.
        common_name: String,
    },
    /// Dry run: the candidate would have been revoked.
    DryRunRevocation {
        /// Serial that would be revoked.
        serial: String,
        /// Common name of the certificate.
        common_name: String,
    },
    /// Live revocation is about to be requested.
    RevocationStarted {
        /// Serial being revoked.
        serial: String,
        /// Command line handed to the authority.
        command: String,
    },
    /// The authority confirmed the revocation.
    Revoked {
        /// Revoked serial.
        serial: String,
    },
    /// The revocation failed; the run continues.
    RevocationFailed {
        /// Serial that could not be revoked.
        serial: String,
        /// Rendered error chain.
        error: String,
    },
    /// Final tally of the run.
    RunCompleted {
        /// Descriptors returned by discovery.
        discovered: usize,
        /// Descriptors left after filtering.
        selected: usize,
        /// Candidates the operator approved.
        approved: usize,
        /// Certificates revoked by the authority.
        revoked: usize,
        /// Certificates revoked in dry-run only.
        simulated: usize,
        /// Candidates declined by the operator.
        declined: usize,
        /// Approved candidates whose revocation failed.
        failed: usize,
    },
}

/// Coarse classification used to pick a log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Normal progress.
    Success,
    /// A candidate was left untouched on purpose (decline, dry run).
    Skipped,
    /// Something failed.
    Fault,
}

impl EventOutcome {
    /// Value of the `outcome` log field.
    pub fn as_str(self) -> &'static str {
        match self {
            EventOutcome::Success => "success",
            EventOutcome::Skipped => "skipped",
            EventOutcome::Fault => "fault",
        }
    }
}

impl PipelineEvent {
    /// Stable dotted name used as the `event` field.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::ClientBuildFailed { .. } => "transport.build_failed",
            PipelineEvent::DiscoveryFailed { .. } => "discovery.failed",
            PipelineEvent::CertificatesRetrieved { .. } => "discovery.retrieved",
            PipelineEvent::NoCertificates => "discovery.empty",
            PipelineEvent::CertificatesFiltered { .. } => "selection.filtered",
            PipelineEvent::NoMatches { .. } => "selection.empty",
            PipelineEvent::CandidateDeclined { .. } => "gate.declined",
            PipelineEvent::DryRunRevocation { .. } => "revocation.dry_run",
            PipelineEvent::RevocationStarted { .. } => "revocation.started",
            PipelineEvent::Revoked { .. } => "revocation.succeeded",
            PipelineEvent::RevocationFailed { .. } => "revocation.failed",
            PipelineEvent::RunCompleted { .. } => "run.completed",
        }
    }

    /// Outcome class of the event.
    pub fn outcome(&self) -> EventOutcome {
        match self {
            PipelineEvent::ClientBuildFailed { .. }
            | PipelineEvent::DiscoveryFailed { .. }
            | PipelineEvent::RevocationFailed { .. } => EventOutcome::Fault,
            PipelineEvent::CandidateDeclined { .. } | PipelineEvent::DryRunRevocation { .. } => {
                EventOutcome::Skipped
            }
            PipelineEvent::CertificatesRetrieved { .. }
            | PipelineEvent::NoCertificates
            | PipelineEvent::NoMatches { .. }
            | PipelineEvent::CertificatesFiltered { .. }
            | PipelineEvent::RevocationStarted { .. }
            | PipelineEvent::Revoked { .. }
            | PipelineEvent::RunCompleted { .. } => EventOutcome::Success,
        }
    }

    /// Serial number the event refers to, if any.
    pub fn serial(&self) -> Option<&str> {
        match self {
            PipelineEvent::CandidateDeclined { serial, .. }
            | PipelineEvent::DryRunRevocation { serial, .. }
            | PipelineEvent::RevocationStarted { serial, .. }
            | PipelineEvent::Revoked { serial }
            | PipelineEvent::RevocationFailed { serial, .. } => Some(serial),
            _ => None,
        }
    }
}
