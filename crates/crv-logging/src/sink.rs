//! ---
//! crv_section: "02-observability"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Structured logging setup and pipeline event sinks."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::event::{EventOutcome, PipelineEvent};

/// Destination for pipeline events.
pub trait EventSink {
    /// Record one event.
    fn record(&self, event: &PipelineEvent);
}

/// Forwards events to the global `tracing` subscriber.
///
/// The level follows [`PipelineEvent::outcome`]: faults at ERROR, skipped
/// candidates at WARN, progress at INFO.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

macro_rules! emit {
    ($outcome:expr, $($field:tt)+) => {
        match $outcome {
            EventOutcome::Fault => error!($($field)+),
            EventOutcome::Skipped => warn!($($field)+),
            EventOutcome::Success => info!($($field)+),
        }
    };
}

impl EventSink for TracingSink {
    fn record(&self, event: &PipelineEvent) {
        let name = event.name();
        let kind = event.outcome();
        let outcome = kind.as_str();
        match event {
            PipelineEvent::ClientBuildFailed { error } => emit!(
                kind,
                event = name,
                outcome,
                error = %error,
                "failed to create TLS client"
            ),
            PipelineEvent::DiscoveryFailed { error } => emit!(
                kind,
                event = name,
                outcome,
                error = %error,
                "failed to query metrics backend"
            ),
            PipelineEvent::CertificatesRetrieved { count } => {
                emit!(kind, event = name, outcome, count, "certificates retrieved")
            }
            PipelineEvent::NoCertificates => {
                emit!(kind, event = name, outcome, "no certificates retrieved")
            }
            PipelineEvent::CertificatesFiltered { pattern, count } => emit!(
                kind,
                event = name,
                outcome,
                count,
                regex = %pattern,
                "certificates filtered by regex"
            ),
            PipelineEvent::NoMatches { pattern } => emit!(
                kind,
                event = name,
                outcome,
                regex = %pattern,
                "no certificates match the provided filter"
            ),
            PipelineEvent::CandidateDeclined {
                serial,
                common_name,
            } => emit!(
                kind,
                event = name,
                outcome,
                serial_number = %serial,
                common_name = %common_name,
                "revocation declined by operator"
            ),
            PipelineEvent::DryRunRevocation {
                serial,
                common_name,
            } => emit!(
                kind,
                event = name,
                outcome,
                serial_number = %serial,
                common_name = %common_name,
                "[DRY RUN] would revoke certificate"
            ),
            PipelineEvent::RevocationStarted { serial, command } => emit!(
                kind,
                event = name,
                outcome,
                serial_number = %serial,
                command = %command,
                "revoking certificate using vault cli"
            ),
            PipelineEvent::Revoked { serial } => emit!(
                kind,
                event = name,
                outcome,
                serial_number = %serial,
                "certificate revoked successfully"
            ),
            PipelineEvent::RevocationFailed { serial, error } => emit!(
                kind,
                event = name,
                outcome,
                serial_number = %serial,
                error = %error,
                "failed to revoke certificate"
            ),
            PipelineEvent::RunCompleted {
                discovered,
                selected,
                approved,
                revoked,
                simulated,
                declined,
                failed,
            } => emit!(
                kind,
                event = name,
                outcome,
                discovered,
                selected,
                approved,
                revoked,
                simulated,
                declined,
                failed,
                "revocation run complete"
            ),
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }

    /// Names of the recorded events.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(PipelineEvent::name).collect()
    }

    /// Whether an event with `name` was recorded.
    pub fn contains(&self, name: &str) -> bool {
        self.events.lock().iter().any(|event| event.name() == name)
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &PipelineEvent) {
        self.events.lock().push(event.clone());
    }
}
