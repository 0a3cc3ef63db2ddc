//! ---
//! crv_section: "02-observability"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Structured logging setup and pipeline event sinks."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
#![warn(missing_docs)]
//! Logging for the revocation toolkit.
//!
//! Process-wide subscriber setup lives here alongside the [`EventSink`]
//! abstraction the pipeline reports through, so pipeline code never touches
//! the global subscriber directly.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod event;
pub mod sink;

pub use event::{EventOutcome, PipelineEvent};
pub use sink::{EventSink, RecordingSink, TracingSink};

const LOG_ENV: &str = "CRV_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// Output format for the process-wide subscriber.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// One JSON object per line on stdout.
    #[default]
    StructuredJson,
    /// Human-oriented multi-field lines.
    Pretty,
}

/// Install the global tracing subscriber.
///
/// `CRV_LOG` takes precedence over `RUST_LOG`; without either the filter
/// defaults to `info`. Repeated calls are ignored.
pub fn init(format: LogFormat) {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(directive).unwrap_or_else(|err| {
            eprintln!("invalid {LOG_ENV} directive ({err}); defaulting to {DEFAULT_DIRECTIVE}");
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }),
        Err(_) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    };

    let fmt_layer = match format {
        LogFormat::StructuredJson => subscriber_fmt::layer()
            .with_target(false)
            .json()
            .boxed(),
        LogFormat::Pretty => subscriber_fmt::layer().with_target(true).boxed(),
    };

    let _ = Registry::default().with(filter).with(fmt_layer).try_init();
}
