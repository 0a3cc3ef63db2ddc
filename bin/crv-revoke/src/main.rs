//! ---
//! crv_section: "05-operator-interfaces"
//! crv_subsection: "binary"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Operator CLI for discovering and revoking certificates."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use crv_config::RevokerConfig;
use crv_core::{run_pipeline, RunOptions, TerminalGate, VaultCli};
use crv_logging::{self as logging, LogFormat, TracingSink};
use tracing::error;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Revoke Vault-issued certificates still visible in VictoriaMetrics",
    long_about = None
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Regex to filter certificates by common_name.
    #[arg(long = "filter-regex", value_name = "REGEX")]
    filter_regex: Option<String>,
    /// Simulate revocation without performing it.
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::StructuredJson)]
    log_format: LogFormat,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    let Some(config_path) = cli.config.clone() else {
        error!("missing config file argument");
        println!("{}", Cli::command().render_usage());
        return ExitCode::FAILURE;
    };

    match run(&cli, config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "revocation run aborted");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config_path: PathBuf) -> Result<()> {
    let config = RevokerConfig::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let options = RunOptions {
        filter_regex: cli.filter_regex.clone(),
        dry_run: cli.dry_run,
    };
    let revoker = VaultCli::from_config(&config);
    let mut gate = TerminalGate::stdio();
    run_pipeline(&config, &options, &revoker, &mut gate, &TracingSink)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "crv-revoke",
            "--config",
            "revoker.yaml",
            "--filter-regex",
            "^svc-a$",
            "--dry-run",
            "--log-format",
            "pretty",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("revoker.yaml")));
        assert_eq!(cli.filter_regex.as_deref(), Some("^svc-a$"));
        assert!(cli.dry_run);
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn config_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["crv-revoke"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.dry_run);
    }
}
