//! fleetpkg - fleet package rollouts over mcollective
//!
//! Usage:
//!   fleetpkg --host=web01,web02 httpd.2.2.3-33          # upgrade and verify
//!   fleetpkg --host=web --pause=httpd --downgrade php.5.1.6-27
//!   fleetpkg --host=db.example.com --status mysql       # report only

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fleetpkg_core::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "fleetpkg", version)]
#[command(about = "Install, upgrade and verify packages across a fleet via mcollective")]
#[command(
    override_usage = "fleetpkg [OPTIONS] --host=PAT[,PAT...] PKG[.VERSION] [PKG[.VERSION]...]"
)]
struct Cli {
    /// Host patterns: hostnames, FQDNs, globs or regexes (repeatable, comma-separated)
    #[arg(long = "host", value_name = "LIST")]
    hosts: Vec<String>,

    /// Services to stop before and start after each package
    #[arg(long, value_name = "LIST")]
    pause: Vec<String>,

    /// Services to restart after each package
    #[arg(long, value_name = "LIST")]
    refresh: Vec<String>,

    /// Run timeout in seconds (reserved, not enforced)
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<String>,

    /// Compare installed versions against the requested ones
    ///
    /// Defaults to true when any package names a version.
    #[arg(long, value_name = "true|false")]
    verify: Option<String>,

    /// Seconds to wait for the fleet to converge after each install or uninstall
    #[arg(long = "verifytimeout", value_name = "SECONDS")]
    verify_timeout: Option<String>,

    /// Uninstall each package before installing the requested version
    #[arg(long)]
    downgrade: bool,

    /// Show per-host status on every poll
    #[arg(long, short)]
    verbose: bool,

    /// Print only failures and status results
    #[arg(long, short)]
    quiet: bool,

    /// Report installed versions without changing anything
    #[arg(long)]
    status: bool,

    /// Broker batching: hosts per batch and optional seconds between batches
    #[arg(long, value_name = "AGENTS[,PAUSE]")]
    batch: Option<String>,

    /// Output format for --status
    #[arg(long, default_value = "table")]
    format: Format,

    /// Packages to install: NAME or NAME.VERSION
    #[arg(value_name = "PKG[.VERSION]")]
    packages: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
enum Format {
    /// Human-readable table
    #[default]
    Table,
    /// One JSON object per host pattern and package
    Json,
}

impl Cli {
    fn into_raw(self) -> RawArgs {
        RawArgs {
            hosts: self.hosts,
            packages: self.packages,
            pause: self.pause,
            refresh: self.refresh,
            timeout: self.timeout,
            verify: self.verify,
            verify_timeout: self.verify_timeout,
            batch: self.batch,
            downgrade: self.downgrade,
            verbose: self.verbose,
            quiet: self.quiet,
            status: self.status,
            format: match self.format {
                Format::Table => OutputFormat::Table,
                Format::Json => OutputFormat::Json,
            },
        }
    }
}

fn main() -> ExitCode {
    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(err) => return fail(&format!("{err:#}"), RunOutcome::InvalidArgs),
    };

    if let Err(err) = ensure_operator(&SystemIdentity, &settings.operator) {
        return fail(&err.to_string(), RunOutcome::InvalidArgs);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => {
                    print_usage();
                    exit_code(RunOutcome::InvalidArgs)
                }
            };
        }
    };

    init_tracing(cli.verbose);

    let broker = McoBroker::new(settings.broker_command.as_str());
    let config = match RunConfig::validate(cli.into_raw(), &settings, &broker) {
        Ok(config) => config,
        Err(err) => {
            print_error(&err.to_string());
            print_usage();
            return exit_code(RunOutcome::InvalidArgs);
        }
    };
    tracing::debug!(?config, "validated run configuration");

    let console = Console::stdio(config.verbosity());
    let orchestrator =
        match Orchestrator::new(&config, &broker, &ThreadSleeper, settings.timing(), console) {
            Ok(orchestrator) => orchestrator,
            Err(err) => return fail(&format!("{err:#}"), RunOutcome::ActionFailure),
        };

    let report = orchestrator.run();
    if report.outcome == RunOutcome::Success
        && !config.status_only()
        && config.verbosity() != Verbosity::Quiet
    {
        println!(
            "{} {} rollout(s) completed",
            style("✓").green().bold(),
            report.pairs.len()
        );
    }
    exit_code(report.outcome)
}

fn load_settings() -> Result<Settings> {
    let path = Settings::default_path();
    Settings::load_default().with_context(|| match &path {
        Some(path) => format!("Failed to load settings from {}", path.display()),
        None => "Failed to load settings".to_string(),
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "fleetpkg=debug,fleetpkg_core=debug,warn"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_usage() {
    eprintln!("\n{}", Cli::command().render_help());
}

fn print_error(message: &str) {
    eprintln!("{} {message}", style("error:").red().bold());
}

fn fail(message: &str, outcome: RunOutcome) -> ExitCode {
    print_error(message);
    exit_code(outcome)
}

fn exit_code(outcome: RunOutcome) -> ExitCode {
    ExitCode::from(outcome.exit_code())
}
