//! Validated run configuration built from raw command-line values.

use crate::broker::BrokerTransport;
use crate::config::Settings;
use crate::error::ArgError;
use crate::types::{HostPattern, PackageSpec};

/// How much the run prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Status-mode output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Broker-side batching: `agents` hosts at a time, `pause_secs` between batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpec {
    pub agents: u64,
    pub pause_secs: Option<u64>,
}

/// Command-line values as typed by the operator, before validation.
///
/// List fields hold one entry per occurrence of the flag; each entry may itself
/// be comma-separated.
#[derive(Debug, Clone, Default)]
pub struct RawArgs {
    pub hosts: Vec<String>,
    pub packages: Vec<String>,
    pub pause: Vec<String>,
    pub refresh: Vec<String>,
    pub timeout: Option<String>,
    pub verify: Option<String>,
    pub verify_timeout: Option<String>,
    pub batch: Option<String>,
    pub downgrade: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub status: bool,
    pub format: OutputFormat,
}

/// Immutable configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    hosts: Vec<HostPattern>,
    packages: Vec<PackageSpec>,
    pause: Vec<String>,
    refresh: Vec<String>,
    timeout_secs: u64,
    verify: bool,
    verify_timeout_secs: u64,
    downgrade: bool,
    verbosity: Verbosity,
    status_only: bool,
    batch: Option<BatchSpec>,
    format: OutputFormat,
}

impl RunConfig {
    /// Validate `raw` in a single pass.
    ///
    /// The broker is only probed for batching support when `--batch` is given.
    pub fn validate(
        raw: RawArgs,
        settings: &Settings,
        broker: &dyn BrokerTransport,
    ) -> Result<Self, ArgError> {
        if raw.verbose && raw.quiet {
            return Err(ArgError::Conflict("--verbose", "--quiet"));
        }
        if raw.status {
            if raw.downgrade {
                return Err(ArgError::Conflict("--status", "--downgrade"));
            }
            if raw.verify.is_some() {
                return Err(ArgError::Conflict("--status", "--verify"));
            }
            if !raw.pause.is_empty() {
                return Err(ArgError::Conflict("--status", "--pause"));
            }
            if !raw.refresh.is_empty() {
                return Err(ArgError::Conflict("--status", "--refresh"));
            }
        }

        let hosts = split_list("--host", &raw.hosts)?;
        if hosts.is_empty() {
            return Err(ArgError::Missing("--host"));
        }
        if raw.packages.is_empty() {
            return Err(ArgError::Missing("package"));
        }
        let packages = raw
            .packages
            .iter()
            .map(|token| PackageSpec::parse(token))
            .collect::<Result<Vec<_>, _>>()?;

        let pause = split_list("--pause", &raw.pause)?;
        let refresh = split_list("--refresh", &raw.refresh)?;

        let timeout_secs = match raw.timeout.as_deref() {
            Some(value) => parse_seconds("--timeout", value)?,
            None => settings.timeout_secs,
        };
        let verify_timeout_secs = match raw.verify_timeout.as_deref() {
            Some(value) => parse_seconds("--verifytimeout", value)?,
            None => settings.verify_timeout_secs,
        };

        let verify = match raw.verify.as_deref() {
            Some("true") => true,
            Some("false") => false,
            Some(other) => return Err(ArgError::InvalidBoolean(other.to_string())),
            None => packages.iter().any(|spec| spec.version().is_some()),
        };

        let batch = match raw.batch.as_deref() {
            Some(value) => {
                let spec = parse_batch(value)?;
                if !broker.supports_batching().unwrap_or(false) {
                    return Err(ArgError::BatchUnsupported);
                }
                Some(spec)
            }
            None => None,
        };

        let verbosity = if raw.verbose {
            Verbosity::Verbose
        } else if raw.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        };

        Ok(Self {
            hosts: hosts.into_iter().map(HostPattern::new).collect(),
            packages,
            pause,
            refresh,
            timeout_secs,
            verify,
            verify_timeout_secs,
            downgrade: raw.downgrade,
            verbosity,
            status_only: raw.status,
            batch,
            format: raw.format,
        })
    }

    pub fn hosts(&self) -> &[HostPattern] {
        &self.hosts
    }

    pub fn packages(&self) -> &[PackageSpec] {
        &self.packages
    }

    pub fn pause_services(&self) -> &[String] {
        &self.pause
    }

    pub fn refresh_services(&self) -> &[String] {
        &self.refresh
    }

    /// Parsed and kept for compatibility; nothing enforces it.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn verify(&self) -> bool {
        self.verify
    }

    /// Whether `spec` gets its installed version compared after install.
    pub fn verifies(&self, spec: &PackageSpec) -> bool {
        self.verify && spec.version().is_some()
    }

    pub fn verify_timeout_secs(&self) -> u64 {
        self.verify_timeout_secs
    }

    pub fn downgrade(&self) -> bool {
        self.downgrade
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn status_only(&self) -> bool {
        self.status_only
    }

    pub fn batch(&self) -> Option<BatchSpec> {
        self.batch
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// Flatten repeated, comma-separated flag values, preserving order and duplicates.
fn split_list(flag: &'static str, values: &[String]) -> Result<Vec<String>, ArgError> {
    let mut items = Vec::new();
    for value in values {
        for item in value.split(',') {
            let item = item.trim();
            if item.is_empty() {
                return Err(ArgError::EmptyItem { flag });
            }
            items.push(item.to_string());
        }
    }
    Ok(items)
}

/// Accept only plain ASCII digits: no sign, no whitespace, no empty string.
fn parse_seconds(flag: &'static str, value: &str) -> Result<u64, ArgError> {
    let invalid = || ArgError::InvalidNumber {
        flag,
        value: value.to_string(),
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

fn parse_batch(value: &str) -> Result<BatchSpec, ArgError> {
    let (agents, pause) = match value.split_once(',') {
        Some((agents, pause)) => (agents, Some(pause)),
        None => (value, None),
    };
    let agents = parse_seconds("--batch", agents).map_err(|_| ArgError::InvalidBatch(value.into()))?;
    let pause_secs = pause
        .map(|pause| parse_seconds("--batch", pause))
        .transpose()
        .map_err(|_| ArgError::InvalidBatch(value.into()))?;
    Ok(BatchSpec { agents, pause_secs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_flattens_and_keeps_duplicates() {
        let values = vec!["a,b".to_string(), "a".to_string()];
        assert_eq!(split_list("--host", &values).unwrap(), vec!["a", "b", "a"]);
    }

    #[test]
    fn split_list_rejects_empty_items() {
        let values = vec!["a,,b".to_string()];
        assert_eq!(
            split_list("--pause", &values),
            Err(ArgError::EmptyItem { flag: "--pause" })
        );
    }

    #[test]
    fn parse_seconds_accepts_digits_only() {
        assert_eq!(parse_seconds("--timeout", "0"), Ok(0));
        assert_eq!(parse_seconds("--timeout", "120"), Ok(120));
        for bad in ["", "+5", "-1", " 5", "5s", "1.5"] {
            assert!(parse_seconds("--timeout", bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn parse_seconds_rejects_overflow() {
        assert!(parse_seconds("--timeout", "99999999999999999999999").is_err());
    }

    #[test]
    fn parse_batch_with_and_without_pause() {
        assert_eq!(
            parse_batch("10"),
            Ok(BatchSpec {
                agents: 10,
                pause_secs: None
            })
        );
        assert_eq!(
            parse_batch("10,30"),
            Ok(BatchSpec {
                agents: 10,
                pause_secs: Some(30)
            })
        );
        assert!(parse_batch("ten").is_err());
        assert!(parse_batch("10,").is_err());
    }
}
