//! Error types for argument validation, the operator precondition and fatal run failures.

use crate::orchestration::RunOutcome;

/// Rejected command line. Always maps to exit code 1.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("missing required parameter: {0}")]
    Missing(&'static str),

    #[error("{0} and {1} cannot be used together")]
    Conflict(&'static str, &'static str),

    #[error("{flag} expects a non-negative integer, got '{value}'")]
    InvalidNumber { flag: &'static str, value: String },

    #[error("--verify expects 'true' or 'false', got '{0}'")]
    InvalidBoolean(String),

    #[error("{flag} contains an empty item")]
    EmptyItem { flag: &'static str },

    #[error("invalid package '{token}': {reason}")]
    InvalidPackage { token: String, reason: &'static str },

    #[error("--batch expects AGENTS[,PAUSE], got '{0}'")]
    InvalidBatch(String),

    #[error("--batch is not supported by this broker")]
    BatchUnsupported,
}

/// The process is not running as the designated operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("must be run as '{expected}', not '{actual}'")]
    Mismatch { expected: String, actual: String },

    #[error("could not determine the current user: {0}")]
    Unavailable(String),
}

/// Fatal orchestration failure. Aborts the remaining hosts and packages.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(
        "{package} was not removed from {target} within {timeout_secs}s; still installed: {}",
        render_values(.present)
    )]
    UninstallTimeout {
        target: String,
        package: String,
        timeout_secs: u64,
        present: Vec<String>,
    },

    #[error(
        "{package} did not converge on {target} within {timeout_secs}s; versions observed: {}",
        render_values(.observed)
    )]
    InstallTimeout {
        target: String,
        package: String,
        timeout_secs: u64,
        observed: Vec<String>,
    },

    #[error("{package} on {target}: requested version {requested}, installed {installed}")]
    VersionMismatch {
        target: String,
        package: String,
        requested: String,
        installed: String,
    },

    /// Broker invocation or local I/O failed.
    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

impl RunError {
    pub fn outcome(&self) -> RunOutcome {
        match self {
            RunError::VersionMismatch { .. } => RunOutcome::VerifyFailure,
            RunError::UninstallTimeout { .. }
            | RunError::InstallTimeout { .. }
            | RunError::Execution(_) => RunOutcome::ActionFailure,
        }
    }
}

fn render_values(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}
