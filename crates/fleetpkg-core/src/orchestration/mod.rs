//! Per-host, per-package rollout orchestration.

pub mod console;
pub mod run;

use serde::Serialize;

pub use console::Console;
pub use run::Orchestrator;

use crate::types::HostStatus;

/// Terminal classification of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOutcome {
    Success,
    InvalidArgs,
    ActionFailure,
    VerifyFailure,
}

impl RunOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Success => 0,
            RunOutcome::InvalidArgs => 1,
            RunOutcome::ActionFailure => 2,
            RunOutcome::VerifyFailure => 3,
        }
    }
}

/// What one (host pattern, package) iteration observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairReport {
    pub target: String,
    pub package: String,
    /// Last status listing seen for this pair.
    pub hosts: Vec<HostStatus>,
    /// Installed version compared against the request, when verification ran.
    pub verified: Option<String>,
}

/// Result of a whole run. Pairs after a fatal error are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub pairs: Vec<PairReport>,
    pub error: Option<String>,
}

impl RunReport {
    pub fn exit_code(&self) -> u8 {
        self.outcome.exit_code()
    }
}
