//! Remote-execution broker seam.
//!
//! The broker (mcollective) fans one request out to every host matched by a
//! filter and returns line-oriented text. This module models the request,
//! the transport trait, and the text parsing that turns replies into
//! [`HostStatus`](crate::types::HostStatus) lists.
//!
//! - [`McoBroker`] spawns the real `mco rpc` command.
//! - [`ScriptedBroker`] records requests and replays canned replies for tests.

mod mco;
mod mock;
pub mod parse;

use std::fmt;

pub use mco::McoBroker;
pub use mock::{ScriptedBroker, render_status};

use crate::config::BatchSpec;
use crate::types::HostPattern;

/// Agent/action pairs the orchestrator issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    PackageInstall,
    PackageUninstall,
    PackageStatus,
    ServiceStart,
    ServiceStop,
    ServiceRestart,
}

impl Action {
    pub fn agent(self) -> &'static str {
        match self {
            Action::PackageInstall | Action::PackageUninstall | Action::PackageStatus => "package",
            Action::ServiceStart | Action::ServiceStop | Action::ServiceRestart => "service",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::PackageInstall => "install",
            Action::PackageUninstall => "uninstall",
            Action::PackageStatus => "status",
            Action::ServiceStart => "start",
            Action::ServiceStop => "stop",
            Action::ServiceRestart => "restart",
        }
    }

    /// Whether the action changes state on the target hosts.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Action::PackageStatus)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.agent(), self.name())
    }
}

/// One broker call: filter, action, parameters and optional batching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerRequest {
    pub target: HostPattern,
    pub action: Action,
    pub params: Vec<(String, String)>,
    pub batch: Option<BatchSpec>,
}

impl BrokerRequest {
    pub fn new(target: HostPattern, action: Action) -> Self {
        Self {
            target,
            action,
            params: Vec::new(),
            batch: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_batch(mut self, batch: Option<BatchSpec>) -> Self {
        self.batch = batch;
        self
    }

    /// Value of the first parameter named `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Arguments after the broker executable, e.g.
    /// `rpc --np -F hostname=web01 package install package=httpd`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["rpc".to_string()];
        if let Some(batch) = self.batch {
            args.push("--batch".to_string());
            args.push(batch.agents.to_string());
            if let Some(pause) = batch.pause_secs {
                args.push("--batch-sleep".to_string());
                args.push(pause.to_string());
            }
        }
        args.push("--np".to_string());
        args.push("-F".to_string());
        args.push(self.target.filter_expr());
        args.push(self.action.agent().to_string());
        args.push(self.action.name().to_string());
        args.extend(self.params.iter().map(|(k, v)| format!("{k}={v}")));
        args
    }
}

/// Captured process output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit status was zero.
    pub success: bool,
}

/// Executes broker requests. Implementations block until the broker's fan-out completes.
pub trait BrokerTransport {
    fn execute(&self, request: &BrokerRequest) -> anyhow::Result<CommandOutput>;

    /// Capability probe: does this broker accept batching options?
    fn supports_batching(&self) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_args_place_filter_before_agent() {
        let request = BrokerRequest::new(HostPattern::new("web01"), Action::PackageInstall)
            .with_param("package", "httpd-2.2.3-33");
        assert_eq!(
            request.to_args(),
            vec![
                "rpc",
                "--np",
                "-F",
                "hostname=web01",
                "package",
                "install",
                "package=httpd-2.2.3-33"
            ]
        );
    }

    #[test]
    fn request_args_include_batching() {
        let request = BrokerRequest::new(HostPattern::new("web.example.com"), Action::ServiceStop)
            .with_param("service", "httpd")
            .with_batch(Some(BatchSpec {
                agents: 5,
                pause_secs: Some(30),
            }));
        let args = request.to_args();
        assert_eq!(&args[..5], ["rpc", "--batch", "5", "--batch-sleep", "30"]);
        assert!(args.contains(&"fqdn=web.example.com".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("service=httpd"));
    }

    #[test]
    fn only_status_is_read_only() {
        assert!(!Action::PackageStatus.is_mutating());
        assert!(Action::PackageInstall.is_mutating());
        assert!(Action::ServiceRestart.is_mutating());
        assert_eq!(Action::ServiceRestart.to_string(), "service restart");
    }
}
