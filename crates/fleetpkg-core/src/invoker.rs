//! Remote action invoker: issues broker requests and collects their output.

use tracing::debug;

use crate::broker::parse::{failure_lines, parse_status};
use crate::broker::{Action, BrokerRequest, BrokerTransport};
use crate::config::BatchSpec;
use crate::diagnostics::DiagnosticLog;
use crate::types::{HostPattern, HostStatus};

/// Outcome of one broker call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionResult {
    pub stdout: String,
    pub stderr: String,
    /// Exit status was zero and no host reported a failure.
    pub success: bool,
    /// Parsed `Ensure` values; empty for non-status actions.
    pub statuses: Vec<HostStatus>,
}

impl ActionResult {
    /// Distinct Ensure values, in first-seen order.
    pub fn distinct_versions(&self) -> Vec<String> {
        distinct_versions(&self.statuses)
    }
}

/// Distinct Ensure values across `statuses`, in first-seen order.
pub fn distinct_versions(statuses: &[HostStatus]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for status in statuses {
        if !seen.iter().any(|v| *v == status.ensure) {
            seen.push(status.ensure.clone());
        }
    }
    seen
}

/// Wraps a transport with the run's batching options and diagnostic log.
pub struct RemoteInvoker<'a> {
    broker: &'a dyn BrokerTransport,
    batch: Option<BatchSpec>,
    diagnostics: DiagnosticLog,
}

impl<'a> RemoteInvoker<'a> {
    pub fn new(
        broker: &'a dyn BrokerTransport,
        batch: Option<BatchSpec>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            broker,
            batch,
            diagnostics: DiagnosticLog::new()?,
        })
    }

    /// Run `action` against `target`. Broker stderr is appended to the diagnostic log.
    pub fn invoke(
        &mut self,
        target: &HostPattern,
        action: Action,
        params: &[(&str, &str)],
    ) -> anyhow::Result<ActionResult> {
        let mut request = BrokerRequest::new(target.clone(), action).with_batch(self.batch);
        for (key, value) in params {
            request = request.with_param(*key, *value);
        }

        let output = self.broker.execute(&request)?;
        self.diagnostics.append(&output.stderr)?;

        let failures = failure_lines(&output.stdout);
        for line in &failures {
            self.diagnostics
                .append(&format!("{action} on {target}: {line}"))?;
        }

        let statuses = if action == Action::PackageStatus {
            parse_status(&output.stdout)
        } else {
            Vec::new()
        };
        debug!(%action, %target, success = output.success, hosts = statuses.len(), "broker call finished");

        Ok(ActionResult {
            success: output.success && failures.is_empty(),
            stdout: output.stdout,
            stderr: output.stderr,
            statuses,
        })
    }

    /// `package status` for `package` across `target`.
    pub fn package_status(
        &mut self,
        target: &HostPattern,
        package: &str,
    ) -> anyhow::Result<ActionResult> {
        self.invoke(target, Action::PackageStatus, &[("package", package)])
    }

    pub fn diagnostics(&mut self) -> &mut DiagnosticLog {
        &mut self.diagnostics
    }
}
