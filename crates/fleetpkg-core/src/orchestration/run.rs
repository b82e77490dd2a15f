//! The rollout state machine.
//!
//! For each host pattern (outer) and package (inner):
//!
//! ```text
//! [pause services] -> [uninstall -> poll absent] -> install -> poll homogeneous
//!     -> [verify version] -> [resume services] -> [refresh services]
//! ```
//!
//! Install and verify failures abort the run. Service failures are recorded
//! and the run continues.

use std::time::Duration;

use serde_json::json;
use tracing::{info, warn};

use crate::broker::{Action, BrokerTransport};
use crate::config::{OutputFormat, RunConfig, Timing};
use crate::error::RunError;
use crate::invoker::{ActionResult, RemoteInvoker, distinct_versions};
use crate::orchestration::{Console, PairReport, RunOutcome, RunReport};
use crate::plan;
use crate::poll::{Poller, Sleeper, install_converged, uninstall_converged};
use crate::types::{HostPattern, HostStatus, PackageSpec};

pub struct Orchestrator<'a> {
    config: &'a RunConfig,
    invoker: RemoteInvoker<'a>,
    sleeper: &'a dyn Sleeper,
    timing: Timing,
    console: Console<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a RunConfig,
        broker: &'a dyn BrokerTransport,
        sleeper: &'a dyn Sleeper,
        timing: Timing,
        console: Console<'a>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            config,
            invoker: RemoteInvoker::new(broker, config.batch())?,
            sleeper,
            timing,
            console,
        })
    }

    /// Run every pair. Consumes the orchestrator so the diagnostic log is released on return.
    pub fn run(mut self) -> RunReport {
        let mut pairs = Vec::new();
        let result = self.run_pairs(&mut pairs);

        let report = match result {
            Ok(()) => RunReport {
                outcome: RunOutcome::Success,
                pairs,
                error: None,
            },
            Err(err) => {
                self.report_failure(&err);
                RunReport {
                    outcome: err.outcome(),
                    pairs,
                    error: Some(err.to_string()),
                }
            }
        };
        let _ = self.console.flush();
        report
    }

    fn run_pairs(&mut self, reports: &mut Vec<PairReport>) -> Result<(), RunError> {
        let config = self.config;
        for (host, package) in plan::pairs(config) {
            let report = if config.status_only() {
                self.show_status(host, package)?
            } else {
                self.rollout(host, package)?
            };
            reports.push(report);
        }
        Ok(())
    }

    fn show_status(
        &mut self,
        host: &HostPattern,
        package: &PackageSpec,
    ) -> Result<PairReport, RunError> {
        let result = self.invoker.package_status(host, package.name())?;
        if !result.success {
            self.console
                .warning(&format!("status query for {} on {host} reported failures", package.name()))?;
        }

        match self.config.format() {
            OutputFormat::Table => {
                self.console.result(&format!("{host} {}", package.name()))?;
                if result.statuses.is_empty() {
                    self.console.result("  (no hosts responded)")?;
                }
                let width = result
                    .statuses
                    .iter()
                    .map(|s| s.host.len())
                    .max()
                    .unwrap_or(0);
                for status in &result.statuses {
                    self.console
                        .result(&format!("  {:<width$}  {}", status.host, status.ensure))?;
                }
            }
            OutputFormat::Json => {
                let line = json!({
                    "target": host.pattern(),
                    "package": package.name(),
                    "hosts": result.statuses,
                });
                self.console.result(&line.to_string())?;
            }
        }

        Ok(PairReport {
            target: host.to_string(),
            package: package.to_string(),
            hosts: result.statuses,
            verified: None,
        })
    }

    fn rollout(
        &mut self,
        host: &HostPattern,
        package: &PackageSpec,
    ) -> Result<PairReport, RunError> {
        info!(%host, %package, "starting rollout");
        let config = self.config;

        if !config.pause_services().is_empty() {
            self.services(host, Action::ServiceStop, config.pause_services())?;
            self.settle(self.timing.pause_settle_secs);
        }

        if config.downgrade() {
            self.remove(host, package)?;
        }

        let hosts = self.install(host, package)?;
        let installed = distinct_versions(&hosts).into_iter().next().unwrap_or_default();

        let verified = if config.verifies(package) {
            self.verify(host, package, &installed)?;
            Some(installed)
        } else {
            None
        };

        if !config.pause_services().is_empty() {
            self.services(host, Action::ServiceStart, config.pause_services())?;
        }
        if !config.refresh_services().is_empty() {
            self.services(host, Action::ServiceRestart, config.refresh_services())?;
        }

        info!(%host, %package, "rollout complete");
        Ok(PairReport {
            target: host.to_string(),
            package: package.to_string(),
            hosts,
            verified,
        })
    }

    /// Best-effort service action; failures are warned about, never fatal.
    fn services(
        &mut self,
        host: &HostPattern,
        action: Action,
        services: &[String],
    ) -> Result<(), RunError> {
        for service in services {
            self.console
                .step(&format!("{action} {service} on {host}"))?;
            let result = self
                .invoker
                .invoke(host, action, &[("service", service.as_str())])?;
            self.echo(&result)?;
            if !result.success {
                warn!(%host, %service, %action, "service action failed");
                self.console
                    .warning(&format!("{action} {service} failed on {host}; continuing"))?;
            }
        }
        Ok(())
    }

    /// Uninstall the bare package name and wait until no host reports it.
    fn remove(&mut self, host: &HostPattern, package: &PackageSpec) -> Result<(), RunError> {
        self.console
            .step(&format!("Removing {} from {host}", package.name()))?;
        let result = self
            .invoker
            .invoke(host, Action::PackageUninstall, &[("package", package.name())])?;
        self.echo(&result)?;
        self.settle(self.timing.action_settle_secs);

        let (converged, last) = self.converge(host, package.name(), uninstall_converged)?;
        if !converged {
            return Err(RunError::UninstallTimeout {
                target: host.to_string(),
                package: package.name().to_string(),
                timeout_secs: self.config.verify_timeout_secs(),
                present: distinct_versions(
                    &last.into_iter().filter(HostStatus::is_present).collect::<Vec<_>>(),
                ),
            });
        }
        Ok(())
    }

    /// Install and wait until every host reports the same Ensure value.
    fn install(
        &mut self,
        host: &HostPattern,
        package: &PackageSpec,
    ) -> Result<Vec<HostStatus>, RunError> {
        let install_target = package.install_target();
        self.console
            .step(&format!("Installing {install_target} on {host}"))?;
        let result = self
            .invoker
            .invoke(host, Action::PackageInstall, &[("package", install_target.as_str())])?;
        self.echo(&result)?;
        self.settle(self.timing.action_settle_secs);

        let (converged, last) = self.converge(host, package.name(), install_converged)?;
        if !converged {
            return Err(RunError::InstallTimeout {
                target: host.to_string(),
                package: package.to_string(),
                timeout_secs: self.config.verify_timeout_secs(),
                observed: distinct_versions(&last),
            });
        }
        Ok(last)
    }

    fn verify(
        &mut self,
        host: &HostPattern,
        package: &PackageSpec,
        installed: &str,
    ) -> Result<(), RunError> {
        let requested = package.version().unwrap_or_default();
        if !package.matches_installed(installed) {
            return Err(RunError::VersionMismatch {
                target: host.to_string(),
                package: package.name().to_string(),
                requested: requested.to_string(),
                installed: installed.to_string(),
            });
        }
        self.console.step(&format!(
            "Verified {} {installed} on {host}",
            package.name()
        ))?;
        Ok(())
    }

    /// Poll, then run one final check if the ceiling was reached.
    fn converge(
        &mut self,
        host: &HostPattern,
        package: &str,
        predicate: fn(&[HostStatus]) -> bool,
    ) -> Result<(bool, Vec<HostStatus>), RunError> {
        let poller = Poller::new(self.sleeper, self.timing.poll_interval_secs);
        let invoker = &mut self.invoker;
        let console = &mut self.console;

        let outcome = poller.poll_until(
            self.config.verify_timeout_secs(),
            || {
                let result = invoker.package_status(host, package)?;
                console.detail(&format!("{package} on {host}: {}", render_hosts(&result.statuses)))?;
                Ok(result.statuses)
            },
            predicate,
        )?;
        if outcome.converged {
            return Ok((true, outcome.last));
        }

        let last = self.invoker.package_status(host, package)?.statuses;
        self.console
            .detail(&format!("final check {package} on {host}: {}", render_hosts(&last)))?;
        Ok((predicate(&last), last))
    }

    fn settle(&self, secs: u64) {
        if secs > 0 {
            self.sleeper.sleep(Duration::from_secs(secs));
        }
    }

    fn echo(&mut self, result: &ActionResult) -> anyhow::Result<()> {
        self.console.broker_output(&result.stdout)
    }

    fn report_failure(&mut self, err: &RunError) {
        let _ = self.console.error(&format!("error: {err}"));
        let diagnostics = self.invoker.diagnostics();
        if diagnostics.is_empty() {
            return;
        }
        match diagnostics.contents() {
            Ok(text) => {
                let _ = self.console.error("broker diagnostics:");
                let _ = self.console.error(text.trim_end());
            }
            Err(e) => warn!(error = %e, "could not read diagnostic log"),
        }
    }
}

fn render_hosts(statuses: &[HostStatus]) -> String {
    if statuses.is_empty() {
        return "no hosts".to_string();
    }
    statuses
        .iter()
        .map(|s| format!("{}={}", s.host, s.ensure))
        .collect::<Vec<_>>()
        .join(", ")
}
