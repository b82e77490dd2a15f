//! Test-double broker that records requests and replays scripted replies.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use super::{Action, BrokerRequest, BrokerTransport, CommandOutput};

/// Scripted broker for exercising the orchestrator without a fleet.
///
/// Status replies are queued per package name. Each status request pops the
/// next reply; once a queue has one entry left, that entry is repeated.
/// Packages with no script reply with an empty listing. Mutating actions
/// succeed unless marked with [`ScriptedBroker::failing`].
#[derive(Debug, Default)]
pub struct ScriptedBroker {
    batching: bool,
    status: RefCell<HashMap<String, VecDeque<String>>>,
    failing: HashSet<Action>,
    requests: RefCell<Vec<BrokerRequest>>,
}

impl ScriptedBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batching(mut self, supported: bool) -> Self {
        self.batching = supported;
        self
    }

    /// Queue a status reply for `package` listing `(host, ensure)` pairs.
    pub fn with_status(self, package: &str, hosts: &[(&str, &str)]) -> Self {
        self.status
            .borrow_mut()
            .entry(package.to_string())
            .or_default()
            .push_back(render_status(hosts));
        self
    }

    /// Make every request for `action` report a failure.
    pub fn failing(mut self, action: Action) -> Self {
        self.failing.insert(action);
        self
    }

    pub fn requests(&self) -> Vec<BrokerRequest> {
        self.requests.borrow().clone()
    }

    /// Recorded requests for one action, in order.
    pub fn requests_for(&self, action: Action) -> Vec<BrokerRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|request| request.action == action)
            .cloned()
            .collect()
    }

    fn next_status(&self, package: &str) -> String {
        let mut status = self.status.borrow_mut();
        let Some(queue) = status.get_mut(package) else {
            return render_status(&[]);
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        }
    }
}

impl BrokerTransport for ScriptedBroker {
    fn execute(&self, request: &BrokerRequest) -> anyhow::Result<CommandOutput> {
        self.requests.borrow_mut().push(request.clone());

        if self.failing.contains(&request.action) {
            return Ok(CommandOutput {
                stdout: format!("{}\t\tRequest Aborted\n", request.target),
                stderr: format!("{} failed on {}\n", request.action, request.target),
                success: false,
            });
        }

        let stdout = match request.action {
            Action::PackageStatus => self.next_status(request.param("package").unwrap_or_default()),
            _ => format!(
                "{}\n   Status: OK\n\nFinished processing 1 / 1 hosts in 1.00 ms\n",
                request.target
            ),
        };

        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
            success: true,
        })
    }

    fn supports_batching(&self) -> anyhow::Result<bool> {
        Ok(self.batching)
    }
}

/// Render `(host, ensure)` pairs the way `mco rpc package status` prints them.
pub fn render_status(hosts: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (host, ensure) in hosts {
        out.push_str(host);
        out.push('\n');
        out.push_str("     Arch: x86_64\n");
        out.push_str(&format!("   Ensure: {ensure}\n\n"));
    }
    out.push_str(&format!(
        "Finished processing {0} / {0} hosts in 10.00 ms\n",
        hosts.len()
    ));
    out
}
