//! Fixed-interval convergence polling over package status queries.

use std::time::Duration;

use tracing::debug;

use crate::invoker::distinct_versions;
use crate::types::HostStatus;

/// Blocking sleep, injected so tests can run without real delays.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// No host still reports the package as installed.
pub fn uninstall_converged(statuses: &[HostStatus]) -> bool {
    !statuses.iter().any(HostStatus::is_present)
}

/// Every host reports the same Ensure value. Says nothing about which value.
pub fn install_converged(statuses: &[HostStatus]) -> bool {
    distinct_versions(statuses).len() == 1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub converged: bool,
    /// Query/sleep cycles performed.
    pub cycles: u32,
    /// Statuses from the most recent query.
    pub last: Vec<HostStatus>,
}

#[derive(Clone, Copy)]
pub struct Poller<'a> {
    sleeper: &'a dyn Sleeper,
    interval_secs: u64,
}

impl<'a> Poller<'a> {
    pub fn new(sleeper: &'a dyn Sleeper, interval_secs: u64) -> Self {
        Self {
            sleeper,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Query until `predicate` holds or the remaining time drops below one interval.
    ///
    /// Each cycle is one query followed, when unsatisfied, by one sleep. A
    /// non-converged outcome is not a verdict: callers run one final check.
    pub fn poll_until<Q, P>(
        &self,
        timeout_secs: u64,
        mut query: Q,
        predicate: P,
    ) -> anyhow::Result<PollOutcome>
    where
        Q: FnMut() -> anyhow::Result<Vec<HostStatus>>,
        P: Fn(&[HostStatus]) -> bool,
    {
        let mut remaining = timeout_secs;
        let mut cycles = 0;
        let mut last = Vec::new();

        while remaining >= self.interval_secs {
            last = query()?;
            cycles += 1;
            if predicate(&last) {
                debug!(cycles, "converged");
                return Ok(PollOutcome {
                    converged: true,
                    cycles,
                    last,
                });
            }
            self.sleeper.sleep(Duration::from_secs(self.interval_secs));
            remaining -= self.interval_secs;
        }

        debug!(cycles, timeout_secs, "poll ceiling reached");
        Ok(PollOutcome {
            converged: false,
            cycles,
            last,
        })
    }
}
