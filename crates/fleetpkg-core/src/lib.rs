//! fleetpkg core library
//!
//! Drives package installs, downgrades and verification across a fleet
//! through the mcollective `mco rpc` broker, polling package status until the
//! fleet converges.

pub mod broker;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod invoker;
pub mod orchestration;
pub mod plan;
pub mod poll;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{BatchSpec, OutputFormat, RawArgs, RunConfig, Settings, Timing, Verbosity};

    // Broker
    pub use crate::broker::{Action, BrokerRequest, BrokerTransport, McoBroker, ScriptedBroker};

    // Errors
    pub use crate::error::{ArgError, IdentityError, RunError};

    // Identity
    pub use crate::identity::{FixedIdentity, IdentityProvider, SystemIdentity, ensure_operator};

    // Orchestration
    pub use crate::orchestration::{Console, Orchestrator, PairReport, RunOutcome, RunReport};

    // Polling
    pub use crate::poll::{Poller, Sleeper, ThreadSleeper};

    // Values
    pub use crate::types::{FilterAttr, HostPattern, HostStatus, PackageSpec};
}
