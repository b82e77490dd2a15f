//! Production transport: spawns the broker executable.

use std::process::Command;

use anyhow::Context;
use tracing::debug;

use super::{BrokerRequest, BrokerTransport, CommandOutput};

/// Runs `mco rpc ...` (or whatever `broker_command` names) as a child process.
#[derive(Debug, Clone)]
pub struct McoBroker {
    program: String,
}

impl McoBroker {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl BrokerTransport for McoBroker {
    fn execute(&self, request: &BrokerRequest) -> anyhow::Result<CommandOutput> {
        let args = request.to_args();
        debug!(command = %format!("{} {}", self.program, args.join(" ")), "invoking broker");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to invoke {} for {}", self.program, request.action))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        })
    }

    fn supports_batching(&self) -> anyhow::Result<bool> {
        let output = Command::new(&self.program)
            .args(["rpc", "--help"])
            .output()
            .with_context(|| format!("Failed to run {} rpc --help", self.program))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(stdout.contains("--batch") || stderr.contains("--batch"))
    }
}
