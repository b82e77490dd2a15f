//! Settings file (`fleetpkg.toml`) loading.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the settings file location.
pub const CONFIG_ENV: &str = "FLEETPKG_CONFIG";

const CONFIG_FILE: &str = "fleetpkg.toml";

/// Site-wide defaults for the broker and timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Broker executable, invoked as `<broker_command> rpc ...`.
    pub broker_command: String,
    /// The only user allowed to run fleetpkg.
    pub operator: String,
    pub poll_interval_secs: u64,
    /// Delay after stopping services before touching packages.
    pub pause_settle_secs: u64,
    /// Delay after an install or uninstall before the first status poll.
    pub action_settle_secs: u64,
    /// Default for `--timeout` (reserved, not enforced).
    pub timeout_secs: u64,
    /// Default for `--verifytimeout`.
    pub verify_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            broker_command: "mco".to_string(),
            operator: "root".to_string(),
            poll_interval_secs: 5,
            pause_settle_secs: 10,
            action_settle_secs: 5,
            timeout_secs: 2,
            verify_timeout_secs: 120,
        }
    }
}

/// Timing knobs the orchestrator needs, split out of [`Settings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub poll_interval_secs: u64,
    pub pause_settle_secs: u64,
    pub action_settle_secs: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Settings::default().timing()
    }
}

impl Settings {
    /// Default settings location: `$FLEETPKG_CONFIG`, else `<config_dir>/fleetpkg/fleetpkg.toml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("fleetpkg").join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to built-in defaults.
    pub fn load_default() -> anyhow::Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        if settings.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than zero");
        }
        if settings.broker_command.trim().is_empty() {
            anyhow::bail!("broker_command must not be empty");
        }
        Ok(settings)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            poll_interval_secs: self.poll_interval_secs,
            pause_settle_secs: self.pause_settle_secs,
            action_settle_secs: self.action_settle_secs,
        }
    }
}
