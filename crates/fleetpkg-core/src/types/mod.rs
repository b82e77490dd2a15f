//! Shared value types: host patterns, package specs and per-host status.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArgError;

/// Ensure values reported by the package agent for a package that is not installed.
const ABSENT_STATES: &[&str] = &["absent", "purged"];

/// Host attribute the broker filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterAttr {
    /// Short hostname (no dot in the pattern).
    Hostname,
    /// Fully qualified domain name.
    Fqdn,
}

impl FilterAttr {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterAttr::Hostname => "hostname",
            FilterAttr::Fqdn => "fqdn",
        }
    }
}

/// A host selector handed to the broker as-is.
///
/// The broker expands it (literal, glob or regex) into concrete hosts; we only
/// decide which attribute it binds to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPattern {
    pattern: String,
    attr: FilterAttr,
}

impl HostPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let attr = if pattern.contains('.') {
            FilterAttr::Fqdn
        } else {
            FilterAttr::Hostname
        };
        Self { pattern, attr }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn attr(&self) -> FilterAttr {
        self.attr
    }

    /// Broker filter expression, e.g. `hostname=web01`.
    pub fn filter_expr(&self) -> String {
        format!("{}={}", self.attr.as_str(), self.pattern)
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// A package token from the command line: `name[.version]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    name: String,
    version: Option<String>,
}

impl PackageSpec {
    /// Parse `httpd` or `httpd.2.2.3-33`. The first dot separates name from version.
    pub fn parse(token: &str) -> Result<Self, ArgError> {
        let token = token.trim();
        let (name, version) = match token.split_once('.') {
            Some((name, version)) => (name, Some(version)),
            None => (token, None),
        };

        if name.is_empty() {
            return Err(ArgError::InvalidPackage {
                token: token.to_string(),
                reason: "package name is empty",
            });
        }
        if version.is_some_and(str::is_empty) {
            return Err(ArgError::InvalidPackage {
                token: token.to_string(),
                reason: "version after '.' is empty",
            });
        }

        Ok(Self {
            name: name.to_string(),
            version: version.map(str::to_string),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Value passed to `package install`: `name` or `name-version`.
    pub fn install_target(&self) -> String {
        match &self.version {
            Some(version) => format!("{}-{}", self.name, version),
            None => self.name.clone(),
        }
    }

    /// Whether an installed Ensure value satisfies the requested version.
    ///
    /// Accepts an exact match, or the requested version followed by a
    /// `.`-separated dist/arch suffix (`2.2.3-33` matches `2.2.3-33.el5`).
    /// Always true when no version was requested.
    pub fn matches_installed(&self, installed: &str) -> bool {
        let Some(requested) = self.version.as_deref() else {
            return true;
        };
        let installed = normalize_ensure(installed);
        match installed.strip_prefix(requested) {
            Some("") => true,
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}.{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

/// One `(host, Ensure)` pair extracted from a package status reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatus {
    pub host: String,
    pub ensure: String,
}

impl HostStatus {
    pub fn new(host: impl Into<String>, ensure: impl AsRef<str>) -> Self {
        Self {
            host: host.into(),
            ensure: normalize_ensure(ensure.as_ref()).to_string(),
        }
    }

    /// True unless the package agent reports the package as absent or purged.
    pub fn is_present(&self) -> bool {
        !ABSENT_STATES
            .iter()
            .any(|state| self.ensure.eq_ignore_ascii_case(state))
    }
}

/// Trim whitespace and surrounding quotes from a raw Ensure value.
pub fn normalize_ensure(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}
