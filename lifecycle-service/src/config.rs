// SPDX-License-Identifier: GPL-3.0-only

//! Service configuration
//!
//! Loaded from a TOML file; every field has a default so the service also
//! runs with no file at all. The privilege secret is read from
//! `DISKLM_SECRET` or from `secret_file`, and its value is never logged.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use lifecycle_sys::Secret;

const SECRET_ENV_VAR: &str = "DISKLM_SECRET";

fn default_command_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Bound on any single external command, after which the process is
    /// killed
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Interval between periodic reconciliation passes; absent means a
    /// single pass at startup only
    #[serde(default)]
    pub reconcile_interval_secs: Option<u64>,

    /// File whose trimmed contents are the privilege secret
    #[serde(default)]
    pub secret_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: default_command_timeout_secs(),
            reconcile_interval_secs: None,
            secret_file: None,
        }
    }
}

impl ServiceConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn reconcile_interval(&self) -> Option<Duration> {
        self.reconcile_interval_secs.map(Duration::from_secs)
    }

    /// Resolve the privilege secret: environment first, then `secret_file`.
    pub fn load_secret(&self) -> anyhow::Result<Option<Secret>> {
        if let Ok(value) = std::env::var(SECRET_ENV_VAR) {
            if !value.is_empty() {
                return Ok(Some(Secret::new(value)));
            }
        }

        match &self.secret_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading secret file {}", path.display()))?;
                Ok(Some(Secret::new(raw.trim_end_matches('\n'))))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let config = ServiceConfig::load(None).unwrap();
        assert_eq!(config.command_timeout_secs, 60);
        assert!(config.reconcile_interval().is_none());
        assert!(config.secret_file.is_none());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: ServiceConfig = toml::from_str("reconcile_interval_secs = 300").unwrap();
        assert_eq!(config.command_timeout_secs, 60);
        assert_eq!(config.reconcile_interval(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<ServiceConfig>("sudo_password = \"oops\"").is_err());
    }
}
