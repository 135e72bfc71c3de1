// SPDX-License-Identifier: GPL-3.0-only

//! Disk discovery - runs the platform's listing command and normalizes its
//! output into disk drafts.

use std::sync::Arc;

use tracing::debug;

use lifecycle_types::DiskDraft;

use crate::error::{Result, SysError};
use crate::platform::Platform;
use crate::runner::CommandExecutor;

/// Queries the OS for currently visible storage volumes.
pub struct DiskDiscoverer {
    platform: Arc<dyn Platform>,
    runner: Arc<dyn CommandExecutor>,
}

impl DiskDiscoverer {
    pub fn new(platform: Arc<dyn Platform>, runner: Arc<dyn CommandExecutor>) -> Self {
        Self { platform, runner }
    }

    /// Run one discovery pass.
    ///
    /// Fails only when the discovery command itself fails or its output is
    /// entirely unusable; individual malformed entries are skipped inside
    /// the platform parser.
    pub async fn discover(&self) -> Result<Vec<DiskDraft>> {
        let spec = self.platform.discovery_command();
        debug!("discovering disks on {}", self.platform.name());

        let result = self.runner.run(&spec).await.map_err(|e| match e {
            SysError::Discovery(_) => e,
            other => SysError::Discovery(other.to_string()),
        })?;

        let drafts = self.platform.parse_discovery(&result.stdout)?;
        debug!("discovered {} disks", drafts.len());
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use lifecycle_types::{CommandResult, CommandSpec};

    use super::*;
    use crate::platform::LinuxPlatform;

    struct CannedRunner {
        stdout: &'static str,
    }

    #[async_trait]
    impl CommandExecutor for CannedRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
            assert_eq!(spec.argv, vec!["lsblk", "-J"]);
            Ok(CommandResult {
                exit_code: Some(0),
                stdout: self.stdout.to_string(),
                stderr: String::new(),
                succeeded: true,
                duration: Duration::from_millis(1),
            })
        }
    }

    struct FailingRunner;

    #[async_trait]
    impl CommandExecutor for FailingRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
            Err(SysError::CommandFailed {
                program: spec.program().to_string(),
                exit_code: Some(127),
                stderr: "lsblk: not found".into(),
            })
        }
    }

    #[tokio::test]
    async fn discovery_normalizes_platform_output() {
        let discoverer = DiskDiscoverer::new(
            Arc::new(LinuxPlatform),
            Arc::new(CannedRunner {
                stdout: r#"{"blockdevices": [{"name": "sda", "type": "disk", "size": "1G"}]}"#,
            }),
        );
        let drafts = discoverer.discover().await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name, "sda");
        assert_eq!(drafts[0].size_mb, 1024);
    }

    #[tokio::test]
    async fn a_failed_listing_command_is_a_discovery_error() {
        let discoverer = DiskDiscoverer::new(Arc::new(LinuxPlatform), Arc::new(FailingRunner));
        assert!(matches!(
            discoverer.discover().await,
            Err(SysError::Discovery(_))
        ));
    }
}
