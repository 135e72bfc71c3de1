// SPDX-License-Identifier: GPL-3.0-only

//! Linux command strategy: `lsblk -J` discovery, sudo-prefixed mutations
//!
//! Privileged commands are prefixed with `sudo -S -p ""` so sudo reads the
//! password from stdin with no prompt; the runner delivers the secret there.

use serde::Deserialize;
use tracing::warn;

use lifecycle_types::{CommandSpec, Disk, DiskDraft};

use crate::error::{Result, SysError};
use crate::size::convert_size_to_mb;

use super::Platform;

/// Filesystem label recorded when `lsblk` does not report one. Precise
/// detection would need a second query (e.g. `blkid`) per device.
const FALLBACK_FILESYSTEM: &str = "ext4";

pub struct LinuxPlatform;

impl LinuxPlatform {
    fn device_path(name: &str) -> String {
        if name.starts_with('/') {
            name.to_string()
        } else {
            format!("/dev/{name}")
        }
    }

    fn privileged<const N: usize>(argv: [&str; N]) -> CommandSpec {
        let mut full = vec!["sudo".to_string(), "-S".to_string(), "-p".to_string(), String::new()];
        full.extend(argv.iter().map(|arg| arg.to_string()));
        CommandSpec {
            argv: full,
            requires_privilege: true,
            accept_already_done: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LsblkReport {
    #[serde(default)]
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<String>,
    mountpoint: Option<String>,
    fstype: Option<String>,
}

impl Platform for LinuxPlatform {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn discovery_command(&self) -> CommandSpec {
        CommandSpec::new(["lsblk", "-J"])
    }

    fn parse_discovery(&self, stdout: &str) -> Result<Vec<DiskDraft>> {
        if stdout.trim().is_empty() {
            return Err(SysError::Discovery("lsblk produced no output".into()));
        }

        let report: LsblkReport = serde_json::from_str(stdout)
            .map_err(|e| SysError::Discovery(format!("unparseable lsblk JSON: {e}")))?;

        let mut drafts = Vec::new();
        for device in report.blockdevices {
            // Partitions and loop devices are not lifecycle targets.
            if device.kind != "disk" {
                continue;
            }

            let size = match device.size.as_deref() {
                Some(raw) => match convert_size_to_mb(raw) {
                    Ok(mb) => mb,
                    Err(e) => {
                        warn!("skipping device '{}': {e}", device.name);
                        continue;
                    }
                },
                None => {
                    warn!("skipping device '{}': no size reported", device.name);
                    continue;
                }
            };

            drafts.push(DiskDraft {
                name: device.name,
                size_mb: size,
                filesystem: device
                    .fstype
                    .filter(|fs| !fs.is_empty())
                    .unwrap_or_else(|| FALLBACK_FILESYSTEM.to_string()),
                mountpoint: device.mountpoint.unwrap_or_default(),
            });
        }

        Ok(drafts)
    }

    fn format_command(&self, disk: &Disk) -> Result<CommandSpec> {
        let device = Self::device_path(&disk.name);
        Ok(Self::privileged(["mkfs.ext4", "-F", device.as_str()]))
    }

    fn mount_command(&self, disk: &Disk, mountpoint: &str) -> Result<CommandSpec> {
        if mountpoint.is_empty() {
            return Err(SysError::Parse(format!(
                "no mountpoint given for disk '{}'",
                disk.name
            )));
        }
        let device = Self::device_path(&disk.name);
        Ok(Self::privileged(["mount", device.as_str(), mountpoint]).idempotent())
    }

    fn unmount_command(&self, disk: &Disk) -> Result<CommandSpec> {
        let device = Self::device_path(&disk.name);
        Ok(Self::privileged(["umount", "-l", device.as_str()]).idempotent())
    }

    fn wipe_command(&self, disk: &Disk) -> Result<CommandSpec> {
        let device = Self::device_path(&disk.name);
        Ok(Self::privileged(["wipefs", "-a", device.as_str()]))
    }
}
