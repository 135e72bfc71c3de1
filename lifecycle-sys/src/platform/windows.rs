// SPDX-License-Identifier: GPL-3.0-only

//! Windows command strategy: `wmic logicaldisk` discovery, `format`/`mountvol`
//! mutations. Wiping filesystem signatures has no Windows equivalent here.

use tracing::warn;

use lifecycle_types::{CommandSpec, Disk, DiskDraft};

use crate::error::{Result, SysError};

use super::Platform;

const BYTES_PER_MB: u64 = 1024 * 1024;

pub struct WindowsPlatform;

impl WindowsPlatform {
    /// Drive designator without a trailing colon ("C" from "C:" or "C").
    fn drive_letter(name: &str) -> String {
        name.trim_end_matches(':').to_string()
    }
}

impl Platform for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn discovery_command(&self) -> CommandSpec {
        CommandSpec::new([
            "wmic",
            "logicaldisk",
            "get",
            "caption,size,filesystem,volumename",
        ])
    }

    fn parse_discovery(&self, stdout: &str) -> Result<Vec<DiskDraft>> {
        if stdout.trim().is_empty() {
            return Err(SysError::Discovery("wmic produced no output".into()));
        }

        // First line is the column header; wmic orders columns
        // alphabetically: Caption, FileSystem, Size, VolumeName.
        let mut drafts = Vec::new();
        for line in stdout.trim().lines().skip(1) {
            let values: Vec<&str> = line.split_whitespace().collect();
            if values.len() < 3 {
                if !values.is_empty() {
                    warn!("skipping unparseable logical disk line: '{line}'");
                }
                continue;
            }

            let size_bytes: u64 = match values[2].parse() {
                Ok(bytes) => bytes,
                Err(_) => {
                    warn!("skipping logical disk '{}': bad size '{}'", values[0], values[2]);
                    continue;
                }
            };

            drafts.push(DiskDraft {
                name: values[0].to_string(),
                size_mb: size_bytes / BYTES_PER_MB,
                filesystem: values[1].to_string(),
                mountpoint: values.get(3).map(|v| v.to_string()).unwrap_or_default(),
            });
        }

        if drafts.is_empty() {
            return Err(SysError::Discovery(
                "wmic output contained no logical disks".into(),
            ));
        }

        Ok(drafts)
    }

    fn format_command(&self, disk: &Disk) -> Result<CommandSpec> {
        let target = format!("{}:", Self::drive_letter(&disk.name));
        Ok(CommandSpec::new([
            "format",
            target.as_str(),
            "/FS:NTFS",
            "/Q",
        ]))
    }

    fn mount_command(&self, disk: &Disk, mountpoint: &str) -> Result<CommandSpec> {
        if mountpoint.is_empty() {
            return Err(SysError::Parse(format!(
                "no mountpoint given for disk '{}'",
                disk.name
            )));
        }
        Ok(CommandSpec::new(["mountvol", disk.name.as_str(), mountpoint]).idempotent())
    }

    fn unmount_command(&self, disk: &Disk) -> Result<CommandSpec> {
        // The drive letter comes from the mountpoint, which the mount step
        // recorded (e.g. "D:\\data" or "D:").
        let letter = disk
            .mountpoint
            .split(':')
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();

        if letter.len() != 1 || !letter.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(SysError::Parse(format!(
                "invalid drive letter in mountpoint '{}'",
                disk.mountpoint
            )));
        }

        let target = format!("{letter}:");
        Ok(CommandSpec::new(["mountvol", target.as_str(), "/p"]).idempotent())
    }

    fn wipe_command(&self, disk: &Disk) -> Result<CommandSpec> {
        Err(SysError::UnsupportedPlatform(format!(
            "wipe is not supported on Windows (disk '{}')",
            disk.name
        )))
    }
}
