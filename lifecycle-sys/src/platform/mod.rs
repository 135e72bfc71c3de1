// SPDX-License-Identifier: GPL-3.0-only

//! Per-platform command strategy
//!
//! All OS-conditional behavior lives behind [`Platform`], selected exactly
//! once at startup by [`detect_platform`]. Callers never branch on the OS
//! themselves.

mod linux;
mod windows;

use std::sync::Arc;

use which::which;

use lifecycle_types::{CommandSpec, Disk, DiskDraft};

pub use linux::LinuxPlatform;
pub use windows::WindowsPlatform;

use crate::error::{Result, SysError};

/// OS-specific command templates and discovery parsing.
pub trait Platform: Send + Sync {
    /// Short name for logs ("linux", "windows").
    fn name(&self) -> &'static str;

    /// The block-device/volume listing command.
    fn discovery_command(&self) -> CommandSpec;

    /// Parse the discovery command's stdout into normalized drafts.
    ///
    /// A single malformed entry is skipped with a diagnostic; only totally
    /// unusable output is an error.
    fn parse_discovery(&self, stdout: &str) -> Result<Vec<DiskDraft>>;

    fn format_command(&self, disk: &Disk) -> Result<CommandSpec>;

    fn mount_command(&self, disk: &Disk, mountpoint: &str) -> Result<CommandSpec>;

    fn unmount_command(&self, disk: &Disk) -> Result<CommandSpec>;

    fn wipe_command(&self, disk: &Disk) -> Result<CommandSpec>;
}

/// Probe the host once and return the matching strategy.
///
/// The probe checks both the compile-target OS and that the discovery binary
/// is actually installed, and is not repeated per call.
pub fn detect_platform() -> Result<Arc<dyn Platform>> {
    if cfg!(target_os = "windows") {
        which("wmic").map_err(|_| {
            SysError::UnsupportedPlatform("wmic not found in PATH".into())
        })?;
        Ok(Arc::new(WindowsPlatform))
    } else if cfg!(target_os = "linux") {
        which("lsblk").map_err(|_| {
            SysError::UnsupportedPlatform("lsblk not found in PATH".into())
        })?;
        Ok(Arc::new(LinuxPlatform))
    } else {
        Err(SysError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }
}
