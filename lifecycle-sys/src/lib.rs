// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for the disk lifecycle manager
//!
//! This crate owns everything that touches the OS directly:
//! - spawning external commands, with optional secret delivery over stdin
//! - the per-platform command templates (format/mount/unmount/wipe/discovery)
//! - parsing discovery output into normalized disk drafts
//!
//! Privileged operations never receive the secret through argv; the runner
//! writes it to the child's input stream and closes it.

pub mod discovery;
pub mod error;
pub mod platform;
pub mod runner;
pub mod size;

pub use discovery::DiskDiscoverer;
pub use error::{Result, SysError};
pub use platform::{detect_platform, LinuxPlatform, Platform, WindowsPlatform};
pub use runner::{CommandExecutor, ProcessRunner, Secret};
pub use size::convert_size_to_mb;
