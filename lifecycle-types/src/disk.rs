// SPDX-License-Identifier: GPL-3.0-only

//! Disk record and lifecycle state models
//!
//! A `Disk` is the persisted, normalized view of a storage volume known to
//! the system. Records are created by the reconciler (first discovery) or by
//! an explicit registration, mutated only by controller transitions, and
//! removed only by an explicit remove.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a disk record.
///
/// `Wiped` is terminal-ish: it typically precedes removal of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskState {
    Discovered,
    Formatted,
    Mounted,
    Unmounted,
    Wiped,
}

impl std::fmt::Display for DiskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DiskState::Discovered => "discovered",
            DiskState::Formatted => "formatted",
            DiskState::Mounted => "mounted",
            DiskState::Unmounted => "unmounted",
            DiskState::Wiped => "wiped",
        };
        f.write_str(label)
    }
}

/// Persisted record of a storage volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    /// Opaque identifier assigned by the datastore, stable for the record's
    /// lifetime
    pub id: Uuid,

    /// Device/volume identifier as reported by the OS (e.g. "sda", "C:").
    /// Unique among live records
    pub name: String,

    /// Total size normalized to megabytes regardless of source unit
    pub size_mb: u64,

    /// Filesystem label (e.g. "ext4", "NTFS"); may be a placeholder when
    /// discovery cannot determine it precisely
    pub filesystem: String,

    /// Path under which the device's contents are accessible; empty when
    /// unmounted
    pub mountpoint: String,

    /// Current lifecycle state
    pub state: DiskState,

    /// Timestamp of first persistence
    pub created_at: DateTime<Utc>,
}

impl Disk {
    pub fn is_mounted(&self) -> bool {
        self.state == DiskState::Mounted
    }
}

/// Unpersisted disk data, as emitted by discovery or accepted by an explicit
/// registration. The datastore assigns `id`, `state` and `created_at` at
/// insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskDraft {
    pub name: String,
    pub size_mb: u64,
    pub filesystem: String,
    #[serde(default)]
    pub mountpoint: String,
}

impl DiskDraft {
    pub fn new(name: impl Into<String>, size_mb: u64, filesystem: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_mb,
            filesystem: filesystem.into(),
            mountpoint: String::new(),
        }
    }
}
