// SPDX-License-Identifier: GPL-3.0-only

//! Operation results returned to presentation layers

use serde::{Deserialize, Serialize};

use crate::Disk;

/// Result of a controller operation: a human-readable status message and the
/// current full disk listing, re-read from the datastore after the operation
/// so callers never render stale state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub message: String,
    pub disks: Vec<Disk>,
}

impl OperationOutcome {
    pub fn new(message: impl Into<String>, disks: Vec<Disk>) -> Self {
        Self {
            message: message.into(),
            disks,
        }
    }
}
