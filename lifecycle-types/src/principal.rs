// SPDX-License-Identifier: GPL-3.0-only

//! Caller identity passed to the authorization gate

use serde::{Deserialize, Serialize};

/// Identity of the caller requesting an operation. The lifecycle manager
/// never authenticates principals itself; it only forwards them to the
/// `Authorizer` collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier of the caller (username, token subject, bus name)
    pub subject: String,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.subject)
    }
}
