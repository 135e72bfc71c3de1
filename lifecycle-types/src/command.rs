// SPDX-License-Identifier: GPL-3.0-only

//! Structured command descriptors and execution results
//!
//! Commands are always carried as an ordered argument vector. Joining the
//! vector into a single shell string and re-splitting it corrupts arguments
//! containing spaces, so no API in this workspace accepts a command as one
//! string.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Conventional "operation already in the desired state" exit code used by
/// mount/unmount-class commands on some platforms.
pub const ALREADY_DONE_EXIT_CODE: i32 = 64;

/// Description of one external command invocation.
///
/// The privilege secret is deliberately absent: it is held by the runner and
/// delivered over the child's stdin, never through argv.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program followed by its arguments, in order
    pub argv: Vec<String>,

    /// Whether the runner must supply the privilege secret on stdin
    pub requires_privilege: bool,

    /// Whether exit code 64 counts as success (mount/unmount class)
    pub accept_already_done: bool,
}

impl CommandSpec {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            requires_privilege: false,
            accept_already_done: false,
        }
    }

    pub fn privileged(mut self) -> Self {
        self.requires_privilege = true;
        self
    }

    pub fn idempotent(mut self) -> Self {
        self.accept_already_done = true;
        self
    }

    /// Program name, for diagnostics. Empty argv yields an empty program.
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    /// Rendered argv for log lines. Safe to log: secrets never enter argv.
    pub fn rendered(&self) -> String {
        self.argv.join(" ")
    }
}

/// Outcome of one external command invocation. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code; `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,

    pub stdout: String,
    pub stderr: String,

    /// Whether the exit code satisfies the policy of the `CommandSpec` that
    /// produced this result (0, or 64 for already-done-tolerant commands)
    pub succeeded: bool,

    /// Wall-clock duration of the invocation
    pub duration: Duration,
}

impl CommandResult {
    /// Apply the exit-code policy for a spec to a raw exit code.
    pub fn exit_code_succeeded(spec: &CommandSpec, exit_code: Option<i32>) -> bool {
        match exit_code {
            Some(0) => true,
            Some(ALREADY_DONE_EXIT_CODE) => spec.accept_already_done,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_zero_always_succeeds() {
        let spec = CommandSpec::new(["mkfs.ext4", "-F", "/dev/sdb"]);
        assert!(CommandResult::exit_code_succeeded(&spec, Some(0)));
    }

    #[test]
    fn sentinel_succeeds_only_for_idempotent_commands() {
        let mount = CommandSpec::new(["mount", "/dev/sdb", "/mnt/data"]).idempotent();
        let format = CommandSpec::new(["mkfs.ext4", "-F", "/dev/sdb"]);
        assert!(CommandResult::exit_code_succeeded(&mount, Some(64)));
        assert!(!CommandResult::exit_code_succeeded(&format, Some(64)));
    }

    #[test]
    fn signal_termination_never_succeeds() {
        let spec = CommandSpec::new(["mount", "/dev/sdb", "/mnt/data"]).idempotent();
        assert!(!CommandResult::exit_code_succeeded(&spec, None));
    }
}
