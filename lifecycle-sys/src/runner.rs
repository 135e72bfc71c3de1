// SPDX-License-Identifier: GPL-3.0-only

//! External command execution
//!
//! [`ProcessRunner`] is the production implementation; the controller and
//! the discoverer only see the [`CommandExecutor`] trait so tests can
//! substitute a fake.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use lifecycle_types::{CommandResult, CommandSpec};

use crate::error::{Result, SysError};

/// A privilege secret held by the runner.
///
/// The wrapper exists so the value cannot leak through `Debug` formatting or
/// accidental logging; it is only ever written to a child's stdin.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Executor seam between the lifecycle core and the OS.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run one external command to completion.
    ///
    /// Returns `Ok` only when the exit code satisfies the `CommandSpec` policy
    /// (0, or 64 for already-done-tolerant commands). Every other outcome is
    /// an error; a failed command never comes back as a default success.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandResult>;
}

/// Spawns real OS processes from structured command descriptors.
pub struct ProcessRunner {
    secret: Option<Secret>,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(secret: Option<Secret>, timeout: Duration) -> Self {
        Self { secret, timeout }
    }
}

#[async_trait]
impl CommandExecutor for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
        let program = spec
            .argv
            .first()
            .ok_or_else(|| SysError::Parse("empty argv".into()))?;

        // Argv is passed through verbatim. It is never joined into a shell
        // string and re-split, so arguments containing spaces stay intact.
        let mut command = Command::new(program);
        command
            .args(&spec.argv[1..])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let wants_secret = spec.requires_privilege && self.secret.is_some();
        if wants_secret {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::null());
        }

        debug!("running: {}", spec.rendered());
        let started = Instant::now();

        let mut child = command.spawn().map_err(|e| SysError::Spawn {
            program: program.clone(),
            detail: e.to_string(),
        })?;

        if wants_secret {
            if let (Some(mut stdin), Some(secret)) = (child.stdin.take(), self.secret.as_ref()) {
                stdin.write_all(secret.0.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                // Dropping the handle closes the stream so the child never
                // waits for more input.
                drop(stdin);
            }
        }

        // kill_on_drop tears the child down when the timeout wins the race.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(SysError::CommandTimeout {
                    program: program.clone(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let duration = started.elapsed();
        let exit_code = output.status.code();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let succeeded = CommandResult::exit_code_succeeded(spec, exit_code);

        debug!(
            "{} exited with code {:?} after {:?}",
            program, exit_code, duration
        );

        if !succeeded {
            // A non-zero, non-sentinel exit with empty stderr still fails,
            // just with empty detail.
            return Err(SysError::CommandFailed {
                program: program.clone(),
                exit_code,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandResult {
            exit_code,
            stdout,
            stderr,
            succeeded,
            duration,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn runner() -> ProcessRunner {
        ProcessRunner::new(None, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn captures_stdout_on_success() {
        let spec = CommandSpec::new(["/bin/sh", "-c", "echo hello"]);
        let result = runner().run(&spec).await.expect("echo should succeed");
        assert_eq!(result.exit_code, Some(0));
        assert!(result.succeeded);
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_fails_even_with_empty_stderr() {
        let spec = CommandSpec::new(["/bin/sh", "-c", "exit 3"]);
        match runner().run(&spec).await {
            Err(SysError::CommandFailed {
                exit_code, stderr, ..
            }) => {
                assert_eq!(exit_code, Some(3));
                assert!(stderr.is_empty());
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sentinel_exit_succeeds_for_idempotent_specs() {
        let spec = CommandSpec::new(["/bin/sh", "-c", "exit 64"]).idempotent();
        let result = runner().run(&spec).await.expect("exit 64 should pass");
        assert_eq!(result.exit_code, Some(64));
        assert!(result.succeeded);
    }

    #[tokio::test]
    async fn slow_commands_are_killed_at_the_timeout() {
        let runner = ProcessRunner::new(None, Duration::from_millis(100));
        let spec = CommandSpec::new(["/bin/sh", "-c", "sleep 10"]);
        match runner.run(&spec).await {
            Err(SysError::CommandTimeout { program, .. }) => assert_eq!(program, "/bin/sh"),
            other => panic!("expected CommandTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn secret_goes_to_stdin_not_argv() {
        let runner = ProcessRunner::new(Some(Secret::new("hunter2")), Duration::from_secs(5));
        let spec = CommandSpec::new(["/bin/cat"]).privileged();
        assert!(!spec.argv.iter().any(|arg| arg.contains("hunter2")));
        let result = runner.run(&spec).await.expect("cat should succeed");
        assert_eq!(result.stdout, "hunter2\n");
    }

    #[test]
    fn secret_debug_is_redacted() {
        let formatted = format!("{:?}", Secret::new("hunter2"));
        assert!(!formatted.contains("hunter2"));
    }
}
