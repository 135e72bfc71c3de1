// SPDX-License-Identifier: GPL-3.0-only

//! Mapping from sys-layer failures to the shared error taxonomy

use lifecycle_contracts::LifecycleError;
use lifecycle_sys::SysError;

/// Attach action/disk context to a sys-layer error so callers can render a
/// user-facing message and decide about retries.
pub fn map_sys_error(action: &str, disk: &str, error: SysError) -> LifecycleError {
    match error {
        SysError::CommandFailed {
            exit_code, stderr, ..
        } => LifecycleError::CommandFailed {
            action: action.to_string(),
            disk: disk.to_string(),
            exit_code,
            detail: stderr,
        },
        SysError::CommandTimeout { timeout_secs, .. } => LifecycleError::CommandTimeout {
            action: action.to_string(),
            disk: disk.to_string(),
            timeout_secs,
        },
        SysError::UnsupportedPlatform(detail) => LifecycleError::Unsupported(detail),
        SysError::Parse(detail) => LifecycleError::Parse { detail },
        SysError::Discovery(detail) => LifecycleError::Discovery { detail },
        other => LifecycleError::Internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failures_keep_their_context() {
        let mapped = map_sys_error(
            "format",
            "sdb",
            SysError::CommandFailed {
                program: "mkfs.ext4".into(),
                exit_code: Some(1),
                stderr: "device busy".into(),
            },
        );
        match mapped {
            LifecycleError::CommandFailed {
                action,
                disk,
                exit_code,
                detail,
            } => {
                assert_eq!(action, "format");
                assert_eq!(disk, "sdb");
                assert_eq!(exit_code, Some(1));
                assert_eq!(detail, "device busy");
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
