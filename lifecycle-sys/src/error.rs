// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn '{program}': {detail}")]
    Spawn { program: String, detail: String },

    #[error("'{program}' failed (exit code {exit_code:?}): {stderr}")]
    CommandFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("'{program}' exceeded {timeout_secs}s and was killed")]
    CommandTimeout { program: String, timeout_secs: u64 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("discovery produced no usable output: {0}")]
    Discovery(String),

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
