// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse error classification, mappable onto transport status codes by a
/// presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleErrorKind {
    Discovery,
    Parse,
    CommandFailed,
    CommandTimeout,
    Conflict,
    NotFound,
    Unauthorized,
    Unsupported,
    Internal,
}

impl LifecycleErrorKind {
    pub fn code(self) -> u16 {
        match self {
            Self::Discovery => 502,
            Self::Parse => 422,
            Self::CommandFailed => 502,
            Self::CommandTimeout => 504,
            Self::Conflict => 409,
            Self::NotFound => 404,
            Self::Unauthorized => 403,
            Self::Unsupported => 501,
            Self::Internal => 500,
        }
    }
}

/// Structured failures surfaced by the lifecycle core.
///
/// Every variant carries enough context (action, disk identifier, underlying
/// detail) to render a user-facing message and to decide whether a retry is
/// worthwhile. Nothing in the core masks a failure behind an empty success
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LifecycleError {
    /// The discovery mechanism produced no usable output. Fatal to the
    /// reconciliation pass that hit it, nothing else.
    #[error("discovery failed: {detail}")]
    Discovery { detail: String },

    /// A single malformed discovery entry. Absorbed and logged where it
    /// occurs; never aborts the surrounding loop.
    #[error("unparseable entry: {detail}")]
    Parse { detail: String },

    /// An external command exited unsuccessfully. The persisted record is
    /// left exactly as it was; re-invoking the same action is safe.
    #[error("{action} failed for disk '{disk}' (exit code {exit_code:?}): {detail}")]
    CommandFailed {
        action: String,
        disk: String,
        exit_code: Option<i32>,
        detail: String,
    },

    /// An external command outlived its bound and was killed.
    #[error("{action} timed out for disk '{disk}' after {timeout_secs}s")]
    CommandTimeout {
        action: String,
        disk: String,
        timeout_secs: u64,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not supported: {0}")]
    Unsupported(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LifecycleError {
    pub fn kind(&self) -> LifecycleErrorKind {
        match self {
            Self::Discovery { .. } => LifecycleErrorKind::Discovery,
            Self::Parse { .. } => LifecycleErrorKind::Parse,
            Self::CommandFailed { .. } => LifecycleErrorKind::CommandFailed,
            Self::CommandTimeout { .. } => LifecycleErrorKind::CommandTimeout,
            Self::Conflict(_) => LifecycleErrorKind::Conflict,
            Self::NotFound(_) => LifecycleErrorKind::NotFound,
            Self::Unauthorized(_) => LifecycleErrorKind::Unauthorized,
            Self::Unsupported(_) => LifecycleErrorKind::Unsupported,
            Self::Internal(_) => LifecycleErrorKind::Internal,
        }
    }

    /// Whether re-invoking the same operation may succeed without any other
    /// change (command failures and timeouts are retryable; conflicts and
    /// authorization denials are not).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CommandFailed { .. } | Self::CommandTimeout { .. } | Self::Discovery { .. }
        )
    }
}
