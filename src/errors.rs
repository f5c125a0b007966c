//! Core error kinds for the pick scoring & lifecycle pipeline.
//!
//! A plain enum with manual `Display`/`Error` impls rather than
//! `thiserror`, since the rest of the crate never pulls that dependency in.

use std::fmt;

/// Error kinds from §7 of the design. These are recorded, not raised,
/// in every path except `StorageFatal` (process exit at startup).
#[derive(Debug)]
pub enum CoreError {
    /// External call exceeded its deadline.
    UpstreamTimeout { integration: String },
    /// 5xx or rate-limited (429) response from an upstream.
    UpstreamUnavailable { integration: String, detail: String },
    /// A needed field was absent (e.g. no sharp splits).
    MissingData { what: String },
    /// A pick failed schema validation at write, or a gate at output.
    ValidationFailure { reason: String },
    /// Storage is not writable / not mounted / wrong permissions.
    StorageFatal { path: String, reason: String },
    /// A precondition was violated (e.g. titanium math inconsistency).
    InternalBug { detail: String },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamTimeout { integration } => {
                write!(f, "upstream timeout: {integration}")
            }
            Self::UpstreamUnavailable { integration, detail } => {
                write!(f, "upstream unavailable ({integration}): {detail}")
            }
            Self::MissingData { what } => write!(f, "missing data: {what}"),
            Self::ValidationFailure { reason } => write!(f, "validation failure: {reason}"),
            Self::StorageFatal { path, reason } => {
                write!(f, "storage fatal at {path}: {reason}")
            }
            Self::InternalBug { detail } => write!(f, "internal bug: {detail}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl CoreError {
    pub fn missing_data(what: impl Into<String>) -> Self {
        Self::MissingData { what: what.into() }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::ValidationFailure {
            reason: reason.into(),
        }
    }

    pub fn internal_bug(detail: impl Into<String>) -> Self {
        Self::InternalBug {
            detail: detail.into(),
        }
    }
}
