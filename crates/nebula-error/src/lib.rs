//! # Nebula Error
//!
//! Centralized error taxonomy for the flow engine (spec §7). Every crate in
//! the workspace defines its own local error enum with `thiserror` and
//! converts into [`EngineError`] at the boundary where it crosses into
//! driver-facing code, mirroring the teacher's layered
//! `EngineError -> ExecutionError -> leaf error` chain.

mod classification;

pub use classification::ErrorClassification;

use thiserror::Error;

/// The seven-member error taxonomy from the specification.
///
/// Each variant names *why* an operation failed, not just *that* it did,
/// so composite actions (retry, try/catch) can make policy decisions
/// without string-matching messages.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Bad type, missing required field, invalid enum, malformed duration/regex.
    /// Reported immediately; never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Input constraint violation (empty expression, empty branches). Non-retryable.
    #[error("validation error: {0}")]
    Validation(String),

    /// Path not found / out of bounds during mapping or transform.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// A leaf action raised an I/O or remote error.
    #[error("execution error: {message}")]
    Execution {
        /// Human-readable message.
        message: String,
        /// Retryability classification per the heuristic in spec §4.4.
        classification: ErrorClassification,
    },

    /// A context deadline elapsed.
    #[error("timeout error: {0}")]
    Timeout(String),

    /// The root context was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Cycle detected, max depth exceeded, unknown action type.
    #[error("structural error: {0}")]
    Structural(String),
}

impl EngineError {
    /// Construct a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Construct a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Construct a resolution error.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Construct an execution error with a given classification.
    pub fn execution(msg: impl Into<String>, classification: ErrorClassification) -> Self {
        Self::Execution {
            message: msg.into(),
            classification,
        }
    }

    /// Construct a structural error.
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    /// Returns `true` if the retry action should consider retrying this error.
    ///
    /// Only `Execution` errors carry a classification; every other variant
    /// is either inherently non-retryable (configuration/validation/structural)
    /// or handled by dedicated control flow (timeout/cancellation).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Execution {
                classification: ErrorClassification::Transient,
                ..
            }
        )
    }

    /// Short machine-readable kind name, used in `ErrorHandlingMetadata.error_type`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::Resolution(_) => "resolution",
            Self::Execution { .. } => "execution",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
            Self::Structural(_) => "structural",
        }
    }

    /// The classification to surface in `ErrorHandlingMetadata`.
    #[must_use]
    pub fn classification(&self) -> ErrorClassification {
        match self {
            Self::Execution { classification, .. } => *classification,
            _ => ErrorClassification::Unknown,
        }
    }
}

/// Convenience result alias used across the workspace.
pub type EngineResult<T> = Result<T, EngineError>;
