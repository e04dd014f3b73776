use chrono::{DateTime, Utc};
use nebula_error::ErrorClassification;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error type for all action operations (spec §7, as seen by a single
/// action invocation rather than the engine-wide taxonomy).
///
/// Distinguishes retryable from fatal errors so composite actions can
/// decide retry/catch policy without string-matching messages.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ActionError {
    /// Transient failure — caller may retry based on its policy.
    #[error("retryable: {error}")]
    Retryable {
        /// Human-readable error message.
        error: String,
        /// Suggested delay before retry; the retry action's own policy wins.
        backoff_hint: Option<Duration>,
    },

    /// Permanent failure — never retry.
    #[error("fatal: {error}")]
    Fatal {
        /// Human-readable error message.
        error: String,
    },

    /// Input validation failed before execution began.
    #[error("validation: {0}")]
    Validation(String),

    /// Execution cancelled via cancellation token.
    #[error("cancelled")]
    Cancelled,

    /// Requested an action type the registry does not know about.
    #[error("unknown action type: {0}")]
    UnknownType(String),

    /// Crossed in from a source with no retryability signal of its own
    /// (e.g. an `EngineError` variant other than `Execution`). Carries
    /// `ErrorClassification::Unknown` so the retry action's substring
    /// heuristic still gets a chance instead of being forced to give up.
    #[error("{error}")]
    Unclassified {
        /// Human-readable error message.
        error: String,
    },
}

impl ActionError {
    /// Construct a retryable error with no backoff hint.
    pub fn retryable(msg: impl Into<String>) -> Self {
        Self::Retryable {
            error: msg.into(),
            backoff_hint: None,
        }
    }

    /// Construct a fatal (non-retryable) error.
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal { error: msg.into() }
    }

    /// Best-effort classification used by the retry action's heuristic
    /// fallback (spec §4.4(c)): an action may self-report retryability.
    #[must_use]
    pub fn classification(&self) -> ErrorClassification {
        match self {
            Self::Retryable { .. } => ErrorClassification::Transient,
            Self::Fatal { .. } | Self::Validation(_) => ErrorClassification::Permanent,
            Self::Cancelled | Self::UnknownType(_) | Self::Unclassified { .. } => ErrorClassification::Unknown,
        }
    }

    /// The message to surface in `ErrorHandlingMetadata.error_message`.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Short, stable name of this error's kind, used in
    /// `ErrorHandlingMetadata.error_type` and retry attempt logs.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Retryable { .. } => "retryable",
            Self::Fatal { .. } => "fatal",
            Self::Validation(_) => "validation",
            Self::Cancelled => "cancelled",
            Self::UnknownType(_) => "unknown_type",
            Self::Unclassified { .. } => "unclassified",
        }
    }
}

impl From<ActionError> for nebula_error::EngineError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Retryable { error, .. } => {
                nebula_error::EngineError::execution(error, ErrorClassification::Transient)
            }
            ActionError::Fatal { error } => {
                nebula_error::EngineError::execution(error, ErrorClassification::Permanent)
            }
            ActionError::Unclassified { error } => {
                nebula_error::EngineError::execution(error, ErrorClassification::Unknown)
            }
            ActionError::Validation(msg) => nebula_error::EngineError::validation(msg),
            ActionError::Cancelled => nebula_error::EngineError::Cancelled,
            ActionError::UnknownType(ty) => {
                nebula_error::EngineError::structural(format!("unknown action type: {ty}"))
            }
        }
    }
}

impl From<nebula_error::EngineError> for ActionError {
    fn from(err: nebula_error::EngineError) -> Self {
        use nebula_error::EngineError;
        match err {
            EngineError::Execution { message, classification } => match classification {
                ErrorClassification::Transient => Self::retryable(message),
                ErrorClassification::Permanent => Self::fatal(message),
                ErrorClassification::Unknown => Self::Unclassified { error: message },
            },
            EngineError::Cancelled => Self::Cancelled,
            other => Self::fatal(other.to_string()),
        }
    }
}

/// How a try/catch block resolved an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    /// A catch chain ran and succeeded.
    Handled,
    /// A catch chain ran and itself failed.
    Failed,
    /// No catch chain existed; the original error re-raised after `finally`.
    Propagate,
}

/// Error context exported into a catch block's context (spec §3), bound
/// under `error_binding` (default `"error"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingMetadata {
    /// Machine-readable error kind (`EngineError::kind()` / `ActionError` variant name).
    pub error_type: String,
    /// Human-readable error message.
    pub error_message: String,
    /// Retryability classification.
    pub classification: ErrorClassification,
    /// The node that raised the error.
    pub node_id: String,
    /// The action type of the node that raised the error.
    pub node_type: String,
    /// Which retry attempt this was, if the error occurred under a retry action.
    pub retry_attempt: u32,
    /// The configured maximum retry count, if applicable.
    pub max_retries: u32,
    /// When the error was captured.
    pub timestamp: DateTime<Utc>,
    /// Name of the catch node that handled this error, once known.
    pub caught_by: Option<String>,
    /// How the error was ultimately resolved.
    pub recovery_action: RecoveryAction,
    /// Arbitrary structured context the action attached.
    pub context: nebula_value::Value,
}

impl ErrorHandlingMetadata {
    /// Construct metadata for a freshly-caught error, prior to any catch
    /// chain running. `recovery_action` starts as `Propagate` and is
    /// updated once the try/catch/finally action resolves it.
    #[must_use]
    pub fn new(
        error_type: impl Into<String>,
        error_message: impl Into<String>,
        classification: ErrorClassification,
        node_id: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            error_message: error_message.into(),
            classification,
            node_id: node_id.into(),
            node_type: node_type.into(),
            retry_attempt: 0,
            max_retries: 0,
            timestamp: Utc::now(),
            caught_by: None,
            recovery_action: RecoveryAction::Propagate,
            context: nebula_value::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classifies_transient() {
        let err = ActionError::retryable("connection reset");
        assert_eq!(err.classification(), ErrorClassification::Transient);
    }

    #[test]
    fn engine_error_with_unknown_classification_round_trips_as_unclassified() {
        let engine_err = nebula_error::EngineError::execution("connection timeout", ErrorClassification::Unknown);
        let action_err = ActionError::from(engine_err);
        assert!(matches!(action_err, ActionError::Unclassified { .. }));
        assert_eq!(action_err.classification(), ErrorClassification::Unknown);
        assert_eq!(action_err.message(), "connection timeout");
    }

    #[test]
    fn engine_error_with_known_classification_is_not_unclassified() {
        let transient = ActionError::from(nebula_error::EngineError::execution("reset", ErrorClassification::Transient));
        assert!(matches!(transient, ActionError::Retryable { .. }));

        let permanent = ActionError::from(nebula_error::EngineError::execution("bad creds", ErrorClassification::Permanent));
        assert!(matches!(permanent, ActionError::Fatal { .. }));
    }

    #[test]
    fn fatal_classifies_permanent() {
        let err = ActionError::fatal("bad credentials");
        assert_eq!(err.classification(), ErrorClassification::Permanent);
    }

    #[test]
    fn metadata_defaults_to_propagate() {
        let meta = ErrorHandlingMetadata::new(
            "execution",
            "boom",
            ErrorClassification::Unknown,
            "node-1",
            "action:http",
        );
        assert_eq!(meta.recovery_action, RecoveryAction::Propagate);
        assert!(meta.caught_by.is_none());
    }
}
