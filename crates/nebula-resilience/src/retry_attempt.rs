use chrono::{DateTime, Utc};
use nebula_error::ErrorClassification;
use serde::{Deserialize, Serialize};

/// Observability record for a single retry attempt (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAttempt {
    /// Zero-based attempt index (0 = the first/initial attempt).
    pub attempt: u32,
    /// When the attempt was made.
    pub timestamp: DateTime<Utc>,
    /// Whether this attempt succeeded.
    pub success: bool,
    /// The error message, if this attempt failed.
    pub error: Option<String>,
    /// The error's machine-readable kind, if this attempt failed.
    pub error_type: Option<String>,
    /// The error's classification, if this attempt failed.
    pub classification: Option<ErrorClassification>,
    /// The delay that was waited before this attempt, if any.
    pub delay_ms: Option<u64>,
}

impl RetryAttempt {
    /// Record a successful attempt.
    #[must_use]
    pub fn success(attempt: u32, delay_ms: Option<u64>) -> Self {
        Self {
            attempt,
            timestamp: Utc::now(),
            success: true,
            error: None,
            error_type: None,
            classification: None,
            delay_ms,
        }
    }

    /// Record a failed attempt.
    #[must_use]
    pub fn failure(
        attempt: u32,
        error: impl Into<String>,
        error_type: impl Into<String>,
        classification: ErrorClassification,
        delay_ms: Option<u64>,
    ) -> Self {
        Self {
            attempt,
            timestamp: Utc::now(),
            success: false,
            error: Some(error.into()),
            error_type: Some(error_type.into()),
            classification: Some(classification),
            delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_record_has_no_error_fields() {
        let attempt = RetryAttempt::success(0, None);
        assert!(attempt.success);
        assert!(attempt.error.is_none());
    }

    #[test]
    fn failure_record_carries_classification() {
        let attempt = RetryAttempt::failure(1, "boom", "execution", ErrorClassification::Transient, Some(100));
        assert!(!attempt.success);
        assert_eq!(attempt.classification, Some(ErrorClassification::Transient));
        assert_eq!(attempt.delay_ms, Some(100));
    }
}
