use nebula_error::ErrorClassification;
use regex::Regex;

/// Substrings checked, case-insensitively, when no explicit pattern list
/// settles the question (spec §4.4(d)).
const HEURISTIC_SUBSTRINGS: &[&str] = &[
    "timeout",
    "temporary",
    "connection",
    "unavailable",
    "throttle",
    "rate limit",
];

/// A pattern used to match an error message: a compiled regex if the
/// pattern compiles, otherwise a case-insensitive substring match.
///
/// Shared with `nebula-engine`'s catch-filter action, which matches
/// `error_patterns` against a caught error's message the same way.
pub enum Pattern {
    /// A successfully compiled regular expression.
    Regex(Regex),
    /// Fallback for a pattern that failed to compile as a regex.
    Substring(String),
}

impl Pattern {
    /// Compile `raw` as a regex, falling back to a case-insensitive
    /// substring match if it isn't valid regex syntax.
    #[must_use]
    pub fn compile(raw: &str) -> Self {
        match Regex::new(raw) {
            Ok(re) => Self::Regex(re),
            Err(_) => Self::Substring(raw.to_lowercase()),
        }
    }

    /// Test `message` against this pattern.
    #[must_use]
    pub fn matches(&self, message: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(message),
            Self::Substring(needle) => message.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// A set of patterns compiled once and reused across many [`classify`]
/// calls, so a retry loop doesn't re-run `Regex::new` on every attempt.
pub struct CompiledPatterns(Vec<Pattern>);

impl CompiledPatterns {
    /// Compile every pattern in `raw`.
    #[must_use]
    pub fn compile(raw: &[String]) -> Self {
        Self(raw.iter().map(|p| Pattern::compile(p)).collect())
    }

    fn matches(&self, message: &str) -> bool {
        self.0.iter().any(|pattern| pattern.matches(message))
    }
}

/// Decide whether an error should be retried (spec §4.4 classification).
///
/// Precedence, first match wins:
/// 1. `non_retryable_errors` matches → not retryable.
/// 2. `retryable_errors` non-empty → retryable only if it matches.
/// 3. The error itself reports a non-`Unknown` classification → use it.
/// 4. Substring heuristic against [`HEURISTIC_SUBSTRINGS`].
///
/// Compiles `retryable_errors`/`non_retryable_errors` fresh on every
/// call; a caller invoking this many times against the same pattern
/// lists (e.g. a retry loop) should prefer
/// [`classify_compiled`] with patterns compiled once up front.
#[must_use]
pub fn classify(
    message: &str,
    self_reported: ErrorClassification,
    retryable_errors: &[String],
    non_retryable_errors: &[String],
) -> bool {
    classify_compiled(
        message,
        self_reported,
        &CompiledPatterns::compile(retryable_errors),
        &CompiledPatterns::compile(non_retryable_errors),
    )
}

/// Same precedence rules as [`classify`], against patterns compiled
/// once via [`CompiledPatterns::compile`] rather than per call.
#[must_use]
pub fn classify_compiled(
    message: &str,
    self_reported: ErrorClassification,
    retryable_errors: &CompiledPatterns,
    non_retryable_errors: &CompiledPatterns,
) -> bool {
    if non_retryable_errors.matches(message) {
        return false;
    }
    if !retryable_errors.0.is_empty() {
        return retryable_errors.matches(message);
    }
    if self_reported != ErrorClassification::Unknown {
        return self_reported == ErrorClassification::Transient;
    }
    let lower = message.to_lowercase();
    HEURISTIC_SUBSTRINGS.iter().any(|needle| lower.contains(needle))
}
