use std::fmt;

/// Whether an execution error may reasonably be retried.
///
/// Set by the §4.4 classification heuristic and carried through
/// [`ErrorHandlingMetadata`](https://docs.rs/nebula-action) into catch
/// blocks and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorClassification {
    /// Likely to succeed on retry (timeouts, connection resets, throttling).
    Transient,
    /// Will not succeed on retry (bad credentials, schema mismatch).
    Permanent,
    /// No classification signal available.
    Unknown,
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transient => "transient",
            Self::Permanent => "permanent",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
