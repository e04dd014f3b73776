use nebula_value::ResolveError;
use thiserror::Error;

/// Errors raised while interpolating a template or resolving a path
/// expression against an execution context.
#[derive(Debug, Clone, Error)]
pub enum ExpressionError {
    /// Path resolution failed against the supplied context.
    #[error("failed to resolve '{path}': {source}")]
    Resolution {
        /// The raw path string that failed.
        path: String,
        /// The underlying resolution failure.
        #[source]
        source: ResolveError,
    },

    /// An opening `{{` was never closed.
    #[error("unterminated expression starting at offset {offset}")]
    Unterminated {
        /// Byte offset of the opening `{{`.
        offset: usize,
    },
}

impl From<ExpressionError> for nebula_error::EngineError {
    fn from(err: ExpressionError) -> Self {
        nebula_error::EngineError::resolution(err.to_string())
    }
}
