//! # Nebula Resilience
//!
//! Reusable backoff and error-classification primitives for the retry
//! action (spec §4.4), split out of the composite action itself the way
//! the teacher's `resilience` crate separates policy primitives from the
//! engine code that wires them to a particular node.

mod backoff;
mod classify;
mod retry_attempt;

pub use backoff::{BackoffPolicy, BackoffStrategy};
pub use classify::{classify, classify_compiled, CompiledPatterns, Pattern};
pub use retry_attempt::RetryAttempt;
