//! # Nebula Log
//!
//! `tracing` setup for the flow engine, trimmed from the teacher's
//! `LoggerBuilder` (which also wires Sentry and rotating file writers)
//! down to what a library crate needs: an `EnvFilter`-driven formatting
//! layer and an idempotent init entry point. Deployed services built on
//! top of this engine reach for the teacher's fuller `nebula-log`
//! directly; this crate only needs to make the engine's own
//! `tracing::instrument`ed operations visible during development and
//! tests.

use tracing_subscriber::{EnvFilter, Registry};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// The environment variable consulted when no explicit filter is given,
/// matching `tracing_subscriber`'s own convention.
pub const FILTER_ENV_VAR: &str = "RUST_LOG";

/// Install a global subscriber, panicking if one is already set.
///
/// `default_filter` is used when `RUST_LOG` is unset (e.g. `"info"` or
/// `"nebula_engine=debug,warn"`).
pub fn init(default_filter: &str) {
    try_init(default_filter).expect("failed to install global tracing subscriber");
}

/// Install a global subscriber, returning an error instead of panicking
/// if one is already set (useful when a host application installs its
/// own subscriber first).
pub fn try_init(default_filter: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_env(FILTER_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_filter));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    Registry::default().with(filter).with(fmt_layer).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_env_var_matches_tracing_convention() {
        assert_eq!(FILTER_ENV_VAR, "RUST_LOG");
    }
}
