//! # Nebula Expression
//!
//! Path resolution and `{{ }}` template interpolation (spec §4.1). The
//! path grammar and resolver live in `nebula-value` (they're fundamentally
//! a `Value`-tree walk); this crate adds the template-scanning layer on
//! top, plus the error type that wraps resolution failures for callers
//! that want a `Result` instead of the "leave unresolved text literal"
//! behavior `Interpolator` uses internally.

mod error;
mod template;

pub use error::ExpressionError;
pub use nebula_value::{resolve, Path, PathSegment, ResolveError};
pub use template::{Interpolator, Template};

use nebula_value::Value;

/// Resolve a raw path string against a context, surfacing resolution
/// failures instead of silently falling back to literal text. Used by
/// callers (e.g. the Retry action's error binding) that need to know
/// *whether* a path resolved, not just its rendered form.
pub fn resolve_path<'v>(context: &'v Value, raw_path: &str) -> Result<&'v Value, ExpressionError> {
    let path = Path::parse(raw_path);
    nebula_value::path::resolve(context, &path).map_err(|source| ExpressionError::Resolution {
        path: raw_path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn resolve_path_surfaces_error() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::Integer(1));
        let context = Value::Object(map);
        let err = resolve_path(&context, "b").unwrap_err();
        assert!(matches!(err, ExpressionError::Resolution { .. }));
    }

    #[test]
    fn resolve_path_succeeds() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::Integer(1));
        let context = Value::Object(map);
        assert_eq!(resolve_path(&context, "a").unwrap(), &Value::Integer(1));
    }
}
