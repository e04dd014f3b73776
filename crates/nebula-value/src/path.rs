//! Path grammar and resolution (spec §4.1): dot-separated segments, a
//! `\.` escape for a literal dot inside a segment, `[N]` bracket indices,
//! and an empty path meaning "the whole context".
//!
//! Lives here rather than in `nebula-expression` because resolution is
//! fundamentally a `Value`-tree walk; the template/interpolation layer in
//! `nebula-expression` builds the `{{ }}` scanning on top of this grammar.

use crate::Value;
use std::fmt;

/// A single step in a parsed path: either a named field or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A field name, with escaped dots already unescaped.
    Field(String),
    /// A zero-based array index.
    Index(usize),
    /// A bracket segment whose contents didn't parse as a non-negative
    /// integer, e.g. `[abc]`. Kept as a distinct segment (rather than
    /// dropped) so resolution fails loudly instead of silently
    /// resolving a shorter, wrong path.
    NotANumber(String),
}

/// A parsed dot/bracket path, ready to walk against a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Parse a path string into its segments.
    ///
    /// Grammar: segments are separated by `.`; `\.` inside a segment is a
    /// literal dot, not a separator; `[N]` immediately following a segment
    /// (or at the start) introduces an index step. An empty string parses
    /// to the empty path, meaning "resolve to the whole context".
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'.') => {
                    current.push('.');
                    chars.next();
                }
                '.' => {
                    push_field_if_any(&mut segments, &mut current);
                }
                '[' => {
                    push_field_if_any(&mut segments, &mut current);
                    let mut digits = String::new();
                    for d in chars.by_ref() {
                        if d == ']' {
                            break;
                        }
                        digits.push(d);
                    }
                    match digits.parse::<usize>() {
                        Ok(index) => segments.push(PathSegment::Index(index)),
                        Err(_) => segments.push(PathSegment::NotANumber(digits)),
                    }
                }
                other => current.push(other),
            }
        }
        push_field_if_any(&mut segments, &mut current);

        Self { segments }
    }

    /// The parsed segments, in traversal order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns `true` for the empty path (resolves to the whole context).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn push_field_if_any(segments: &mut Vec<PathSegment>, current: &mut String) {
    if !current.is_empty() {
        segments.push(PathSegment::Field(std::mem::take(current)));
    }
}

/// Why a path failed to resolve against a value.
///
/// Three distinct, non-panicking kinds, matching spec §4.1: a named field
/// that doesn't exist, a segment applied to a value that isn't the
/// mapping/sequence it expects, and an index that's out of bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A `Field` segment named a key absent from the current object.
    #[error("field '{0}' not found")]
    SegmentNotFound(String),
    /// A `Field` segment was applied to a value that isn't an object.
    #[error("cannot access field '{field}' on a {actual} value")]
    NotAMapping {
        /// The field name that was being looked up.
        field: String,
        /// A short name for the value's actual kind.
        actual: &'static str,
    },
    /// An `Index` segment was out of bounds, or applied to a non-array.
    #[error("index {index} out of bounds (or not an array)")]
    IndexOutOfBounds {
        /// The index that failed to resolve.
        index: usize,
    },
    /// A bracket segment's contents didn't parse as a non-negative integer.
    #[error("'[{0}]' is not a valid index")]
    NotANumber(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(i) => write!(f, "[{i}]"),
            Self::NotANumber(raw) => write!(f, "[{raw}]"),
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolve a parsed path against a root value.
///
/// An empty path resolves to `root` itself.
pub fn resolve<'v>(root: &'v Value, path: &Path) -> Result<&'v Value, ResolveError> {
    let mut current = root;
    for segment in path.segments() {
        current = match segment {
            PathSegment::Field(name) => match current {
                Value::Object(map) => map
                    .get(name)
                    .ok_or_else(|| ResolveError::SegmentNotFound(name.clone()))?,
                other => {
                    return Err(ResolveError::NotAMapping {
                        field: name.clone(),
                        actual: kind_name(other),
                    })
                }
            },
            PathSegment::Index(i) => match current {
                Value::Array(items) => items
                    .get(*i)
                    .ok_or(ResolveError::IndexOutOfBounds { index: *i })?,
                _ => return Err(ResolveError::IndexOutOfBounds { index: *i }),
            },
            PathSegment::NotANumber(raw) => return Err(ResolveError::NotANumber(raw.clone())),
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn sample() -> Value {
        let mut inner = IndexMap::new();
        inner.insert("name".to_string(), Value::from("ada"));
        inner.insert(
            "tags".to_string(),
            Value::Array(vec![Value::from("admin"), Value::from("owner")]),
        );
        let mut root = IndexMap::new();
        root.insert("user".to_string(), Value::Object(inner));
        root.insert("a.b".to_string(), Value::Integer(7));
        Value::Object(root)
    }

    #[test]
    fn empty_path_resolves_to_root() {
        let root = sample();
        let path = Path::parse("");
        assert_eq!(resolve(&root, &path).unwrap(), &root);
    }

    #[test]
    fn dotted_field_access() {
        let root = sample();
        let path = Path::parse("user.name");
        assert_eq!(resolve(&root, &path).unwrap(), &Value::from("ada"));
    }

    #[test]
    fn bracket_index_access() {
        let root = sample();
        let path = Path::parse("user.tags[1]");
        assert_eq!(resolve(&root, &path).unwrap(), &Value::from("owner"));
    }

    #[test]
    fn escaped_dot_is_literal() {
        let root = sample();
        let path = Path::parse("a\\.b");
        assert_eq!(path.segments(), &[PathSegment::Field("a.b".to_string())]);
        assert_eq!(resolve(&root, &path).unwrap(), &Value::Integer(7));
    }

    #[test]
    fn missing_field_is_segment_not_found() {
        let root = sample();
        let path = Path::parse("user.missing");
        assert_eq!(
            resolve(&root, &path).unwrap_err(),
            ResolveError::SegmentNotFound("missing".to_string())
        );
    }

    #[test]
    fn field_on_non_object_is_not_a_mapping() {
        let root = sample();
        let path = Path::parse("user.name.nested");
        assert_eq!(
            resolve(&root, &path).unwrap_err(),
            ResolveError::NotAMapping {
                field: "nested".to_string(),
                actual: "string",
            }
        );
    }

    #[test]
    fn out_of_bounds_index() {
        let root = sample();
        let path = Path::parse("user.tags[9]");
        assert_eq!(
            resolve(&root, &path).unwrap_err(),
            ResolveError::IndexOutOfBounds { index: 9 }
        );
    }

    #[test]
    fn non_numeric_bracket_is_not_a_number() {
        let path = Path::parse("user.tags[abc]");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("user".to_string()),
                PathSegment::Field("tags".to_string()),
                PathSegment::NotANumber("abc".to_string()),
            ]
        );
        let root = sample();
        assert_eq!(
            resolve(&root, &path).unwrap_err(),
            ResolveError::NotANumber("abc".to_string())
        );
    }
}
