//! # Nebula Value
//!
//! The dynamic `Value` type from spec §3 / §9: the universal payload for
//! action inputs, outputs, configs, and execution contexts. Implemented as
//! a tagged union rather than riding on `serde_json::Value` directly so
//! that integers and floats stay distinct tags — `serde_json::Number`
//! conflates the two, which would break the "natural textual form"
//! interpolation rule in §4.1 (`5` must render as `"5"`, `5.0` as `"5"` or
//! `"5.0"` depending on the float's own `Display`, never silently coerced).

mod convert;
mod display;
pub mod path;

pub use path::{resolve, Path, PathSegment, ResolveError};

use indexmap::IndexMap;

/// The universal payload type threaded through the entire engine.
///
/// `Object` uses an order-preserving map ([`IndexMap`]) because workflow
/// authors reasonably expect field order in a rendered JSON output to
/// match the order the node produced it in.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// JSON `true`/`false`.
    Bool(bool),
    /// A whole number. Distinct from `Float` even when numerically equal.
    Integer(i64),
    /// A floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// An ordered string-keyed mapping of values.
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Construct an empty object.
    #[must_use]
    pub fn empty_object() -> Self {
        Self::Object(IndexMap::new())
    }

    /// Construct an empty array.
    #[must_use]
    pub fn empty_array() -> Self {
        Self::Array(Vec::new())
    }

    /// Returns `true` for `Value::Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow as a string, if this is `Value::String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow as an object map, if this is `Value::Object`.
    #[must_use]
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Mutably borrow as an object map, if this is `Value::Object`.
    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow as an array, if this is `Value::Array`.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Look up a field by name, if this is `Value::Object`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Look up an element by index, if this is `Value::Array`.
    #[must_use]
    pub fn index(&self, i: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(i))
    }

    /// Independent copy for a branch-local context (used by the Parallel
    /// action so sibling branches don't observe each other's writes).
    /// Despite the name this is a full recursive clone, not a cheap
    /// top-level-only copy — `Value` holds no `Rc`/`Arc` to share nested
    /// structure through. Cost scales with the size of the whole tree
    /// (notably `steps`), not just its top-level key count.
    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        self.clone()
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_float_are_distinct() {
        assert_ne!(Value::Integer(5), Value::Float(5.0));
    }

    #[test]
    fn object_preserves_insertion_order() {
        let mut map = IndexMap::new();
        map.insert("z".to_string(), Value::Integer(1));
        map.insert("a".to_string(), Value::Integer(2));
        let value = Value::Object(map);
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn get_and_index_accessors() {
        let mut map = IndexMap::new();
        map.insert("users".to_string(), Value::Array(vec![Value::from("a"), Value::from("b")]));
        let value = Value::Object(map);
        let users = value.get("users").unwrap();
        assert_eq!(users.index(1), Some(&Value::from("b")));
        assert_eq!(users.index(5), None);
    }

    #[test]
    fn shallow_copy_is_independent() {
        let original = Value::from("x");
        let copy = original.shallow_copy();
        assert_eq!(original, copy);
    }
}
