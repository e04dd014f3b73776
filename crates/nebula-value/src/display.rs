//! Natural textual form for interpolation (spec §4.1): integers decimal,
//! floats in their own natural form, booleans as `true`/`false`, null as
//! an empty string, and sequences/mappings serialized as JSON.

use crate::Value;
use std::fmt;

impl Value {
    /// Render the value the way the interpolator substitutes it into a
    /// template string. This is deliberately *not* the same as `Display`
    /// for `Array`/`Object` JSON, which is why it has its own name.
    #[must_use]
    pub fn to_interpolated_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Array(_) | Self::Object(_) => {
                let json: serde_json::Value = self.clone().into();
                json.to_string()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_interpolated_string())
    }
}
