//! Interface versioning for actions and workflows.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(major, minor)` interface version.
///
/// Major version changes signal a breaking change to input/output shape;
/// minor changes are additive. A consumer requiring version `R` is
/// compatible with a provider at version `P` when `P.major == R.major` and
/// `P.minor >= R.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterfaceVersion {
    /// Breaking-change version component.
    pub major: u32,
    /// Additive-change version component.
    pub minor: u32,
}

impl InterfaceVersion {
    /// Construct a new version.
    #[must_use]
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Returns `true` if a provider at `self` satisfies a requirement of `required`.
    #[must_use]
    pub fn is_compatible_with(&self, required: &Self) -> bool {
        self.major == required.major && self.minor >= required.minor
    }
}

impl fmt::Display for InterfaceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
