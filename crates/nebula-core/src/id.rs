//! Identifier types for engine entities.
//!
//! `ExecutionId` is UUID-backed: it is always engine-generated, never
//! authored by a human, so a random v4 value is the natural fit.  Every
//! other id here names something a workflow author or API caller writes
//! by hand — a workflow id, a node id within a graph, a tenant slug — so
//! each is a plain string newtype that wraps whatever was written rather
//! than imposing UUID syntax on it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_uuid_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random (v4) identifier.
            #[must_use]
            pub fn v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// The nil (all-zero) identifier, useful as a default/sentinel.
            #[must_use]
            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Returns `true` if this is the nil identifier.
            #[must_use]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            /// Parse an identifier from its string form.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Wrap an existing `Uuid`.
            #[must_use]
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying `Uuid`.
            #[must_use]
            pub fn get(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
            }
        }
    };
}

macro_rules! define_string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an author- or caller-supplied id. Infallible: any
            /// string, including a non-UUID one, is a valid id.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a synthetic id for an engine-created value (e.g. a
            /// sub-context spawned internally) rather than one named by a
            /// workflow author.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert to an owned string.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

define_uuid_id!(ExecutionId, "Identifies one traversal of a workflow graph.");
define_string_id!(TenantId, "Identifies the owning tenant of a workflow.");
define_string_id!(WorkflowId, "Identifies a workflow definition.");
define_string_id!(NodeId, "Identifies a node within a workflow graph.");
define_string_id!(ActionId, "Identifies a registered action-type factory.");
define_string_id!(CredentialId, "Identifies a stored credential.");
