//! # Nebula Core
//!
//! Foundational identifiers and versioning types shared by every other
//! `nebula-*` crate in the flow engine. Kept deliberately small: this crate
//! has no knowledge of workflows, actions, or execution — just the typed
//! vocabulary (`ExecutionId`, `WorkflowId`, ...) everything else builds on.

pub mod id;
pub mod version;

pub use id::{ActionId, CredentialId, ExecutionId, NodeId, TenantId, WorkflowId};
pub use version::InterfaceVersion;

/// Common prelude for downstream `nebula-*` crates.
pub mod prelude {
    pub use super::{ActionId, CredentialId, ExecutionId, InterfaceVersion, NodeId, TenantId, WorkflowId};
}
