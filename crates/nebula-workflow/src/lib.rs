//! # Nebula Workflow
//!
//! Workflow and execution records, and the three external-collaborator
//! ports (`NodeExecutor`, `WorkflowRepository`, `WorkflowExecutor`) the
//! engine consumes instead of owning persistence, scheduling, or the
//! graph model itself (spec §1, §6).

mod definition;
mod execution;
mod ports;

pub use definition::{WorkflowDefinition, WorkflowNode, WorkflowStatus};
pub use execution::{Execution, ExecutionStatus};
pub use ports::{NodeExecutor, WorkflowExecutor, WorkflowRepository};
