use nebula_core::WorkflowId;
use nebula_value::Value;
use serde::{Deserialize, Serialize};

/// A single node in a workflow graph.
///
/// The engine treats the node body opaquely beyond `action_type` and
/// `config` — graph wiring (edges, trigger conditions) belongs to the
/// driver's own workflow model; this crate only needs enough to resolve
/// "what action, with what config" for a given node id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// The node's id, unique within its workflow.
    pub id: String,
    /// The `category:name` action type this node invokes.
    pub action_type: String,
    /// The node's configuration, interpolated at execution time.
    pub config: Value,
}

/// Lifecycle state of a workflow definition. Only `Active` workflows may
/// be invoked by the sub-workflow action (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Still being edited; not invocable.
    Draft,
    /// Invocable as a top-level or sub-workflow.
    Active,
    /// Retired; not invocable.
    Archived,
}

/// A versioned workflow definition, as loaded from a [`WorkflowRepository`](crate::WorkflowRepository).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// The workflow's stable identifier.
    pub id: WorkflowId,
    /// Human-readable name.
    pub name: String,
    /// Monotonic version number, bumped on every edit.
    pub version: u32,
    /// Lifecycle state; sub-workflow invocation requires `Active`.
    pub status: WorkflowStatus,
    /// The nodes that make up this workflow.
    pub nodes: Vec<WorkflowNode>,
}

impl WorkflowDefinition {
    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }
}
