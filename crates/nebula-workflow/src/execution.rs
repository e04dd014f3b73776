use chrono::{DateTime, Utc};
use nebula_core::{ExecutionId, TenantId, WorkflowId};
use nebula_value::Value;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an [`Execution`] (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Created, not yet started.
    Pending,
    /// Currently executing.
    Running,
    /// Finished without error.
    Completed,
    /// Finished with an unrecovered error.
    Failed,
    /// Cancelled before completion.
    Cancelled,
}

/// A persisted execution record (spec §3), created by the sub-workflow
/// action when invoking another workflow and otherwise owned by the
/// driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    /// This execution's unique id.
    pub id: ExecutionId,
    /// The tenant this execution belongs to.
    pub tenant_id: TenantId,
    /// The workflow being executed.
    pub workflow_id: WorkflowId,
    /// The workflow version pinned at execution start.
    pub workflow_version: u32,
    /// Current lifecycle status.
    pub status: ExecutionStatus,
    /// What kind of event started this execution (`"manual"`, `"webhook"`,
    /// `"sub_workflow"`, ...).
    pub trigger_type: String,
    /// The data that triggered this execution.
    pub trigger_data: Value,
    /// The execution that spawned this one, if it was started by a
    /// sub-workflow action.
    pub parent_execution_id: Option<ExecutionId>,
    /// Sub-workflow nesting depth, mirroring `_execution.depth`.
    pub execution_depth: i64,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// The final output, once `status` reaches a terminal value.
    pub output_data: Option<Value>,
}

impl Execution {
    /// Construct a freshly-created, `pending` execution record.
    #[must_use]
    pub fn new_pending(
        tenant_id: TenantId,
        workflow_id: WorkflowId,
        workflow_version: u32,
        trigger_type: impl Into<String>,
        trigger_data: Value,
        parent_execution_id: Option<ExecutionId>,
        execution_depth: i64,
    ) -> Self {
        Self {
            id: ExecutionId::v4(),
            tenant_id,
            workflow_id,
            workflow_version,
            status: ExecutionStatus::Pending,
            trigger_type: trigger_type.into(),
            trigger_data,
            parent_execution_id,
            execution_depth,
            created_at: Utc::now(),
            output_data: None,
        }
    }

    /// Returns `true` if `status` is one of the terminal states.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}
