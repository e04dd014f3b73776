use crate::definition::WorkflowDefinition;
use crate::execution::Execution;
use async_trait::async_trait;
use nebula_core::{ExecutionId, TenantId, WorkflowId};
use nebula_error::EngineError;
use nebula_value::Value;

/// Capability supplied by the driver: execute one node by id and return
/// its output value. Composite actions (Parallel, Retry, Try/Catch/Finally)
/// call through this port to invoke children without needing the graph
/// model themselves (spec §6).
///
/// Node ids are plain strings, matching how workflow authors reference
/// them (`steps.<node_id>`), not the UUID-based entity ids in `nebula-core`.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Execute `node_id` within `execution_id`, returning its output.
    async fn execute(&self, execution_id: ExecutionId, node_id: &str) -> Result<Value, EngineError>;
}

/// Capability supplied by the driver: load workflow definitions and
/// create/read execution records (spec §6). Persistence, credential
/// decryption, and RBAC sit behind this port and are out of scope here.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Load a workflow definition by tenant and id.
    async fn get(&self, tenant_id: TenantId, workflow_id: WorkflowId) -> Result<WorkflowDefinition, EngineError>;

    /// Persist a freshly-created execution record.
    async fn create_execution(&self, execution: Execution) -> Result<(), EngineError>;

    /// Load an execution record by tenant and id.
    async fn get_execution(&self, tenant_id: TenantId, execution_id: ExecutionId) -> Result<Execution, EngineError>;
}

/// Capability supplied by the driver: run an execution to completion.
/// Synchronous in the sense that it blocks the caller until a terminal
/// status is written (spec §6); the sub-workflow action's `mode: sync`
/// awaits this directly, while `mode: async` fires it without waiting.
#[async_trait]
pub trait WorkflowExecutor: Send + Sync {
    /// Drive `execution` to a terminal status.
    async fn execute(&self, execution: Execution) -> Result<(), EngineError>;
}
