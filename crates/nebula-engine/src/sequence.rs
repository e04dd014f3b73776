//! Shared "run these node ids in order against a context" logic used by
//! both the Parallel action (per-branch) and the Try/Catch/Finally action
//! (try/catch/finally node lists).

use nebula_action::ActionError;
use nebula_core::ExecutionId;
use nebula_execution::ExecutionContext;
use nebula_workflow::NodeExecutor;
use tokio_util::sync::CancellationToken;

/// Execute `nodes` in order against `context`, writing each node's output
/// under `steps[node_id]` as it completes so later nodes in the sequence
/// can reference it (spec §4.3 step 4, §4.5 step 1).
///
/// Stops at the first error, returning the failing node id alongside the
/// error; nodes already executed remain recorded in `context`. Checked
/// before each node so a cancelled context aborts "at its next
/// cancellation observation point" (spec §5) rather than mid-node.
pub async fn run_sequence(
    executor: &dyn NodeExecutor,
    execution_id: ExecutionId,
    nodes: &[String],
    context: &mut ExecutionContext,
    cancellation: &CancellationToken,
) -> Result<(), (String, ActionError)> {
    for node_id in nodes {
        if cancellation.is_cancelled() {
            return Err((node_id.clone(), ActionError::Cancelled));
        }
        if let Err(err) = run_one(executor, execution_id, node_id, context).await {
            return Err((node_id.clone(), err));
        }
    }
    Ok(())
}

async fn run_one(
    executor: &dyn NodeExecutor,
    execution_id: ExecutionId,
    node_id: &str,
    context: &mut ExecutionContext,
) -> Result<(), ActionError> {
    let output = executor
        .execute(execution_id, node_id)
        .await
        .map_err(ActionError::from)?;
    context
        .set_step(node_id.to_string(), output)
        .map_err(|err| ActionError::fatal(err.to_string()))
}
