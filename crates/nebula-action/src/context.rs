use nebula_core::{ExecutionId, NodeId, WorkflowId};
use tokio_util::sync::CancellationToken;

/// Identity and cancellation plumbing provided to every action during
/// execution, separate from the `ExecutionContext` data the action
/// operates on (spec §5: cooperative cancellation via a propagated
/// [`CancellationToken`]).
///
/// Actions **must** periodically check [`is_cancelled`](Self::is_cancelled)
/// in long-running loops.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Which execution run this invocation belongs to.
    pub execution_id: ExecutionId,
    /// The node in the workflow graph being executed.
    pub node_id: NodeId,
    /// The workflow this execution belongs to.
    pub workflow_id: WorkflowId,
    /// Cancellation signal, checked cooperatively.
    cancellation: CancellationToken,
}

impl ActionContext {
    /// Construct a context with a fresh, independent cancellation token.
    #[must_use]
    pub fn new(execution_id: ExecutionId, node_id: NodeId, workflow_id: WorkflowId) -> Self {
        Self {
            execution_id,
            node_id,
            workflow_id,
            cancellation: CancellationToken::new(),
        }
    }

    /// Construct a context whose cancellation token is a child of `parent`,
    /// so cancelling the parent also cancels this context (used when a
    /// composite action spawns a sub-context for a branch or sub-workflow).
    #[must_use]
    pub fn child_of(&self, node_id: NodeId) -> Self {
        Self {
            execution_id: self.execution_id,
            node_id,
            workflow_id: self.workflow_id.clone(),
            cancellation: self.cancellation.child_token(),
        }
    }

    /// Borrow the cancellation token, e.g. to race it against a delay.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` if this context (or an ancestor) has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel this context and every context derived from it via
    /// [`child_of`](Self::child_of).
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }
}
