//! # Nebula Engine
//!
//! The four composite actions (spec §4.3-§4.7) that drive child nodes
//! through the `NodeExecutor`/`WorkflowRepository`/`WorkflowExecutor`
//! ports defined in `nebula-workflow`, rather than owning the graph,
//! persistence, or scheduling themselves.

mod parallel;
mod retry;
mod sequence;
mod subworkflow;
mod try_catch;

pub mod testing;

pub use parallel::ParallelAction;
pub use retry::RetryAction;
pub use sequence::run_sequence;
pub use subworkflow::SubWorkflowAction;
pub use try_catch::{CatchFilterAction, TryCatchFinallyAction};

use nebula_action::{Action, ActionRegistry};
use nebula_workflow::{NodeExecutor, WorkflowExecutor, WorkflowRepository};
use std::sync::Arc;

/// Register the four composite actions under their `engine:*` types,
/// plus the standalone `engine:catch_filter` leaf used inside catch
/// chains (spec §4.6). Composite actions hold their collaborator ports
/// as `Arc` fields set at construction rather than through `execute`'s
/// signature, so registering them here is where those ports get wired in.
pub fn register_composites(
    registry: &ActionRegistry,
    node_executor: Arc<dyn NodeExecutor>,
    workflow_repository: Arc<dyn WorkflowRepository>,
    workflow_executor: Arc<dyn WorkflowExecutor>,
) {
    registry.register("engine:parallel", {
        let executor = Arc::clone(&node_executor);
        move || -> Box<dyn Action> { Box::new(ParallelAction::new(Arc::clone(&executor))) }
    });
    registry.register("engine:retry", {
        let executor = Arc::clone(&node_executor);
        move || -> Box<dyn Action> { Box::new(RetryAction::new(Arc::clone(&executor))) }
    });
    registry.register("engine:try_catch_finally", {
        let executor = Arc::clone(&node_executor);
        move || -> Box<dyn Action> { Box::new(TryCatchFinallyAction::new(Arc::clone(&executor))) }
    });
    registry.register("engine:catch_filter", || -> Box<dyn Action> { Box::new(CatchFilterAction) });
    registry.register("engine:sub_workflow", move || -> Box<dyn Action> {
        Box::new(SubWorkflowAction::new(
            Arc::clone(&workflow_repository),
            Arc::clone(&workflow_executor),
        ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nebula_core::{ExecutionId, TenantId, WorkflowId};
    use nebula_error::EngineError;
    use nebula_value::Value;
    use nebula_workflow::{Execution, WorkflowDefinition};

    struct NoopExecutor;

    #[async_trait]
    impl NodeExecutor for NoopExecutor {
        async fn execute(&self, _execution_id: ExecutionId, node_id: &str) -> Result<Value, EngineError> {
            Ok(Value::from(node_id))
        }
    }

    struct NoopRepository;

    #[async_trait]
    impl WorkflowRepository for NoopRepository {
        async fn get(&self, _tenant_id: TenantId, _workflow_id: WorkflowId) -> Result<WorkflowDefinition, EngineError> {
            Err(EngineError::structural("not used in this test"))
        }

        async fn create_execution(&self, _execution: Execution) -> Result<(), EngineError> {
            Ok(())
        }

        async fn get_execution(&self, _tenant_id: TenantId, _execution_id: ExecutionId) -> Result<Execution, EngineError> {
            Err(EngineError::structural("not used in this test"))
        }
    }

    struct NoopWorkflowExecutor;

    #[async_trait]
    impl WorkflowExecutor for NoopWorkflowExecutor {
        async fn execute(&self, _execution: Execution) -> Result<(), EngineError> {
            Ok(())
        }
    }

    #[test]
    fn registers_all_composite_types() {
        let registry = ActionRegistry::empty();
        register_composites(&registry, Arc::new(NoopExecutor), Arc::new(NoopRepository), Arc::new(NoopWorkflowExecutor));

        for ty in [
            "engine:parallel",
            "engine:retry",
            "engine:try_catch_finally",
            "engine:catch_filter",
            "engine:sub_workflow",
        ] {
            assert!(registry.is_registered(ty), "{ty} should be registered");
        }
    }

    #[test]
    fn each_registration_produces_a_fresh_instance() {
        let registry = ActionRegistry::empty();
        register_composites(&registry, Arc::new(NoopExecutor), Arc::new(NoopRepository), Arc::new(NoopWorkflowExecutor));

        let first = registry.create("engine:parallel").unwrap();
        let second = registry.create("engine:parallel").unwrap();
        assert_eq!(first.action_type(), second.action_type());
    }
}
