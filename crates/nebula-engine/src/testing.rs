//! A minimal leaf action used only by this crate's own test suite to
//! exercise the composite actions end-to-end without pulling in a real
//! HTTP or SQL client (grounded on the teacher's `DummyAction` fixtures
//! in `action/src/registry.rs`).

use async_trait::async_trait;
use indexmap::IndexMap;
use nebula_action::{Action, ActionContext, ActionError, ActionInput, ActionOutput, ActionRegistry};
use nebula_core::{ExecutionId, NodeId, WorkflowId};
use nebula_error::EngineError;
use nebula_value::Value;
use nebula_workflow::NodeExecutor;
use std::sync::Arc;

/// Echoes `config.value` (or the whole config, if `value` is absent) back
/// as its output. Optionally fails with a configurable message when
/// `config.fail_with` is set, to drive retry/catch test scenarios.
pub struct EchoAction;

#[async_trait]
impl Action for EchoAction {
    async fn execute(&self, _ctx: &ActionContext, input: ActionInput) -> Result<ActionOutput, ActionError> {
        if let Some(message) = input.config.get("fail_with").and_then(|v| v.as_str()) {
            return Err(ActionError::retryable(message.to_string()));
        }
        let data = input.config.get("value").cloned().unwrap_or(input.config);
        Ok(ActionOutput::new(data))
    }

    fn action_type(&self) -> &'static str {
        "testing:echo"
    }
}

/// A [`NodeExecutor`] that resolves each node id against a fixed map of
/// `(action_type, config)` pairs and drives the action through a real
/// [`ActionRegistry`] — lets composite-action tests exercise the full
/// registry → action dispatch path instead of a hand-rolled stand-in.
pub struct RegistryExecutor {
    registry: ActionRegistry,
    nodes: IndexMap<String, (String, Value)>,
}

impl RegistryExecutor {
    /// Build an executor with no nodes registered yet; add some with
    /// [`with_node`](Self::with_node).
    #[must_use]
    pub fn new(registry: ActionRegistry) -> Self {
        Self { registry, nodes: IndexMap::new() }
    }

    /// Register a node id against an `action_type` and its config.
    #[must_use]
    pub fn with_node(mut self, node_id: impl Into<String>, action_type: impl Into<String>, config: Value) -> Self {
        self.nodes.insert(node_id.into(), (action_type.into(), config));
        self
    }
}

#[async_trait]
impl NodeExecutor for RegistryExecutor {
    async fn execute(&self, execution_id: ExecutionId, node_id: &str) -> Result<Value, EngineError> {
        let (action_type, config) = self
            .nodes
            .get(node_id)
            .ok_or_else(|| EngineError::structural(format!("no node registered for '{node_id}'")))?;
        let action = self
            .registry
            .create(action_type)
            .map_err(|e| EngineError::structural(e.message()))?;
        let ctx = ActionContext::new(execution_id, NodeId::new(node_id), WorkflowId::generate());
        let output = action
            .execute(&ctx, ActionInput::new(config.clone(), None))
            .await
            .map_err(EngineError::from)?;
        Ok(output.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::ParallelAction;
    use crate::retry::RetryAction;

    fn ctx() -> ActionContext {
        ActionContext::new(ExecutionId::v4(), NodeId::generate(), WorkflowId::generate())
    }

    #[tokio::test]
    async fn echoes_value_field() {
        let mut cfg = IndexMap::new();
        cfg.insert("value".to_string(), Value::from("hi"));
        let out = EchoAction
            .execute(&ctx(), ActionInput::new(Value::Object(cfg), None))
            .await
            .unwrap();
        assert_eq!(out.data, Value::from("hi"));
    }

    #[tokio::test]
    async fn fails_when_configured_to() {
        let mut cfg = IndexMap::new();
        cfg.insert("fail_with".to_string(), Value::from("boom"));
        let err = EchoAction
            .execute(&ctx(), ActionInput::new(Value::Object(cfg), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Retryable { .. }));
    }

    fn registry_with_echo() -> ActionRegistry {
        let registry = ActionRegistry::empty();
        registry.register("testing:echo", || Box::new(EchoAction) as Box<dyn Action>);
        registry
    }

    #[tokio::test]
    async fn parallel_drives_echo_through_the_registry() {
        let mut value_cfg = IndexMap::new();
        value_cfg.insert("value".to_string(), Value::from("branch-a"));
        let executor = Arc::new(
            RegistryExecutor::new(registry_with_echo()).with_node("n1", "testing:echo", Value::Object(value_cfg)),
        );
        let action = ParallelAction::new(executor);
        let cfg = Value::try_from(serde_json::json!({
            "branches": [{"name": "a", "nodes": ["n1"]}]
        }))
        .unwrap();
        let out = action.execute(&ctx(), ActionInput::new(cfg, None)).await.unwrap();
        assert_eq!(out.data.get("completed_branches"), Some(&Value::Integer(1)));
    }

    #[tokio::test]
    async fn retry_drives_echo_through_the_registry_until_it_stops_failing() {
        let mut fail_cfg = IndexMap::new();
        fail_cfg.insert("fail_with".to_string(), Value::from("not yet"));
        let executor = Arc::new(
            RegistryExecutor::new(registry_with_echo()).with_node("n1", "testing:echo", Value::Object(fail_cfg)),
        );
        let action = RetryAction::new(executor);
        let cfg = Value::try_from(serde_json::json!({
            "max_attempts": 2,
            "initial_delay_ms": 1,
            "non_retryable_errors": []
        }))
        .unwrap();
        let mut root = IndexMap::new();
        root.insert("retry_node_id".to_string(), Value::from("n1"));
        let result = action
            .execute(&ctx(), ActionInput::new(cfg, Some(Value::Object(root))))
            .await;
        // The node always fails, so retry exhausts its attempt budget against
        // the registry-backed echo action rather than a hand-rolled executor.
        assert!(result.is_err());
    }
}
