//! Invokes another workflow as a node, with depth and cycle guards,
//! input/output mapping, and synchronous/asynchronous modes (spec §4.7).

use async_trait::async_trait;
use indexmap::IndexMap;
use nebula_action::{Action, ActionContext, ActionError, ActionInput, ActionOutput};
use nebula_core::{TenantId, WorkflowId};
use nebula_execution::ExecutionContext;
use nebula_expression::resolve_path;
use nebula_value::Value;
use nebula_workflow::{Execution, WorkflowExecutor, WorkflowRepository, WorkflowStatus};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const MAX_DEPTH: i64 = 10;

#[derive(Debug, Deserialize)]
struct SubWorkflowConfig {
    workflow_id: String,
    #[serde(default)]
    input_mapping: IndexMap<String, String>,
    #[serde(default)]
    output_mapping: IndexMap<String, String>,
    #[serde(default)]
    wait_for_result: bool,
    timeout_ms: Option<u64>,
}

impl SubWorkflowConfig {
    fn parse(config: &Value) -> Result<Self, ActionError> {
        nebula_action::parse_config(config)
    }

    fn validate(&self) -> Result<(), ActionError> {
        if self.workflow_id.trim().is_empty() {
            return Err(ActionError::Validation("workflow_id must not be empty".into()));
        }
        Ok(())
    }
}

/// Invokes another workflow, synchronously or as a detached background run.
pub struct SubWorkflowAction {
    repository: Arc<dyn WorkflowRepository>,
    executor: Arc<dyn WorkflowExecutor>,
}

impl SubWorkflowAction {
    /// Construct a Sub-workflow action over the given repository and executor ports.
    #[must_use]
    pub fn new(repository: Arc<dyn WorkflowRepository>, executor: Arc<dyn WorkflowExecutor>) -> Self {
        Self { repository, executor }
    }
}

#[async_trait]
impl Action for SubWorkflowAction {
    fn validate(&self, config: &Value) -> Result<(), ActionError> {
        SubWorkflowConfig::parse(config)?.validate()
    }

    #[instrument(skip(self, ctx, input), fields(execution_id = %ctx.execution_id))]
    async fn execute(&self, ctx: &ActionContext, input: ActionInput) -> Result<ActionOutput, ActionError> {
        let config = SubWorkflowConfig::parse(&input.config)?;
        config.validate()?;
        debug!(workflow_id = %config.workflow_id, wait_for_result = config.wait_for_result, "invoking sub-workflow");

        let tenant_id = tenant_id_from(&input.context)?;

        let parent_context = ExecutionContext::from_value(input.context.clone());
        let depth = parent_context.depth();
        let workflow_chain = parent_context.workflow_chain();

        if depth >= MAX_DEPTH {
            warn!(depth, "sub-workflow nesting exceeds max depth");
            return Err(ActionError::fatal(format!("sub-workflow nesting exceeds max depth of {MAX_DEPTH}")));
        }
        if workflow_chain.iter().any(|id| id == &config.workflow_id) {
            warn!(workflow_id = %config.workflow_id, "circular sub-workflow reference detected");
            return Err(ActionError::fatal(format!(
                "circular sub-workflow reference: workflow {} is already on the active ancestry path",
                config.workflow_id
            )));
        }

        let workflow_id = WorkflowId::new(config.workflow_id.clone());
        let workflow = self
            .repository
            .get(tenant_id.clone(), workflow_id.clone())
            .await
            .map_err(ActionError::from)?;
        if workflow.status != WorkflowStatus::Active {
            return Err(ActionError::fatal(format!("workflow {} is not active", config.workflow_id)));
        }

        let mapped_input = apply_mapping(&config.input_mapping, &input.context);
        let mapped_input = inject_lineage(mapped_input, ctx.execution_id.to_string(), ctx.workflow_id.to_string(), depth + 1);
        let child_root = merge_object(
            parent_context.child_for_sub_workflow(&config.workflow_id).into_value(),
            mapped_input,
        );

        let execution = Execution::new_pending(
            tenant_id.clone(),
            workflow_id.clone(),
            workflow.version,
            "sub_workflow",
            child_root,
            Some(ctx.execution_id),
            depth + 1,
        );
        self.repository
            .create_execution(execution.clone())
            .await
            .map_err(ActionError::from)?;

        if config.wait_for_result {
            run_sync(self, tenant_id, execution, config.timeout_ms, &config.output_mapping).await
        } else {
            run_async(self, execution, workflow_id)
        }
    }

    fn action_type(&self) -> &'static str {
        "engine:sub_workflow"
    }
}

async fn run_sync(
    action: &SubWorkflowAction,
    tenant_id: TenantId,
    execution: Execution,
    timeout_ms: Option<u64>,
    output_mapping: &IndexMap<String, String>,
) -> Result<ActionOutput, ActionError> {
    let executor = Arc::clone(&action.executor);
    let execution_id = execution.id;
    let handle = tokio::spawn(async move { executor.execute(execution).await });

    let join_outcome = match timeout_ms {
        Some(ms) => tokio::time::timeout(Duration::from_millis(ms), handle)
            .await
            .map_err(|_| ActionError::fatal("sub-workflow exceeded timeout_ms"))?,
        None => handle.await,
    };
    let run_result = join_outcome.map_err(|_| ActionError::fatal("sub-workflow task panicked"))?;
    run_result.map_err(ActionError::from)?;

    let reloaded = action
        .repository
        .get_execution(tenant_id, execution_id)
        .await
        .map_err(ActionError::from)?;
    let output_context = reloaded.output_data.unwrap_or(Value::Null);
    Ok(ActionOutput::new(apply_mapping(output_mapping, &output_context)))
}

fn run_async(action: &SubWorkflowAction, execution: Execution, workflow_id: WorkflowId) -> Result<ActionOutput, ActionError> {
    let executor = Arc::clone(&action.executor);
    let execution_id = execution.id;
    tokio::spawn(async move {
        let _ = executor.execute(execution).await;
    });

    let mut out = IndexMap::new();
    out.insert("execution_id".to_string(), Value::from(execution_id.to_string()));
    out.insert("workflow_id".to_string(), Value::from(workflow_id.to_string()));
    out.insert("status".to_string(), Value::from("started"));
    Ok(ActionOutput::new(Value::Object(out)))
}

fn tenant_id_from(context: &Value) -> Result<TenantId, ActionError> {
    let raw = context
        .get("env")
        .and_then(|env| env.get("tenant_id"))
        .and_then(Value::as_str)
        .ok_or_else(|| ActionError::Validation("context.env.tenant_id is required".into()))?;
    Ok(TenantId::new(raw))
}

/// Overlays `overrides`' top-level fields onto `base`, keeping whatever
/// `base` already carries (notably `_execution`) for keys not present
/// in `overrides`. The `_execution` frame itself is never overridable —
/// an `input_mapping` entry happening to produce that key must not be
/// able to reset the depth/cycle-guard state `base` was built with.
fn merge_object(mut base: Value, overrides: Value) -> Value {
    if let Value::Object(override_map) = overrides {
        if let Some(base_map) = base.as_object_mut() {
            for (k, v) in override_map {
                if k == "_execution" {
                    continue;
                }
                base_map.insert(k, v);
            }
        }
    }
    base
}

/// Injects the ancestry fields spec §4.7's input-mapping step adds after
/// evaluating `input_mapping`, so the child's `trigger_data` always carries
/// where it was invoked from regardless of what the author mapped in.
fn inject_lineage(mapped_input: Value, parent_execution_id: String, parent_workflow_id: String, child_depth: i64) -> Value {
    let mut map = mapped_input.as_object().cloned().unwrap_or_default();
    map.insert("_parent_execution_id".to_string(), Value::from(parent_execution_id));
    map.insert("_parent_workflow_id".to_string(), Value::from(parent_workflow_id));
    map.insert("_depth".to_string(), Value::Integer(child_depth));
    Value::Object(map)
}

fn apply_mapping(mapping: &IndexMap<String, String>, context: &Value) -> Value {
    let mut out = IndexMap::new();
    for (key, expr) in mapping {
        if let Some(value) = evaluate_expr(expr, context) {
            out.insert(key.clone(), value);
        }
    }
    Value::Object(out)
}

fn evaluate_expr(expr: &str, context: &Value) -> Option<Value> {
    let value = match expr.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        Some(path) => resolve_path(context, path).ok().cloned().unwrap_or(Value::Null),
        None => Value::from(expr),
    };
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}
