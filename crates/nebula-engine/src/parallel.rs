//! Fan-out executor with named branches, bounded concurrency, and
//! selectable wait/failure policies (spec §4.3).

use crate::sequence::run_sequence;
use async_trait::async_trait;
use indexmap::IndexMap;
use nebula_action::{Action, ActionContext, ActionError, ActionInput, ActionOutput};
use nebula_core::{ExecutionId, NodeId};
use nebula_execution::ExecutionContext;
use nebula_value::Value;
use nebula_workflow::NodeExecutor;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Deserialize)]
struct BranchConfig {
    name: String,
    nodes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WaitMode {
    All,
    First,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FailureMode {
    StopAll,
    Continue,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ErrorStrategy {
    FailFast,
    WaitAll,
}

#[derive(Debug, Deserialize)]
struct ParallelConfig {
    branches: Vec<BranchConfig>,
    wait_mode: Option<WaitMode>,
    failure_mode: Option<FailureMode>,
    #[serde(default)]
    max_concurrency: i64,
    timeout: Option<String>,
    error_strategy: Option<ErrorStrategy>,
}

impl ParallelConfig {
    fn parse(config: &Value) -> Result<Self, ActionError> {
        nebula_action::parse_config(config)
    }

    fn validate(&self) -> Result<(), ActionError> {
        if self.branches.is_empty() {
            return Err(ActionError::Validation("parallel action requires at least one branch".into()));
        }
        for branch in &self.branches {
            if branch.name.trim().is_empty() {
                return Err(ActionError::Validation("branch name must not be empty".into()));
            }
            if branch.nodes.is_empty() {
                return Err(ActionError::Validation(format!("branch '{}' has no nodes", branch.name)));
            }
        }
        if self.max_concurrency < 0 {
            return Err(ActionError::Validation("max_concurrency must not be negative".into()));
        }
        if let Some(raw) = &self.timeout {
            humantime::parse_duration(raw).map_err(|e| ActionError::Validation(format!("invalid timeout: {e}")))?;
        }
        Ok(())
    }

    fn effective_wait_mode(&self) -> WaitMode {
        self.wait_mode.unwrap_or(WaitMode::All)
    }

    fn effective_failure_mode(&self) -> FailureMode {
        self.failure_mode
            .or_else(|| {
                self.error_strategy.map(|s| match s {
                    ErrorStrategy::FailFast => FailureMode::StopAll,
                    ErrorStrategy::WaitAll => FailureMode::Continue,
                })
            })
            .unwrap_or(FailureMode::StopAll)
    }

    fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.as_deref().and_then(|s| humantime::parse_duration(s).ok())
    }

    fn effective_max_concurrency(&self) -> usize {
        if self.max_concurrency == 0 {
            self.branches.len().max(1)
        } else {
            self.max_concurrency as usize
        }
    }
}

#[derive(Debug, Clone)]
struct BranchResult {
    name: String,
    output: IndexMap<String, Value>,
    error: Option<String>,
    duration_ms: u64,
}

impl From<BranchResult> for Value {
    fn from(result: BranchResult) -> Self {
        let mut map = IndexMap::new();
        map.insert("name".to_string(), Value::from(result.name));
        map.insert("output".to_string(), Value::Object(result.output));
        map.insert(
            "error".to_string(),
            result.error.map(Value::from).unwrap_or(Value::Null),
        );
        map.insert("duration_ms".to_string(), Value::Integer(result.duration_ms as i64));
        Value::Object(map)
    }
}

/// Executes the branches of a `Parallel` node (spec §4.3).
pub struct ParallelAction {
    executor: Arc<dyn NodeExecutor>,
}

impl ParallelAction {
    /// Construct a Parallel action that invokes children through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn NodeExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Action for ParallelAction {
    fn validate(&self, config: &Value) -> Result<(), ActionError> {
        ParallelConfig::parse(config)?.validate()
    }

    #[instrument(skip(self, ctx, input), fields(execution_id = %ctx.execution_id))]
    async fn execute(&self, ctx: &ActionContext, input: ActionInput) -> Result<ActionOutput, ActionError> {
        let config = ParallelConfig::parse(&input.config)?;
        config.validate()?;

        let wait_mode = config.effective_wait_mode();
        let failure_mode = config.effective_failure_mode();
        let max_concurrency = config.effective_max_concurrency();
        let timeout_duration = config.timeout_duration();
        let branches = config.branches;
        let total_branches = branches.len();
        debug!(total_branches, max_concurrency, ?wait_mode, ?failure_mode, "starting parallel branches");

        let base_context = ExecutionContext::from_value(input.context);
        let sub_ctx = ctx.child_of(NodeId::generate());
        let execution_id = sub_ctx.execution_id;
        let cancellation = sub_ctx.cancellation_token().clone();

        let timeout_watchdog = timeout_duration.map(|duration| {
            let token = cancellation.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                token.cancel();
            })
        });

        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let (tx, mut rx) = mpsc::channel(total_branches.max(1));

        for branch in branches {
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            let cancellation = cancellation.clone();
            let branch_context = base_context.shallow_copy();
            let tx = tx.clone();
            tokio::spawn(run_branch(executor, execution_id, semaphore, cancellation, branch, branch_context, tx));
        }
        drop(tx);

        let mut results: Vec<BranchResult> = Vec::with_capacity(total_branches);
        let mut first_success: Option<BranchResult> = None;
        let mut stop_triggered = false;

        while let Some(result) = rx.recv().await {
            let is_err = result.error.is_some();
            if !is_err && wait_mode == WaitMode::First && first_success.is_none() {
                first_success = Some(result.clone());
                cancellation.cancel();
            }
            if is_err && failure_mode == FailureMode::StopAll && !stop_triggered {
                stop_triggered = true;
                warn!(branch = %result.name, "branch failed under stop_all, cancelling remaining branches");
                cancellation.cancel();
            }
            results.push(result);
            if results.len() >= total_branches {
                break;
            }
        }

        if let Some(handle) = timeout_watchdog {
            handle.abort();
        }

        let metadata = branch_metadata(wait_mode, failure_mode, total_branches, max_concurrency);

        match wait_mode {
            WaitMode::First => match first_success {
                Some(first) => {
                    let mut out = IndexMap::new();
                    out.insert("first_completed".to_string(), Value::from(first.name.clone()));
                    out.insert("result".to_string(), first.into());
                    Ok(with_metadata(ActionOutput::new(Value::Object(out)), metadata))
                }
                None => Err(first_error(&results)),
            },
            WaitMode::All => {
                let completed = results.len() as i64;
                let branches: Vec<Value> = results.iter().cloned().map(Into::into).collect();
                let mut out = IndexMap::new();
                out.insert("branches".to_string(), Value::Array(branches));
                out.insert("total_branches".to_string(), Value::Integer(total_branches as i64));
                out.insert("completed_branches".to_string(), Value::Integer(completed));

                if failure_mode == FailureMode::StopAll && results.iter().any(|r| r.error.is_some()) {
                    Err(first_error(&results))
                } else {
                    Ok(with_metadata(ActionOutput::new(Value::Object(out)), metadata))
                }
            }
        }
    }

    fn action_type(&self) -> &'static str {
        "engine:parallel"
    }
}

fn first_error(results: &[BranchResult]) -> ActionError {
    results
        .iter()
        .find_map(|r| r.error.clone())
        .map(ActionError::fatal)
        .unwrap_or_else(|| ActionError::fatal("all parallel branches failed"))
}

fn branch_metadata(
    wait_mode: WaitMode,
    failure_mode: FailureMode,
    branch_count: usize,
    max_concurrency: usize,
) -> IndexMap<String, Value> {
    let mut meta = IndexMap::new();
    meta.insert("branch_count".to_string(), Value::Integer(branch_count as i64));
    meta.insert(
        "wait_mode".to_string(),
        Value::from(if wait_mode == WaitMode::All { "all" } else { "first" }),
    );
    meta.insert(
        "failure_mode".to_string(),
        Value::from(if failure_mode == FailureMode::StopAll { "stop_all" } else { "continue" }),
    );
    meta.insert("max_concurrency".to_string(), Value::Integer(max_concurrency as i64));
    meta
}

fn with_metadata(mut output: ActionOutput, extra: IndexMap<String, Value>) -> ActionOutput {
    output.metadata.extend(extra);
    output
}

async fn run_branch(
    executor: Arc<dyn NodeExecutor>,
    execution_id: ExecutionId,
    semaphore: Arc<Semaphore>,
    cancellation: CancellationToken,
    branch: BranchConfig,
    mut branch_context: ExecutionContext,
    tx: mpsc::Sender<BranchResult>,
) {
    let start = Instant::now();

    let permit = tokio::select! {
        biased;
        () = cancellation.cancelled() => None,
        permit = semaphore.acquire_owned() => permit.ok(),
    };

    let result = if permit.is_none() {
        BranchResult {
            name: branch.name,
            output: IndexMap::new(),
            error: Some("cancelled".to_string()),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    } else {
        let outcome = run_sequence(executor.as_ref(), execution_id, &branch.nodes, &mut branch_context, &cancellation).await;
        let output = branch_context.steps().cloned().unwrap_or_default();
        match outcome {
            Ok(()) => BranchResult {
                name: branch.name,
                output,
                error: None,
                duration_ms: start.elapsed().as_millis() as u64,
            },
            Err((_, err)) => BranchResult {
                name: branch.name,
                output,
                error: Some(err.message()),
                duration_ms: start.elapsed().as_millis() as u64,
            },
        }
    };

    let _ = tx.send(result).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{ExecutionId, WorkflowId};
    use nebula_error::EngineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingExecutor {
        calls: AtomicUsize,
        fail_node: Option<String>,
    }

    #[async_trait]
    impl NodeExecutor for CountingExecutor {
        async fn execute(&self, _execution_id: ExecutionId, node_id: &str) -> Result<Value, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_node.as_deref() == Some(node_id) {
                return Err(EngineError::execution("boom", nebula_error::ErrorClassification::Permanent));
            }
            Ok(Value::from(node_id))
        }
    }

    fn action_ctx() -> ActionContext {
        ActionContext::new(ExecutionId::v4(), NodeId::generate(), WorkflowId::generate())
    }

    fn config(json: serde_json::Value) -> Value {
        Value::try_from(json).unwrap()
    }

    #[tokio::test]
    async fn all_branches_succeed_under_wait_all() {
        let executor = Arc::new(CountingExecutor { calls: AtomicUsize::new(0), fail_node: None });
        let action = ParallelAction::new(executor);
        let cfg = config(serde_json::json!({
            "branches": [
                {"name": "a", "nodes": ["n1"]},
                {"name": "b", "nodes": ["n2"]},
            ]
        }));
        let out = action
            .execute(&action_ctx(), ActionInput::new(cfg, None))
            .await
            .unwrap();
        assert_eq!(out.data.get("total_branches"), Some(&Value::Integer(2)));
        assert_eq!(out.data.get("completed_branches"), Some(&Value::Integer(2)));
    }

    #[tokio::test]
    async fn continue_mode_surfaces_errors_without_failing() {
        let executor = Arc::new(CountingExecutor {
            calls: AtomicUsize::new(0),
            fail_node: Some("bad".to_string()),
        });
        let action = ParallelAction::new(executor);
        let cfg = config(serde_json::json!({
            "branches": [
                {"name": "a", "nodes": ["bad"]},
                {"name": "b", "nodes": ["good"]},
            ],
            "failure_mode": "continue"
        }));
        let out = action
            .execute(&action_ctx(), ActionInput::new(cfg, None))
            .await
            .unwrap();
        let branches = out.data.get("branches").and_then(Value::as_array).unwrap();
        assert!(branches.iter().any(|b| b.get("error").map(|e| !e.is_null()).unwrap_or(false)));
    }

    #[tokio::test]
    async fn stop_all_mode_fails_the_composite() {
        let executor = Arc::new(CountingExecutor {
            calls: AtomicUsize::new(0),
            fail_node: Some("bad".to_string()),
        });
        let action = ParallelAction::new(executor);
        let cfg = config(serde_json::json!({
            "branches": [
                {"name": "a", "nodes": ["bad"]},
            ],
            "failure_mode": "stop_all"
        }));
        let result = action.execute(&action_ctx(), ActionInput::new(cfg, None)).await;
        assert!(result.is_err());
    }

    #[test]
    fn rejects_negative_max_concurrency() {
        let cfg = config(serde_json::json!({
            "branches": [{"name": "a", "nodes": ["n1"]}],
            "max_concurrency": -1
        }));
        let parsed = ParallelConfig::parse(&cfg).unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn rejects_empty_branches() {
        let cfg = config(serde_json::json!({ "branches": [] }));
        let parsed = ParallelConfig::parse(&cfg).unwrap();
        assert!(parsed.validate().is_err());
    }
}
