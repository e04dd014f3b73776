//! Re-invokes a single target node under a backoff policy until it
//! succeeds, the attempt budget is exhausted, the error is classified
//! non-retryable, or the context is cancelled (spec §4.4).

use async_trait::async_trait;
use indexmap::IndexMap;
use nebula_action::{Action, ActionContext, ActionError, ActionInput, ActionOutput};
use nebula_execution::ExecutionContext;
use nebula_resilience::{classify_compiled, BackoffPolicy, BackoffStrategy, CompiledPatterns, RetryAttempt};
use nebula_value::Value;
use nebula_workflow::NodeExecutor;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

fn default_strategy() -> BackoffStrategy {
    BackoffStrategy::Fixed
}

fn default_multiplier() -> f64 {
    2.0
}

#[derive(Debug, Deserialize)]
struct RetryConfig {
    #[serde(default)]
    max_attempts: u32,
    #[serde(default)]
    initial_delay_ms: u64,
    #[serde(default)]
    max_delay_ms: u64,
    #[serde(default = "default_strategy")]
    strategy: BackoffStrategy,
    #[serde(default = "default_multiplier")]
    multiplier: f64,
    #[serde(default)]
    retryable_errors: Vec<String>,
    #[serde(default)]
    non_retryable_errors: Vec<String>,
}

impl RetryConfig {
    fn parse(config: &Value) -> Result<Self, ActionError> {
        nebula_action::parse_config(config)
    }

    fn validate(&self) -> Result<(), ActionError> {
        if self.max_delay_ms != 0 && self.max_delay_ms < self.initial_delay_ms {
            return Err(ActionError::Validation(
                "max_delay_ms must be at least initial_delay_ms when non-zero".into(),
            ));
        }
        Ok(())
    }

    fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            strategy: self.strategy,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
        }
    }
}

/// Drives retries of a single node referenced via `context.retry_node_id`.
pub struct RetryAction {
    executor: Arc<dyn NodeExecutor>,
}

impl RetryAction {
    /// Construct a Retry action that invokes its target through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn NodeExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Action for RetryAction {
    fn validate(&self, config: &Value) -> Result<(), ActionError> {
        RetryConfig::parse(config)?.validate()
    }

    #[instrument(skip(self, ctx, input), fields(execution_id = %ctx.execution_id))]
    async fn execute(&self, ctx: &ActionContext, input: ActionInput) -> Result<ActionOutput, ActionError> {
        let config = RetryConfig::parse(&input.config)?;
        config.validate()?;

        let exec_context = ExecutionContext::from_value(input.context);
        let target = exec_context
            .retry_node_id()
            .ok_or_else(|| ActionError::Validation("context.retry_node_id is required".into()))?
            .to_string();
        debug!(target = %target, max_attempts = config.max_attempts, "starting retry loop");

        let policy = config.backoff_policy();
        let total_attempts = config.max_attempts.saturating_add(1);
        let mut attempts: Vec<RetryAttempt> = Vec::new();
        let retryable_patterns = CompiledPatterns::compile(&config.retryable_errors);
        let non_retryable_patterns = CompiledPatterns::compile(&config.non_retryable_errors);

        for attempt in 0..total_attempts {
            if ctx.is_cancelled() {
                return Err(ActionError::Cancelled);
            }

            match self.executor.execute(ctx.execution_id, &target).await {
                Ok(output) => {
                    attempts.push(RetryAttempt::success(attempt, None));
                    return Ok(success_output(output, &attempts, attempt));
                }
                Err(engine_err) => {
                    let action_err = ActionError::from(engine_err);
                    let message = action_err.message();
                    let classification = action_err.classification();
                    let retryable = classify_compiled(&message, classification, &retryable_patterns, &non_retryable_patterns);
                    let is_last = attempt + 1 == total_attempts;

                    if !retryable || is_last {
                        warn!(attempt, retryable, is_last, "retry giving up on target node");
                        attempts.push(RetryAttempt::failure(attempt, message, action_err.kind_name(), classification, None));
                        return Err(action_err);
                    }

                    let delay = policy.delay_for(attempt);
                    tokio::select! {
                        () = ctx.cancellation_token().cancelled() => return Err(ActionError::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                    attempts.push(RetryAttempt::failure(
                        attempt,
                        message,
                        action_err.kind_name(),
                        classification,
                        Some(delay.as_millis() as u64),
                    ));
                }
            }
        }

        unreachable!("the loop above always returns before attempts are exhausted")
    }

    fn action_type(&self) -> &'static str {
        "engine:retry"
    }
}

fn success_output(output: Value, attempts: &[RetryAttempt], succeeded_at: u32) -> ActionOutput {
    let mut data = IndexMap::new();
    data.insert("output".to_string(), output);
    data.insert("attempts".to_string(), Value::Array(attempts.iter().map(attempt_to_value).collect()));
    data.insert("success".to_string(), Value::Bool(true));
    data.insert("retries".to_string(), Value::Integer(succeeded_at as i64));
    ActionOutput::new(Value::Object(data))
}

fn attempt_to_value(attempt: &RetryAttempt) -> Value {
    let json = serde_json::to_value(attempt).expect("RetryAttempt always serializes");
    Value::try_from(json).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nebula_core::{ExecutionId, NodeId, WorkflowId};
    use nebula_error::EngineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyExecutor {
        failures_before_success: usize,
        attempts_made: AtomicUsize,
    }

    #[async_trait]
    impl NodeExecutor for FlakyExecutor {
        async fn execute(&self, _execution_id: ExecutionId, node_id: &str) -> Result<Value, EngineError> {
            let n = self.attempts_made.fetch_add(1, Ordering::SeqCst);
            if n < self.failures_before_success {
                Err(EngineError::execution("connection reset", nebula_error::ErrorClassification::Transient))
            } else {
                Ok(Value::from(node_id))
            }
        }
    }

    fn action_ctx() -> ActionContext {
        ActionContext::new(ExecutionId::v4(), NodeId::generate(), WorkflowId::generate())
    }

    fn context_with_target(node_id: &str) -> Value {
        let mut root = indexmap::IndexMap::new();
        root.insert("retry_node_id".to_string(), Value::from(node_id));
        Value::Object(root)
    }

    fn config(json: serde_json::Value) -> Value {
        Value::try_from(json).unwrap()
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let executor = Arc::new(FlakyExecutor {
            failures_before_success: 2,
            attempts_made: AtomicUsize::new(0),
        });
        let action = RetryAction::new(executor);
        let cfg = config(serde_json::json!({
            "max_attempts": 5,
            "initial_delay_ms": 1,
            "strategy": "fixed"
        }));
        let input = ActionInput::new(cfg, Some(context_with_target("node-1")));
        let out = action.execute(&action_ctx(), input).await.unwrap();
        assert_eq!(out.data.get("success"), Some(&Value::Bool(true)));
        assert_eq!(out.data.get("retries"), Some(&Value::Integer(2)));
    }

    #[tokio::test]
    async fn exhausts_attempt_budget_and_fails() {
        let executor = Arc::new(FlakyExecutor {
            failures_before_success: 100,
            attempts_made: AtomicUsize::new(0),
        });
        let action = RetryAction::new(executor);
        let cfg = config(serde_json::json!({
            "max_attempts": 1,
            "initial_delay_ms": 1,
            "strategy": "fixed"
        }));
        let input = ActionInput::new(cfg, Some(context_with_target("node-1")));
        let err = action.execute(&action_ctx(), input).await.unwrap_err();
        assert!(matches!(err, ActionError::Retryable { .. } | ActionError::Fatal { .. }));
    }

    struct UnknownClassificationExecutor {
        attempts_made: AtomicUsize,
    }

    #[async_trait]
    impl NodeExecutor for UnknownClassificationExecutor {
        async fn execute(&self, _execution_id: ExecutionId, _node_id: &str) -> Result<Value, EngineError> {
            self.attempts_made.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::execution("upstream connection timeout", nebula_error::ErrorClassification::Unknown))
        }
    }

    #[tokio::test]
    async fn unknown_classification_falls_back_to_substring_heuristic() {
        // The node reports no classification at all (e.g. a structural or
        // configuration error crossing from EngineError); retry should
        // still recognize "timeout" via the heuristic fallback rather
        // than treating the lost signal as permanent and giving up after
        // a single attempt.
        let executor = Arc::new(UnknownClassificationExecutor {
            attempts_made: AtomicUsize::new(0),
        });
        let calls = Arc::clone(&executor);
        let action = RetryAction::new(executor);
        let cfg = config(serde_json::json!({
            "max_attempts": 2,
            "initial_delay_ms": 1
        }));
        let input = ActionInput::new(cfg, Some(context_with_target("node-1")));
        action.execute(&action_ctx(), input).await.unwrap_err();
        assert_eq!(calls.attempts_made.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_pattern_stops_immediately() {
        let executor = Arc::new(FlakyExecutor {
            failures_before_success: 100,
            attempts_made: AtomicUsize::new(0),
        });
        let calls = Arc::clone(&executor);
        let action = RetryAction::new(executor);
        let cfg = config(serde_json::json!({
            "max_attempts": 10,
            "initial_delay_ms": 1,
            "non_retryable_errors": ["connection reset"]
        }));
        let input = ActionInput::new(cfg, Some(context_with_target("node-1")));
        action.execute(&action_ctx(), input).await.unwrap_err();
        assert_eq!(calls.attempts_made.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exponential_jitter_delays_stay_within_bounds_of_base_sequence() {
        let executor = Arc::new(FlakyExecutor {
            failures_before_success: 3,
            attempts_made: AtomicUsize::new(0),
        });
        let action = RetryAction::new(executor);
        let cfg = config(serde_json::json!({
            "max_attempts": 3,
            "initial_delay_ms": 100,
            "max_delay_ms": 1000,
            "multiplier": 2.0,
            "strategy": "exponential_jitter"
        }));
        let input = ActionInput::new(cfg, Some(context_with_target("node-1")));
        let out = action.execute(&action_ctx(), input).await.unwrap();

        assert_eq!(out.data.get("success"), Some(&Value::Bool(true)));
        let attempts = out.data.get("attempts").and_then(Value::as_array).unwrap();
        assert_eq!(attempts.len(), 4);

        let base_delays_ms = [100.0, 200.0, 400.0];
        for (attempt, base) in base_delays_ms.iter().enumerate() {
            let delay_ms = attempts[attempt]
                .get("delay_ms")
                .and_then(|v| match v {
                    Value::Integer(i) => Some(*i as f64),
                    _ => None,
                })
                .expect("failed attempts record a delay_ms");
            assert!(delay_ms >= base * 0.75 - 1.0, "attempt {attempt}: {delay_ms} too low for base {base}");
            assert!(delay_ms <= base * 1.25 + 1.0, "attempt {attempt}: {delay_ms} too high for base {base}");
        }
    }

    #[tokio::test]
    async fn missing_retry_target_is_a_validation_error() {
        let executor = Arc::new(FlakyExecutor {
            failures_before_success: 0,
            attempts_made: AtomicUsize::new(0),
        });
        let action = RetryAction::new(executor);
        let cfg = config(serde_json::json!({ "max_attempts": 1 }));
        let err = action
            .execute(&action_ctx(), ActionInput::new(cfg, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
    }
}
