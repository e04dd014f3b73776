//! Structured exception handling over one or more node sequences
//! (spec §4.5), plus the standalone catch-chain filter (spec §4.6).

use crate::sequence::run_sequence;
use async_trait::async_trait;
use indexmap::IndexMap;
use nebula_action::{Action, ActionContext, ActionError, ActionInput, ActionOutput, ErrorHandlingMetadata, RecoveryAction};
use nebula_error::ErrorClassification;
use nebula_execution::ExecutionContext;
use nebula_resilience::Pattern;
use nebula_value::Value;
use nebula_workflow::NodeExecutor;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

const DEFAULT_ERROR_BINDING: &str = "error";

#[derive(Debug, Deserialize)]
struct TryCatchConfig {
    try_nodes: Vec<String>,
    #[serde(default)]
    catch_nodes: Vec<String>,
    #[serde(default)]
    finally_nodes: Vec<String>,
    error_binding: Option<String>,
}

impl TryCatchConfig {
    fn parse(config: &Value) -> Result<Self, ActionError> {
        nebula_action::parse_config(config)
    }

    fn validate(&self) -> Result<(), ActionError> {
        if self.try_nodes.is_empty() {
            return Err(ActionError::Validation("try_nodes must not be empty".into()));
        }
        Ok(())
    }

    fn error_binding(&self) -> &str {
        self.error_binding.as_deref().unwrap_or(DEFAULT_ERROR_BINDING)
    }
}

/// Runs `try_nodes`, routes a failure through `catch_nodes`, and always
/// runs `finally_nodes` last.
pub struct TryCatchFinallyAction {
    executor: Arc<dyn NodeExecutor>,
}

impl TryCatchFinallyAction {
    /// Construct a Try/Catch/Finally action that invokes children through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn NodeExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Action for TryCatchFinallyAction {
    fn validate(&self, config: &Value) -> Result<(), ActionError> {
        TryCatchConfig::parse(config)?.validate()
    }

    #[instrument(skip(self, ctx, input), fields(execution_id = %ctx.execution_id))]
    async fn execute(&self, ctx: &ActionContext, input: ActionInput) -> Result<ActionOutput, ActionError> {
        let config = TryCatchConfig::parse(&input.config)?;
        config.validate()?;

        let execution_id = ctx.execution_id;
        let cancellation = ctx.cancellation_token().clone();

        let mut try_context = ExecutionContext::from_value(input.context.clone());
        let try_outcome = run_sequence(self.executor.as_ref(), execution_id, &config.try_nodes, &mut try_context, &cancellation).await;

        let mut out = IndexMap::new();
        let mut caught = false;
        let mut propagate: Option<ActionError> = None;
        let mut last_context = try_context;

        match try_outcome {
            Ok(()) => {
                out.insert("try_output".to_string(), Value::Object(last_context.steps().cloned().unwrap_or_default()));
            }
            Err((failed_node, action_err)) => {
                debug!(node = %failed_node, error = %action_err.message(), "try block failed");
                let mut metadata = ErrorHandlingMetadata::new(
                    action_err.kind_name(),
                    action_err.message(),
                    action_err.classification(),
                    failed_node,
                    "unknown",
                );

                if config.catch_nodes.is_empty() {
                    propagate = Some(action_err);
                } else {
                    let mut catch_context = ExecutionContext::from_value(last_context.as_value().clone());
                    bind_error(&mut catch_context, config.error_binding(), &metadata);

                    match run_sequence(self.executor.as_ref(), execution_id, &config.catch_nodes, &mut catch_context, &cancellation).await {
                        Ok(()) => {
                            caught = true;
                            metadata.recovery_action = RecoveryAction::Handled;
                            metadata.caught_by = config.catch_nodes.first().cloned();
                            out.insert(
                                "catch_output".to_string(),
                                Value::Object(catch_context.steps().cloned().unwrap_or_default()),
                            );
                            last_context = catch_context;
                        }
                        Err((_, catch_err)) => {
                            metadata.recovery_action = RecoveryAction::Failed;
                            propagate = Some(ActionError::fatal(format!(
                                "try failed: {}; catch also failed: {}",
                                action_err.message(),
                                catch_err.message()
                            )));
                        }
                    }
                }

                out.insert("try_error".to_string(), metadata_to_value(&metadata));
            }
        }

        if !config.finally_nodes.is_empty() {
            let mut finally_context = last_context;
            match run_sequence(self.executor.as_ref(), execution_id, &config.finally_nodes, &mut finally_context, &cancellation).await {
                Ok(()) => {
                    out.insert(
                        "finally_output".to_string(),
                        Value::Object(finally_context.steps().cloned().unwrap_or_default()),
                    );
                }
                Err((_, finally_err)) => return Err(finally_err),
            }
        }

        if let Some(err) = propagate {
            return Err(err);
        }

        out.insert("success".to_string(), Value::Bool(true));
        out.insert("error_handled".to_string(), Value::Bool(caught));
        Ok(ActionOutput::new(Value::Object(out)))
    }

    fn action_type(&self) -> &'static str {
        "engine:try_catch_finally"
    }
}

fn bind_error(context: &mut ExecutionContext, binding: &str, metadata: &ErrorHandlingMetadata) {
    context.bind(binding.to_string(), metadata_to_value(metadata));
}

fn metadata_to_value(metadata: &ErrorHandlingMetadata) -> Value {
    let json = serde_json::to_value(metadata).expect("ErrorHandlingMetadata always serializes");
    Value::try_from(json).unwrap_or(Value::Null)
}

#[derive(Debug, Deserialize)]
struct CatchFilterConfig {
    error_binding: Option<String>,
    #[serde(default)]
    error_types: Vec<String>,
    #[serde(default)]
    error_patterns: Vec<String>,
}

impl CatchFilterConfig {
    fn parse(config: &Value) -> Result<Self, ActionError> {
        nebula_action::parse_config(config)
    }

    fn binding(&self) -> &str {
        self.error_binding.as_deref().unwrap_or(DEFAULT_ERROR_BINDING)
    }
}

/// A leaf action usable in a catch chain that decides whether the error
/// bound under `error_binding` matches its filters (spec §4.6).
pub struct CatchFilterAction;

#[async_trait]
impl Action for CatchFilterAction {
    async fn execute(&self, _ctx: &ActionContext, input: ActionInput) -> Result<ActionOutput, ActionError> {
        let config = CatchFilterConfig::parse(&input.config)?;
        let bound = input.context.get(config.binding()).cloned().unwrap_or(Value::Null);

        if config.error_types.is_empty() && config.error_patterns.is_empty() {
            return Ok(ActionOutput::new(bound));
        }

        let error_type = bound.get("error_type").and_then(Value::as_str).unwrap_or_default();
        let classification = bound.get("classification").and_then(Value::as_str).unwrap_or_default();
        let error_message = bound.get("error_message").and_then(Value::as_str).unwrap_or_default();

        let type_matches = config.error_types.iter().any(|t| t == error_type || t == classification);
        let pattern_matches = config
            .error_patterns
            .iter()
            .any(|p| Pattern::compile(p).matches(error_message));

        if type_matches || pattern_matches {
            Ok(ActionOutput::new(bound))
        } else {
            Err(ActionError::fatal("error not caught by this catch block"))
        }
    }

    fn action_type(&self) -> &'static str {
        "engine:catch_filter"
    }
}
