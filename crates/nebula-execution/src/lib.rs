//! # Nebula Execution
//!
//! The per-execution context (spec §3): a `Value::Object` wrapper
//! conventionally carrying `trigger`, `steps`, `env`, and an
//! engine-managed `_execution` frame (`depth`, `workflow_chain`). Kept as
//! a thin newtype over `Value` rather than a bespoke struct so that any
//! action can still treat it as an ordinary mapping for path resolution.

use indexmap::IndexMap;
use nebula_value::Value;
use thiserror::Error;

const STEPS_KEY: &str = "steps";
const TRIGGER_KEY: &str = "trigger";
const ENV_KEY: &str = "env";
const FRAME_KEY: &str = "_execution";
const DEPTH_KEY: &str = "depth";
const CHAIN_KEY: &str = "workflow_chain";
const RETRY_NODE_ID_KEY: &str = "retry_node_id";

/// Raised when code tries to overwrite an already-completed step output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("step '{0}' output is immutable once set")]
pub struct StepAlreadySetError(pub String);

/// The per-execution context, wrapping a `Value::Object`.
///
/// Once a node id appears under `steps`, its value is immutable for the
/// remainder of that execution (spec §3 invariant) — [`set_step`]
/// enforces this rather than leaving it to caller discipline.
///
/// [`set_step`]: ExecutionContext::set_step
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    inner: Value,
}

impl ExecutionContext {
    /// Build a fresh root context with the given trigger input and
    /// environment metadata, an empty `steps` mapping, and an
    /// `_execution` frame at depth 0 with no ancestry.
    #[must_use]
    pub fn new(trigger: Value, env: Value) -> Self {
        let mut root = IndexMap::new();
        root.insert(TRIGGER_KEY.to_string(), trigger);
        root.insert(STEPS_KEY.to_string(), Value::empty_object());
        root.insert(ENV_KEY.to_string(), env);
        root.insert(FRAME_KEY.to_string(), execution_frame(0, &[]));
        Self {
            inner: Value::Object(root),
        }
    }

    /// Wrap an existing `Value::Object` as a context as-is, without
    /// imposing the conventional shape. Used when deserializing a
    /// context handed in from a driver.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        Self { inner: value }
    }

    /// Borrow the underlying value, e.g. to hand to the path resolver.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.inner
    }

    /// Consume this context, returning the underlying value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.inner
    }

    fn object_mut(&mut self) -> &mut IndexMap<String, Value> {
        if !matches!(self.inner, Value::Object(_)) {
            self.inner = Value::empty_object();
        }
        self.inner.as_object_mut().expect("just ensured Object")
    }

    /// The `trigger` field, if present.
    #[must_use]
    pub fn trigger(&self) -> Option<&Value> {
        self.inner.get(TRIGGER_KEY)
    }

    /// The `steps` mapping, if present.
    #[must_use]
    pub fn steps(&self) -> Option<&IndexMap<String, Value>> {
        self.inner.get(STEPS_KEY).and_then(Value::as_object)
    }

    /// A single node's recorded output, if it has completed.
    #[must_use]
    pub fn get_step(&self, node_id: &str) -> Option<&Value> {
        self.steps().and_then(|steps| steps.get(node_id))
    }

    /// Record a node's output under `steps[node_id]`.
    ///
    /// Fails if `node_id` already has a recorded output — step outputs
    /// are immutable once set for the lifetime of the execution.
    pub fn set_step(&mut self, node_id: impl Into<String>, value: Value) -> Result<(), StepAlreadySetError> {
        let node_id = node_id.into();
        if self.get_step(&node_id).is_some() {
            return Err(StepAlreadySetError(node_id));
        }
        let root = self.object_mut();
        let steps_entry = root
            .entry(STEPS_KEY.to_string())
            .or_insert_with(Value::empty_object);
        if let Some(steps) = steps_entry.as_object_mut() {
            steps.insert(node_id, value);
        }
        Ok(())
    }

    /// The `env` field, if present.
    #[must_use]
    pub fn env(&self) -> Option<&Value> {
        self.inner.get(ENV_KEY)
    }

    /// Bind an arbitrary top-level field on the context, e.g. the error
    /// metadata a catch block inspects. Unlike [`set_step`](Self::set_step)
    /// this is unconditional: rebinding an existing key overwrites it.
    pub fn bind(&mut self, key: impl Into<String>, value: Value) {
        self.object_mut().insert(key.into(), value);
    }

    /// The sub-workflow nesting depth recorded in `_execution.depth` (default 0).
    #[must_use]
    pub fn depth(&self) -> i64 {
        self.inner
            .get(FRAME_KEY)
            .and_then(|frame| frame.get(DEPTH_KEY))
            .and_then(|v| match v {
                Value::Integer(i) => Some(*i),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// The workflow ids on the active ancestry path, from
    /// `_execution.workflow_chain` (default empty).
    #[must_use]
    pub fn workflow_chain(&self) -> Vec<String> {
        self.inner
            .get(FRAME_KEY)
            .and_then(|frame| frame.get(CHAIN_KEY))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// The target node id for a retry action, from `context.retry_node_id`.
    #[must_use]
    pub fn retry_node_id(&self) -> Option<&str> {
        self.inner.get(RETRY_NODE_ID_KEY).and_then(Value::as_str)
    }

    /// Build the child context a sub-workflow invocation should run under:
    /// `depth + 1`, and `workflow_chain` extended with `workflow_id`.
    #[must_use]
    pub fn child_for_sub_workflow(&self, workflow_id: &str) -> Self {
        let mut chain = self.workflow_chain();
        chain.push(workflow_id.to_string());
        let mut root = self
            .inner
            .as_object()
            .cloned()
            .unwrap_or_else(IndexMap::new);
        root.insert(FRAME_KEY.to_string(), execution_frame(self.depth() + 1, &chain));
        Self {
            inner: Value::Object(root),
        }
    }

    /// An independent copy suitable for a Parallel branch: branch-local
    /// writes to `steps` do not escape to siblings or the parent (spec
    /// §4.3, §9). This is a full clone of the underlying tree (see
    /// [`Value::shallow_copy`]'s doc), not a cheap top-level-only copy.
    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        Self {
            inner: self.inner.shallow_copy(),
        }
    }
}

fn execution_frame(depth: i64, workflow_chain: &[String]) -> Value {
    let mut frame = IndexMap::new();
    frame.insert(DEPTH_KEY.to_string(), Value::Integer(depth));
    frame.insert(
        CHAIN_KEY.to_string(),
        Value::Array(workflow_chain.iter().map(|id| Value::from(id.as_str())).collect()),
    );
    Value::Object(frame)
}
