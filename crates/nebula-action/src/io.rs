use crate::error::ActionError;
use indexmap::IndexMap;
use nebula_value::Value;
use serde::de::DeserializeOwned;

/// Deserialize a composite action's `Value` config into its typed
/// config struct, via the `serde_json` round trip every composite
/// action's own `*Config::parse` otherwise repeats by hand.
pub fn parse_config<T: DeserializeOwned>(config: &Value) -> Result<T, ActionError> {
    let json: serde_json::Value = config.clone().into();
    serde_json::from_value(json).map_err(|e| ActionError::Validation(e.to_string()))
}

/// Input passed to every action invocation (spec §3).
///
/// `context` is never absent at the type level — an action with no
/// execution context in scope still receives an empty object, matching
/// the spec's "never null; if absent it is an empty mapping" rule.
#[derive(Debug, Clone, Default)]
pub struct ActionInput {
    /// The action's resolved, already-interpolated configuration.
    pub config: Value,
    /// The execution context available for path resolution.
    pub context: Value,
}

impl ActionInput {
    /// Construct an input, defaulting an absent context to an empty object.
    #[must_use]
    pub fn new(config: Value, context: Option<Value>) -> Self {
        Self {
            config,
            context: context.unwrap_or_else(Value::empty_object),
        }
    }
}

/// Output produced by every action invocation (spec §3).
///
/// `metadata` is for observability only and never participates in
/// downstream data flow — composite actions must not read it back as
/// input to another node.
#[derive(Debug, Clone, Default)]
pub struct ActionOutput {
    /// The node's result value, written under `steps[node_id]`.
    pub data: Value,
    /// Observability-only key/value annotations (timing, branch counts, ...).
    pub metadata: IndexMap<String, Value>,
}

impl ActionOutput {
    /// Construct an output with no metadata.
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            data,
            metadata: IndexMap::new(),
        }
    }

    /// Attach a metadata field, builder-style.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_context_defaults_to_empty_object() {
        let input = ActionInput::new(Value::Integer(1), None);
        assert_eq!(input.context, Value::empty_object());
    }

    #[test]
    fn metadata_does_not_touch_data() {
        let output = ActionOutput::new(Value::from("result")).with_metadata("branch_count", 3i64);
        assert_eq!(output.data, Value::from("result"));
        assert_eq!(output.metadata.get("branch_count"), Some(&Value::Integer(3)));
    }
}
