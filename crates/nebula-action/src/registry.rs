use crate::action::Action;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::io::{ActionInput, ActionOutput};
use async_trait::async_trait;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

type Factory = Arc<dyn Fn() -> Box<dyn Action> + Send + Sync>;

/// Process-wide mapping from action-type string (`category:name`) to a
/// factory that produces a fresh action instance (spec §4.2).
///
/// Backed by [`DashMap`] — unlike the teacher's instance-keyed
/// `HashMap<String, Arc<dyn Action>>` behind `&mut self`, this spec calls
/// for concurrent-safe registration *and* creation from many callers at
/// once, which a factory map under a lock-free concurrent map gives for
/// free.
pub struct ActionRegistry {
    factories: DashMap<String, Factory>,
}

impl ActionRegistry {
    /// Construct an empty registry with no built-in registrations.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: DashMap::new(),
        }
    }

    /// Construct a registry with the built-in stub registrations
    /// (`action:http`, `action:transform`, `action:formula`, `action:code`).
    ///
    /// The leaf action implementations behind these are explicitly out of
    /// scope (spec §1): each factory here produces an
    /// [`UnimplementedLeafAction`] that fails clearly if invoked, rather
    /// than silently no-op'ing.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        for ty in ["action:http", "action:transform", "action:formula", "action:code"] {
            registry.register(ty, {
                let ty = ty.to_string();
                move || -> Box<dyn Action> { Box::new(UnimplementedLeafAction::new(ty.clone())) }
            });
        }
        registry
    }

    /// Register a factory under `action_type`, replacing any existing
    /// registration for the same type.
    pub fn register<F>(&self, action_type: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Action> + Send + Sync + 'static,
    {
        self.factories.insert(action_type.into(), Arc::new(factory));
    }

    /// Create a fresh instance of the action registered under `action_type`.
    pub fn create(&self, action_type: &str) -> Result<Box<dyn Action>, ActionError> {
        self.factories
            .get(action_type)
            .map(|factory| factory())
            .ok_or_else(|| ActionError::UnknownType(action_type.to_string()))
    }

    /// Returns `true` if a factory is registered for `action_type`.
    #[must_use]
    pub fn is_registered(&self, action_type: &str) -> bool {
        self.factories.contains_key(action_type)
    }

    /// All currently registered action-type strings, in no particular order.
    #[must_use]
    pub fn registered_types(&self) -> Vec<String> {
        self.factories.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// A process-wide default registry, populated with the built-in stub
/// leaf actions. Engines that don't need a custom registry per tenant
/// can share this one.
pub static DEFAULT_REGISTRY: Lazy<ActionRegistry> = Lazy::new(ActionRegistry::with_builtins);

/// Placeholder for a leaf action whose real implementation lives outside
/// this engine (HTTP client, SQL/NoSQL drivers, script sandbox, ...).
///
/// Registered under the built-in `action:*` types so `ActionRegistry`
/// reflects the full catalogue spec §4.2 names, without pretending this
/// crate implements network or script execution.
pub struct UnimplementedLeafAction {
    action_type: String,
}

impl UnimplementedLeafAction {
    /// Construct a stub bound to the given `category:name` type string.
    #[must_use]
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
        }
    }
}

#[async_trait]
impl Action for UnimplementedLeafAction {
    async fn execute(&self, _ctx: &ActionContext, _input: ActionInput) -> Result<ActionOutput, ActionError> {
        Err(ActionError::fatal(format!(
            "leaf action '{}' is an external collaborator not implemented by this engine",
            self.action_type
        )))
    }

    fn action_type(&self) -> &'static str {
        "action:unimplemented"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::{ExecutionId, NodeId, WorkflowId};
    use nebula_value::Value;

    #[test]
    fn builtins_are_registered() {
        let registry = ActionRegistry::with_builtins();
        assert!(registry.is_registered("action:http"));
        assert!(registry.is_registered("action:transform"));
        assert!(registry.is_registered("action:formula"));
        assert!(registry.is_registered("action:code"));
        assert_eq!(registry.registered_types().len(), 4);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let registry = ActionRegistry::empty();
        assert!(registry.create("made:up").is_err());
    }

    #[test]
    fn register_replaces_existing_factory() {
        let registry = ActionRegistry::empty();
        registry.register("x", || Box::new(UnimplementedLeafAction::new("x")) as Box<dyn Action>);
        assert!(registry.is_registered("x"));
        registry.register("x", || Box::new(UnimplementedLeafAction::new("x-v2")) as Box<dyn Action>);
        assert_eq!(registry.registered_types().len(), 1);
    }

    #[tokio::test]
    async fn unimplemented_leaf_action_fails_clearly() {
        let registry = ActionRegistry::with_builtins();
        let action = registry.create("action:http").unwrap();
        let ctx = ActionContext::new(ExecutionId::v4(), NodeId::generate(), WorkflowId::generate());
        let result = action
            .execute(&ctx, ActionInput::new(Value::empty_object(), None))
            .await;
        assert!(result.is_err());
    }
}
