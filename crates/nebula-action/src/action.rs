use crate::context::ActionContext;
use crate::error::ActionError;
use crate::io::{ActionInput, ActionOutput};
use async_trait::async_trait;

/// The action contract (spec §4.2): every leaf action and every composite
/// action in this crate family implements this trait.
///
/// `execute` takes `&self` rather than `&mut self` because the registry
/// hands out freshly-constructed instances per invocation (see
/// [`ActionRegistry`](crate::registry::ActionRegistry)); an action should
/// hold no per-invocation mutable state across calls.
#[async_trait]
pub trait Action: Send + Sync {
    /// Run this action once against `input`, observing `ctx`'s
    /// cancellation token.
    async fn execute(&self, ctx: &ActionContext, input: ActionInput) -> Result<ActionOutput, ActionError>;

    /// Validate `config` before any side effect occurs. The default
    /// implementation accepts everything; actions with required fields
    /// override this to fail fast.
    fn validate(&self, _config: &nebula_value::Value) -> Result<(), ActionError> {
        Ok(())
    }

    /// The `category:name` type string this action was registered under,
    /// used in error messages and observability.
    fn action_type(&self) -> &'static str;
}
