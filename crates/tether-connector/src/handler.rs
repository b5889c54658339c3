//! Action handler dispatch table.
//!
//! The action id string stays the wire contract, but it is resolved to a
//! typed handler exactly once, through a table built at connector
//! construction. Adding an action is a registration, not a new branch.

use std::collections::HashMap;

use futures::future::BoxFuture;

use crate::connector::{ActionRequest, ActionResult};
use crate::error::ConnectorError;

/// An action handler bound to a connector type.
pub type ActionHandler<C> =
    for<'a> fn(&'a C, ActionRequest) -> BoxFuture<'a, Result<ActionResult, ConnectorError>>;

/// Lookup table from action id to handler, built at startup.
pub struct HandlerTable<C> {
    handlers: HashMap<&'static str, ActionHandler<C>>,
}

impl<C> HandlerTable<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an action id.
    pub fn register(&mut self, action_id: &'static str, handler: ActionHandler<C>) -> &mut Self {
        self.handlers.insert(action_id, handler);
        self
    }

    /// Dispatch a request to the handler for `action_id`.
    pub async fn dispatch(
        &self,
        connector: &C,
        action_id: &str,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError> {
        let handler = self
            .handlers
            .get(action_id)
            .ok_or_else(|| ConnectorError::UnknownAction {
                action_id: action_id.to_string(),
            })?;
        handler(connector, request).await
    }

    /// Whether a handler is registered for the id.
    pub fn contains(&self, action_id: &str) -> bool {
        self.handlers.contains_key(action_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<C> Default for HandlerTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::ExecutionMode;
    use uuid::Uuid;

    struct Probe;

    fn ok_handler(_probe: &Probe, _request: ActionRequest) -> BoxFuture<'_, Result<ActionResult, ConnectorError>> {
        Box::pin(async {
            Ok(ActionResult {
                execution_mode: ExecutionMode::ReadOnly,
                output: serde_json::json!({"ok": true}),
                evidence: serde_json::Value::Null,
                snapshot: None,
                rollback_plan: None,
            })
        })
    }

    fn request() -> ActionRequest {
        ActionRequest {
            context: crate::connector::ActionContext {
                connection_id: Uuid::new_v4(),
                tenant_id: "acme".to_string(),
                access_token: "demo-x".to_string(),
            },
            input: serde_json::Value::Null,
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn dispatches_registered_handler() {
        let mut table: HandlerTable<Probe> = HandlerTable::new();
        table.register("probe.thing.read", ok_handler);

        let result = table
            .dispatch(&Probe, "probe.thing.read", request())
            .await
            .unwrap();
        assert_eq!(result.output["ok"], true);
    }

    #[tokio::test]
    async fn unknown_action_is_a_typed_error() {
        let table: HandlerTable<Probe> = HandlerTable::new();
        let err = table
            .dispatch(&Probe, "probe.missing.verb", request())
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::UnknownAction { .. }));
    }
}
