//! Dispatch of approved actions to registered operations.
//!
//! Per action: resolve → verify arguments → invoke → record. Any failure is
//! returned to the caller, who decides what happens to the rest of the batch
//! (the engine stops at the first failure).

use serde_json::Value;
use tracing::{debug, info, warn};

use gatehouse_contracts::{
    action::CandidateAction,
    error::{GatehouseError, GatehouseResult},
    workflow::WorkflowState,
};

use crate::{registry::OperationRegistry, traits::ArgumentVerifier};

/// Render an operation result the way it is stored in the tool response.
///
/// Strings are used verbatim; anything else becomes compact JSON.
pub fn stringify_result(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct ActionExecutor {
    registry: OperationRegistry,
    verifier: Box<dyn ArgumentVerifier>,
}

impl ActionExecutor {
    pub fn new(registry: OperationRegistry, verifier: Box<dyn ArgumentVerifier>) -> Self {
        Self { registry, verifier }
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Resolve, verify, and invoke one action without touching any state.
    pub fn invoke(&self, action: &CandidateAction) -> GatehouseResult<Value> {
        let operation = self.registry.lookup(&action.name)?;

        let schema = operation.argument_schema();
        if !schema.is_empty() {
            let arguments = Value::Object(action.arguments.clone());
            let report = self.verifier.verify(&arguments, &schema)?;
            if !report.passed {
                let reason = report.summary();
                warn!(action = %action.name, failures = %reason, "argument verification failed");
                return Err(GatehouseError::InvalidArguments {
                    name: action.name.clone(),
                    reason,
                });
            }
        }

        debug!(action = %action.name, action_id = %action.id, "invoking operation");
        operation.invoke(&action.arguments)
    }

    /// Invoke `action` and record its outcome into `state`.
    ///
    /// On success the `"name: result"` entry is appended to the tool
    /// response, the result is pushed to the context history, and the
    /// normalized record is added to the executed set. On failure `state`
    /// is left exactly as it was.
    pub fn execute(&self, state: &mut WorkflowState, action: &CandidateAction) -> GatehouseResult<String> {
        let result = self.invoke(action)?;
        let text = stringify_result(&result);

        state.append_tool_response(&action.name, &text);
        state.action_context.push_result(text.clone());
        state.action_context.record(action.to_record());

        info!(
            action = %action.name,
            executed_total = state.action_context.already_executed.len(),
            "action executed"
        );
        Ok(text)
    }
}
