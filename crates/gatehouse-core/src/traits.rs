//! Collaborator traits for the workflow engine.
//!
//! These traits are the seams between the engine and the outside world:
//!
//! - `ActionProposer`: untrusted suggestion source (usually an LLM)
//! - `Operation`: one side-effecting call against the external system
//! - `ArgumentVerifier`: checks arguments before an operation runs
//! - `CheckpointStore`: durable workflow state keyed by thread id
//! - `EventSink`: the transport adapter receiving step events
//!
//! All of them are constructed once by the hosting application and injected
//! into the engine.

use std::sync::Arc;

use serde_json::{Map, Value};

use gatehouse_contracts::{
    action::{ActionContext, CandidateAction},
    error::{GatehouseError, GatehouseResult},
    event::StepEvent,
    verify::{ArgumentSchema, VerificationReport},
    workflow::{ThreadId, WorkflowState},
};

/// Turns a request plus execution history into candidate actions.
///
/// An empty list is a meaningful answer: nothing (more) needs to be done.
/// An `Err` is treated as a proposal failure and ends the workflow.
pub trait ActionProposer: Send + Sync {
    fn propose(&self, query: &str, context: &ActionContext) -> GatehouseResult<Vec<CandidateAction>>;
}

/// A named, side-effecting operation.
///
/// Operations are assumed NOT idempotent. The engine guarantees an
/// operation is never invoked twice with the same normalized arguments
/// within one workflow.
pub trait Operation: Send + Sync {
    /// Registry key. Must be unique within a registry.
    fn name(&self) -> &str;

    /// Shown to the approver next to each proposed call.
    fn description(&self) -> &str;

    /// Constraints checked before `invoke`. The default accepts anything.
    fn argument_schema(&self) -> ArgumentSchema {
        ArgumentSchema::default()
    }

    /// Perform the operation. May block on I/O.
    fn invoke(&self, arguments: &Map<String, Value>) -> GatehouseResult<Value>;
}

/// Checks an argument object against an operation's schema.
pub trait ArgumentVerifier: Send + Sync {
    /// Return a report with `passed = false` for rule failures. `Err` is
    /// reserved for the verifier itself being unable to run.
    fn verify(&self, arguments: &Value, schema: &ArgumentSchema) -> GatehouseResult<VerificationReport>;
}

/// Exclusive use of one thread id, released when dropped.
pub type ThreadClaim = Box<dyn Send>;

/// Durable storage for workflow state.
///
/// The store is the only source of truth between a suspension and its
/// resumption. `load` must observe the most recent `save` for a thread id.
pub trait CheckpointStore: Send + Sync {
    /// Claim `thread_id` against every engine sharing this store, including
    /// engines in other processes.
    ///
    /// Stores private to one process return `None` and rely on the engine's
    /// own per-thread locks. Shared stores return
    /// `GatehouseError::ResumeConflict` while another claim is held.
    fn claim(&self, _thread_id: &ThreadId) -> GatehouseResult<Option<ThreadClaim>> {
        Ok(None)
    }

    fn save(&self, thread_id: &ThreadId, state: &WorkflowState) -> GatehouseResult<()>;

    /// Returns `GatehouseError::CheckpointNotFound` for unknown thread ids.
    fn load(&self, thread_id: &ThreadId) -> GatehouseResult<WorkflowState>;

    /// Like `load`, but maps "not found" to `None`.
    fn try_load(&self, thread_id: &ThreadId) -> GatehouseResult<Option<WorkflowState>> {
        match self.load(thread_id) {
            Ok(state) => Ok(Some(state)),
            Err(GatehouseError::CheckpointNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// The transport adapter: receives every step event in order.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &StepEvent) -> GatehouseResult<()>;
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for Arc<T> {
    fn claim(&self, thread_id: &ThreadId) -> GatehouseResult<Option<ThreadClaim>> {
        (**self).claim(thread_id)
    }

    fn save(&self, thread_id: &ThreadId, state: &WorkflowState) -> GatehouseResult<()> {
        (**self).save(thread_id, state)
    }

    fn load(&self, thread_id: &ThreadId) -> GatehouseResult<WorkflowState> {
        (**self).load(thread_id)
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, event: &StepEvent) -> GatehouseResult<()> {
        (**self).emit(event)
    }
}
