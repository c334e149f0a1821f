//! The approval gate: suspension and decision handling.
//!
//! Requesting approval does not block. It marks the state as suspended and
//! produces the review payload; the engine then checkpoints and returns. The
//! decision arrives later as a separate call carrying the thread id.

use serde::{Deserialize, Serialize};
use tracing::info;

use gatehouse_contracts::{
    error::{GatehouseError, GatehouseResult},
    workflow::{ReviewPayload, ReviewedAction, ThreadId, WorkflowState},
};

use crate::registry::OperationRegistry;

/// Default question shown above the proposed actions.
pub const DEFAULT_APPROVAL_QUESTION: &str = "Do you approve the following actions?";

/// An approver's answer, as delivered back by the transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub thread_id: ThreadId,
    pub approve: bool,
}

#[derive(Debug, Clone)]
pub struct ApprovalGate {
    question: String,
}

impl ApprovalGate {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }

    /// Project the pending actions into a display payload.
    pub fn review_payload(&self, state: &WorkflowState, registry: &OperationRegistry) -> ReviewPayload {
        let actions = state
            .pending_actions
            .iter()
            .map(|action| ReviewedAction {
                tool: action.name.clone(),
                parameters: action.arguments.clone(),
                description: registry.describe(&action.name),
            })
            .collect();

        ReviewPayload {
            question: self.question.clone(),
            actions,
            query: state.query.clone(),
        }
    }

    /// Mark `state` as suspended at the gate and return the payload to show.
    pub fn request_approval(&self, state: &mut WorkflowState, registry: &OperationRegistry) -> ReviewPayload {
        let payload = self.review_payload(state, registry);
        state.user_approved = false;
        state.requires_approval = true;
        state.actions_to_review = Some(payload.clone());
        payload
    }

    /// Consume a decision for a suspended workflow.
    ///
    /// Fails with `NotAwaitingApproval` unless `state` is suspended at the
    /// gate. On success the handshake flags are resolved and the review
    /// payload is cleared.
    pub fn apply_decision(
        &self,
        thread_id: &ThreadId,
        state: &mut WorkflowState,
        approve: bool,
    ) -> GatehouseResult<()> {
        if !state.is_awaiting_approval() {
            return Err(GatehouseError::NotAwaitingApproval {
                thread_id: thread_id.to_string(),
            });
        }

        info!(
            thread_id = %thread_id,
            approve,
            actions = state.pending_actions.len(),
            "approval decision received"
        );

        state.user_approved = approve;
        state.requires_approval = false;
        state.actions_to_review = None;
        Ok(())
    }
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new(DEFAULT_APPROVAL_QUESTION)
    }
}
