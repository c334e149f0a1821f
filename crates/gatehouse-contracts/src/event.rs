//! Step events delivered to the transport adapter.
//!
//! The engine emits one `StepEvent` per state-function it runs. The last
//! event of an engine entry is either a suspension (`requires_approval`) or
//! a terminal event carrying the final response.

use serde::{Deserialize, Serialize};

use crate::workflow::{ReviewPayload, ThreadId, WorkflowState};

/// Coarse classification of a step event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// An intermediate step ran; more steps follow in this entry.
    InProgress,
    /// Execution is suspended until an approval decision arrives.
    AwaitingApproval,
    /// Terminal: the workflow produced its final response normally.
    Completed,
    /// Terminal: the approver rejected the proposed actions.
    Cancelled,
    /// Terminal: proposal or execution failed.
    Failed,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// What the transport adapter receives after each step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEvent {
    pub thread_id: ThreadId,
    /// Name of the state-function that produced this event.
    pub step: String,
    pub status: StepStatus,
    /// The final response on terminal events, the accumulated tool response
    /// otherwise.
    pub response: String,
    pub requires_approval: bool,
    pub actions_to_review: Option<ReviewPayload>,
}

impl StepEvent {
    /// Project a workflow state into an event.
    pub fn from_state(
        thread_id: &ThreadId,
        step: impl Into<String>,
        status: StepStatus,
        state: &WorkflowState,
    ) -> Self {
        let response = state
            .final_response
            .clone()
            .unwrap_or_else(|| state.tool_response.clone());
        Self {
            thread_id: thread_id.clone(),
            step: step.into(),
            status,
            response,
            requires_approval: state.requires_approval,
            actions_to_review: state.actions_to_review.clone(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
