//! Workflow state and the approval review payload.
//!
//! `WorkflowState` is the unit of checkpointed truth for one logical request.
//! Everything the engine needs to continue after a suspension lives here, so
//! a resume can land on a different process than the one that suspended.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::{ActionContext, CandidateAction};

/// External correlation key for one workflow across suspend/resume.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    /// Generate a fresh, random thread id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ThreadId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ThreadId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One action as shown to the approver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewedAction {
    pub tool: String,
    pub parameters: Map<String, Value>,
    /// Human-readable description of the operation, from the registry.
    pub description: String,
}

/// Display-ready projection of the pending actions.
///
/// Re-derivable from `WorkflowState::pending_actions` at any time; it is
/// never read back as the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub question: String,
    pub actions: Vec<ReviewedAction>,
    pub query: String,
}

/// Checkpointed state of one workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The original request. Never modified after creation.
    pub query: String,
    /// Iterate one action per cycle instead of a single batch.
    pub chained: bool,
    /// Actions proposed in the current cycle, not yet executed.
    #[serde(default)]
    pub pending_actions: Vec<CandidateAction>,
    /// Append-only `"name: result"` log, one entry per line.
    #[serde(default)]
    pub tool_response: String,
    /// Set exactly once, on the terminal transition.
    #[serde(default)]
    pub final_response: Option<String>,
    #[serde(default)]
    pub user_approved: bool,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub actions_to_review: Option<ReviewPayload>,
    #[serde(default)]
    pub action_context: ActionContext,
    /// Number of identify cycles run so far.
    #[serde(default)]
    pub iteration_count: u32,
}

impl WorkflowState {
    /// A fresh state with every transient and accumulator field zeroed.
    pub fn new(query: impl Into<String>, chained: bool) -> Self {
        Self {
            query: query.into(),
            chained,
            pending_actions: Vec::new(),
            tool_response: String::new(),
            final_response: None,
            user_approved: false,
            requires_approval: false,
            actions_to_review: None,
            action_context: ActionContext::default(),
            iteration_count: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.final_response.is_some()
    }

    pub fn is_awaiting_approval(&self) -> bool {
        self.requires_approval && self.final_response.is_none()
    }

    /// Record the terminal response. Later calls are ignored so the first
    /// terminal outcome always wins.
    pub fn finish(&mut self, response: impl Into<String>) {
        if self.final_response.is_none() {
            self.final_response = Some(response.into());
        }
        self.requires_approval = false;
        self.actions_to_review = None;
    }

    /// Append one `"name: result"` entry to the tool response log.
    pub fn append_tool_response(&mut self, name: &str, result: &str) {
        if !self.tool_response.is_empty() {
            self.tool_response.push('\n');
        }
        self.tool_response.push_str(&format!("{name}: {result}"));
    }

    /// The accumulated tool response, or `fallback` when nothing ran.
    pub fn accumulated_or(&self, fallback: &str) -> String {
        if self.tool_response.is_empty() {
            fallback.to_string()
        } else {
            self.tool_response.clone()
        }
    }

    /// Clear the approval handshake flags after a decision was consumed.
    pub fn clear_approval(&mut self) {
        self.user_approved = false;
        self.requires_approval = false;
        self.actions_to_review = None;
    }
}
