//! Fixed terminal responses.
//!
//! Callers pattern-match on these strings to tell terminal outcome classes
//! apart. They are a stable contract: change them and every caller breaks.

use crate::event::StepStatus;

/// The proposer found nothing to do, or a chained run ended with nothing
/// accumulated.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found for the request.";

/// Every proposed action had already been executed in this workflow.
pub const ALREADY_COMPLETED: &str = "The requested actions have already been completed.";

/// The approver rejected the proposed actions.
pub const CANCELLED_BY_USER: &str = "Task execution cancelled by user.";

/// An approved action could not be resolved, validated, or executed.
pub const EXECUTION_FAILED: &str = "Task execution failed.";

/// The proposer errored or returned output that could not be parsed.
pub const PROPOSAL_FAILED: &str = "Unable to determine the actions for the request.";

/// Map a terminal response to its status class.
pub fn status_for(response: &str) -> StepStatus {
    match response {
        CANCELLED_BY_USER => StepStatus::Cancelled,
        EXECUTION_FAILED | PROPOSAL_FAILED => StepStatus::Failed,
        _ => StepStatus::Completed,
    }
}
