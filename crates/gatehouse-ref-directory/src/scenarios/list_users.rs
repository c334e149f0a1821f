//! Scenario 1: List Users (single-shot, approved)
//!
//! "list 2 users" produces one `search_users {size: 2}` proposal. The workflow
//! suspends, the approver says yes, and the final response is the search
//! result prefixed with the operation name.

use gatehouse_contracts::{error::GatehouseResult, event::StepEvent};

use super::{print_event, scenario_thread, DirectoryRuntime};

pub const QUERY: &str = "list 2 users";

/// Run the scenario on `runtime`, returning `(suspension, terminal)` events.
pub fn run(runtime: &DirectoryRuntime) -> GatehouseResult<(StepEvent, StepEvent)> {
    let thread_id = scenario_thread("list-users");

    let suspended = runtime.engine.submit(&thread_id, QUERY, false)?;
    print_event(&suspended);

    println!("  Approver decision: APPROVE");
    let done = runtime.engine.resume(&thread_id, true)?;
    print_event(&done);

    Ok((suspended, done))
}

pub fn run_scenario() -> GatehouseResult<()> {
    println!("=== Scenario 1: List Users (single-shot, approved) ===");
    println!();
    println!("  Query: \"{QUERY}\"");
    println!();

    let runtime = DirectoryRuntime::in_memory();
    let (_, done) = run(&runtime)?;

    println!();
    println!("  Final status:   {:?}", done.status);
    println!("  Events emitted: {}", runtime.events.events().len());
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_contracts::event::StepStatus;

    #[test]
    fn test_list_two_users_approved() {
        let runtime = DirectoryRuntime::in_memory();
        let (suspended, done) = run(&runtime).unwrap();

        assert_eq!(suspended.status, StepStatus::AwaitingApproval);
        let review = suspended.actions_to_review.unwrap();
        assert_eq!(review.actions.len(), 1);
        assert_eq!(review.actions[0].tool, "search_users");
        assert_eq!(review.query, QUERY);

        assert_eq!(done.status, StepStatus::Completed);
        assert!(done.response.starts_with("search_users: User ID: 1226"));
        assert_eq!(done.response.matches("User ID:").count(), 2);
    }
}
