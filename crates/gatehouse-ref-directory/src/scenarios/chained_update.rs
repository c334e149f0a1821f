//! Scenario 3: Chained Update (approved)
//!
//! "find Jane Doe and set their job title to Lead Technician" runs in
//! chained mode:
//!
//! 1. `search_users {search: "Jane Doe", size: 1}` is proposed and approved.
//! 2. The proposer reads the search result and proposes
//!    `update_user {user_id: 1201, job_title: "Lead Technician"}`. Approved.
//! 3. The proposer has nothing further to do; the final response holds both
//!    tool results in execution order.

use gatehouse_contracts::{error::GatehouseResult, event::StepEvent, workflow::ThreadId};

use super::{print_event, scenario_thread, DirectoryRuntime};

pub const QUERY: &str = "find Jane Doe and set their job title to Lead Technician";
pub const TARGET_USER: u64 = 1201;
pub const NEW_TITLE: &str = "Lead Technician";

/// Approve every suspension until the workflow terminates.
pub fn approve_all(runtime: &DirectoryRuntime, thread_id: &ThreadId, first: StepEvent) -> GatehouseResult<StepEvent> {
    let mut event = first;
    let mut cycle = 1;
    while event.requires_approval {
        println!("  Approver decision (cycle {cycle}): APPROVE");
        event = runtime.engine.resume(thread_id, true)?;
        print_event(&event);
        cycle += 1;
    }
    Ok(event)
}

/// Run the scenario on `runtime` and return the terminal event.
pub fn run(runtime: &DirectoryRuntime) -> GatehouseResult<StepEvent> {
    let thread_id = scenario_thread("chained-update");

    let first = runtime.engine.submit(&thread_id, QUERY, true)?;
    print_event(&first);

    approve_all(runtime, &thread_id, first)
}

pub fn run_scenario() -> GatehouseResult<()> {
    println!("=== Scenario 3: Chained Update (approved) ===");
    println!();
    println!("  Query: \"{QUERY}\"");
    println!();

    let runtime = DirectoryRuntime::in_memory();
    let done = run(&runtime)?;

    let title = runtime
        .directory
        .user_by_id(TARGET_USER)?
        .map(|u| u.job_title)
        .unwrap_or_default();

    println!();
    println!("  Final status:   {:?}", done.status);
    println!("  Job title now:  {title}");
    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(())
}
