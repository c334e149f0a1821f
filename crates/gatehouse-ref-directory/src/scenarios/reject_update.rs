//! Scenario 2: Rejected Update
//!
//! Two sub-cases, both ending with the cancellation response and the
//! directory unchanged:
//!
//! A. Single-shot: "set the job title of user 1201 to ..." proposes one
//!    `update_user` call, which the approver rejects.
//! B. Chained: the approver lets the read-only search run, then rejects the
//!    `update_user` proposal built from its result.

use gatehouse_contracts::{error::GatehouseResult, event::StepEvent};

use super::{print_event, scenario_thread, DirectoryRuntime};

pub const SINGLE_SHOT_QUERY: &str = "set the job title of user 1201 to Lead Technician";
pub const CHAINED_QUERY: &str = "find Jane Doe and set their job title to Lead Technician";
pub const TARGET_USER: u64 = 1201;

/// Sub-case A: reject the only proposal. Returns the terminal event.
pub fn run_single_shot(runtime: &DirectoryRuntime) -> GatehouseResult<StepEvent> {
    let thread_id = scenario_thread("reject-single");

    let update = runtime.engine.submit(&thread_id, SINGLE_SHOT_QUERY, false)?;
    print_event(&update);

    println!("  Approver decision: REJECT");
    let done = runtime.engine.resume(&thread_id, false)?;
    print_event(&done);

    Ok(done)
}

/// Sub-case B: approve the search, reject the write. Returns the terminal event.
pub fn run_chained(runtime: &DirectoryRuntime) -> GatehouseResult<StepEvent> {
    let thread_id = scenario_thread("reject-chained");

    let search = runtime.engine.submit(&thread_id, CHAINED_QUERY, true)?;
    print_event(&search);

    println!("  Approver decision: APPROVE (read-only search)");
    let update = runtime.engine.resume(&thread_id, true)?;
    print_event(&update);

    println!("  Approver decision: REJECT (write)");
    let done = runtime.engine.resume(&thread_id, false)?;
    print_event(&done);

    Ok(done)
}

fn current_title(runtime: &DirectoryRuntime) -> GatehouseResult<String> {
    Ok(runtime
        .directory
        .user_by_id(TARGET_USER)?
        .map(|u| u.job_title)
        .unwrap_or_default())
}

pub fn run_scenario() -> GatehouseResult<()> {
    println!("=== Scenario 2: Rejected Update ===");
    println!();

    let runtime = DirectoryRuntime::in_memory();

    println!("  -- Sub-case A: single-shot --");
    println!("  Query: \"{SINGLE_SHOT_QUERY}\"");
    let single = run_single_shot(&runtime)?;
    println!("  Final status:   {:?}", single.status);
    println!("  Job title now:  {}", current_title(&runtime)?);
    println!();

    println!("  -- Sub-case B: chained --");
    println!("  Query: \"{CHAINED_QUERY}\"");
    let chained = run_chained(&runtime)?;
    println!("  Final status:   {:?}", chained.status);
    println!("  Job title now:  {}", current_title(&runtime)?);
    println!();

    println!("  Scenario 2 complete.");
    println!();

    Ok(())
}
