//! Gatehouse User-Directory Reference Runtime: Demo CLI
//!
//! Runs the three directory scenarios, or drives a single workflow step by
//! step against the on-disk checkpoint store so a suspension in one process
//! can be resumed by the next.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- list-users
//!   cargo run -p demo -- reject
//!   cargo run -p demo -- chained
//!   cargo run -p demo -- submit --thread t1 --chained --query "find Jane Doe and set their job title to Lead Technician"
//!   cargo run -p demo -- resume --thread t1 --approve
//!   cargo run -p demo -- show --thread t1
//!
//! The mock directory is re-seeded in every process; only the workflow
//! checkpoints persist between invocations.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gatehouse_config::GatehouseConfig;
use gatehouse_contracts::{error::GatehouseResult, workflow::ThreadId};
use gatehouse_ref_directory::scenarios::{
    chained_update, list_users, print_event, reject_update, DirectoryRuntime,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Gatehouse: approval-gated action workflows over a user directory.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Gatehouse user-directory reference runtime demo",
    long_about = "Runs Gatehouse demo scenarios showing action proposal, human approval,\n\
                  checkpointed suspension and resumption, and chained execution."
)]
struct Cli {
    /// Configuration file. Defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "gatehouse.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three directory scenarios in sequence.
    RunAll,
    /// Scenario 1: List Users (single-shot, approved).
    ListUsers,
    /// Scenario 2: Rejected Update (single-shot and chained).
    Reject,
    /// Scenario 3: Chained Update (search, then update).
    Chained,
    /// Start (or re-enter) a workflow and stop at the first suspension.
    Submit {
        #[arg(long)]
        thread: String,
        /// Run in chained mode: one action per approval cycle.
        #[arg(long)]
        chained: bool,
        #[arg(long)]
        query: String,
    },
    /// Deliver an approval decision to a suspended workflow.
    Resume {
        #[arg(long)]
        thread: String,
        #[arg(long, conflicts_with = "reject", required_unless_present = "reject")]
        approve: bool,
        #[arg(long)]
        reject: bool,
    },
    /// Re-enter a workflow from its checkpoint without a decision.
    Recover {
        #[arg(long)]
        thread: String,
    },
    /// Print the checkpointed state of a workflow.
    Show {
        #[arg(long)]
        thread: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::ListUsers => list_users::run_scenario(),
        Command::Reject => reject_update::run_scenario(),
        Command::Chained => chained_update::run_scenario(),
        Command::Submit {
            thread,
            chained,
            query,
        } => run_submit(&cli.config, &thread, &query, chained),
        Command::Resume { thread, approve, .. } => run_resume(&cli.config, &thread, approve),
        Command::Recover { thread } => run_recover(&cli.config, &thread),
        Command::Show { thread } => run_show(&cli.config, &thread),
    };

    match result {
        Ok(()) => {
            println!("Done.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> GatehouseResult<()> {
    list_users::run_scenario()?;
    reject_update::run_scenario()?;
    chained_update::run_scenario()?;
    Ok(())
}

// ── Step-by-step workflow commands ────────────────────────────────────────────

fn persistent_runtime(config_path: &Path) -> GatehouseResult<DirectoryRuntime> {
    let config = GatehouseConfig::from_file_or_default(config_path)?;
    info!(
        backend = ?config.store.backend,
        directory = %config.store.directory.display(),
        "loaded configuration"
    );
    let store = config.build_store()?;
    Ok(DirectoryRuntime::new(store, config.engine_config()))
}

fn run_submit(config_path: &Path, thread: &str, query: &str, chained: bool) -> GatehouseResult<()> {
    let runtime = persistent_runtime(config_path)?;
    let event = runtime.engine.submit(&ThreadId::from(thread), query, chained)?;
    print_event(&event);
    Ok(())
}

fn run_resume(config_path: &Path, thread: &str, approve: bool) -> GatehouseResult<()> {
    let runtime = persistent_runtime(config_path)?;
    let event = runtime.engine.resume(&ThreadId::from(thread), approve)?;
    print_event(&event);
    Ok(())
}

fn run_recover(config_path: &Path, thread: &str) -> GatehouseResult<()> {
    let runtime = persistent_runtime(config_path)?;
    let event = runtime.engine.recover(&ThreadId::from(thread))?;
    print_event(&event);
    Ok(())
}

fn run_show(config_path: &Path, thread: &str) -> GatehouseResult<()> {
    let runtime = persistent_runtime(config_path)?;
    let state = runtime.engine.state(&ThreadId::from(thread))?;
    let rendered = serde_json::to_string_pretty(&state).unwrap_or_else(|e| format!("<unprintable state: {e}>"));
    println!("{rendered}");
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Gatehouse: Approval-gated Action Workflows");
    println!("User-Directory Reference Demo");
    println!("==========================================");
    println!();
    println!("Gatehouse pipeline per request:");
    println!("  [1] Proposer turns the query into candidate actions (or none)");
    println!("  [2] Workflow checkpoints and suspends for human approval");
    println!("  [3] Approved actions are argument-verified, then executed");
    println!("  [4] Every executed action is recorded; duplicates never run twice");
    println!("  [5] Chained mode repeats [1]-[4] with prior results, up to a bound");
    println!();
}
