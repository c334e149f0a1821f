//! User-directory reference scenarios.
//!
//! Each scenario wires the real Gatehouse components (engine, registry,
//! argument verifier, checkpoint store) to the mock directory and the keyword
//! proposer, then plays the approver's role.

pub mod chained_update;
pub mod list_users;
pub mod reject_update;

use std::sync::Arc;

use gatehouse_contracts::{
    event::{StepEvent, StepStatus},
    workflow::ThreadId,
};
use gatehouse_core::{
    engine::{EngineConfig, WorkflowEngine},
    executor::ActionExecutor,
    sink::CollectingSink,
    traits::CheckpointStore,
};
use gatehouse_store::InMemoryCheckpointStore;

use crate::{
    mock_data::Directory,
    operations::{directory_registry, directory_verifier},
    proposer::keyword_proposer,
};

/// An engine bound to one mock directory.
pub struct DirectoryRuntime {
    pub engine: WorkflowEngine,
    pub directory: Arc<Directory>,
    pub events: CollectingSink,
}

impl DirectoryRuntime {
    pub fn new(store: Box<dyn CheckpointStore>, config: EngineConfig) -> Self {
        Self::with_directory(Arc::new(Directory::seeded()), store, config)
    }

    pub fn with_directory(directory: Arc<Directory>, store: Box<dyn CheckpointStore>, config: EngineConfig) -> Self {
        let events = CollectingSink::new();
        let executor = ActionExecutor::new(
            directory_registry(Arc::clone(&directory)),
            Box::new(directory_verifier()),
        );
        let engine = WorkflowEngine::new(
            Box::new(keyword_proposer()),
            executor,
            store,
            Box::new(events.clone()),
            config,
        );
        Self {
            engine,
            directory,
            events,
        }
    }

    /// Fresh directory, in-memory checkpoints, default engine settings.
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryCheckpointStore::new()), EngineConfig::default())
    }
}

/// Print a step event the way an approver's console would show it.
pub fn print_event(event: &StepEvent) {
    match event.status {
        StepStatus::AwaitingApproval => {
            println!("  [{}] AWAITING APPROVAL (step: {})", event.thread_id, event.step);
            if let Some(review) = &event.actions_to_review {
                println!("    {}", review.question);
                for action in &review.actions {
                    let params = serde_json::to_string(&action.parameters).unwrap_or_default();
                    println!("    - {} {}", action.tool, params);
                    println!("      {}", action.description);
                }
            }
        }
        StepStatus::InProgress => {
            println!("  [{}] step {} complete", event.thread_id, event.step);
        }
        status => {
            println!("  [{}] {:?}", event.thread_id, status);
            for line in event.response.lines() {
                println!("    | {line}");
            }
        }
    }
}

/// A thread id carrying a scenario prefix, readable in logs.
pub fn scenario_thread(prefix: &str) -> ThreadId {
    ThreadId::from(format!("{prefix}-{}", ThreadId::new()))
}
