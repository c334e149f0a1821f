//! Error types for the Gatehouse workflow engine.
//!
//! All fallible operations return `GatehouseResult<T>`. Workflow-level
//! failures (a bad proposal, an unknown or failing operation) are turned into
//! terminal sentinel responses by the engine; only infrastructure faults
//! cross the engine boundary as `Err`.

use thiserror::Error;

/// The unified error type for Gatehouse.
#[derive(Debug, Error)]
pub enum GatehouseError {
    /// The proposer failed or produced output that is not a valid action list.
    #[error("action proposal failed: {reason}")]
    ProposalFailed { reason: String },

    /// No operation is registered under the requested name.
    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    /// The arguments did not pass the operation's argument schema.
    #[error("invalid arguments for '{name}': {reason}")]
    InvalidArguments { name: String, reason: String },

    /// The side-effecting operation itself reported an error.
    #[error("operation '{name}' failed: {reason}")]
    OperationFailed { name: String, reason: String },

    /// No checkpoint exists for the thread id.
    #[error("no checkpoint found for thread '{thread_id}'")]
    CheckpointNotFound { thread_id: String },

    /// A checkpoint could not be read or written.
    #[error("checkpoint store error: {reason}")]
    CheckpointStore { reason: String },

    /// A stored checkpoint failed its integrity check or could not be decoded.
    #[error("checkpoint for thread '{thread_id}' is corrupt: {reason}")]
    CheckpointCorrupt { thread_id: String, reason: String },

    /// Another caller is already resuming this thread.
    #[error("thread '{thread_id}' is already being resumed")]
    ResumeConflict { thread_id: String },

    /// A decision arrived for a workflow that is not suspended at the gate.
    #[error("thread '{thread_id}' is not awaiting approval")]
    NotAwaitingApproval { thread_id: String },

    /// The workflow reached a state the transition function cannot handle.
    #[error("state machine error: {reason}")]
    StateMachineError { reason: String },

    /// The transport adapter rejected a step event.
    #[error("event delivery failed: {reason}")]
    EventDelivery { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the Gatehouse crates.
pub type GatehouseResult<T> = Result<T, GatehouseError>;
