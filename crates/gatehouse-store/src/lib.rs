//! # gatehouse-store
//!
//! Checkpoint stores for the Gatehouse workflow engine.
//!
//! - `InMemoryCheckpointStore`: process-local, for tests and single-process hosts
//! - `FileCheckpointStore`: one digest-protected JSON envelope per thread id
//!
//! Both implement `gatehouse_core::traits::CheckpointStore`.

pub mod digest;
pub mod file;
pub mod memory;

pub use digest::checkpoint_digest;
pub use file::{CheckpointEnvelope, FileCheckpointStore, DEFAULT_STALE_CLAIM_AFTER};
pub use memory::InMemoryCheckpointStore;
