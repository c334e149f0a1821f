//! # gatehouse-ref-directory
//!
//! User-directory reference runtime for the Gatehouse approval-gated workflow
//! engine.
//!
//! Wires five directory operations (search, lookup, update, role queries) to
//! the engine behind a deterministic keyword proposer and plays three
//! scenarios:
//!
//! 1. **List Users**: single-shot read, approved.
//! 2. **Rejected Update**: chained retitle where the approver blocks the write.
//! 3. **Chained Update**: search, then update the found user, then stop.
//!
//! All data is hardcoded and fictional. No external API calls are made.

pub mod mock_data;
pub mod operations;
pub mod proposer;
pub mod scenarios;

pub use mock_data::Directory;
pub use operations::{directory_registry, directory_verifier};
pub use proposer::keyword_proposer;
pub use scenarios::DirectoryRuntime;
