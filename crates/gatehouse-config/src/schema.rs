//! Configuration schema.
//!
//! Every key has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! [engine]
//! max_chain_iterations = 5
//! approval_question = "Do you approve the following actions?"
//!
//! [store]
//! backend = "file"          # or "memory"
//! directory = ".gatehouse/checkpoints"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use gatehouse_core::{engine::DEFAULT_MAX_CHAIN_ITERATIONS, gate::DEFAULT_APPROVAL_QUESTION};

/// Default directory for the file checkpoint store.
pub const DEFAULT_CHECKPOINT_DIR: &str = ".gatehouse/checkpoints";

/// The `[engine]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    /// Chained cycles allowed before the workflow is cut off. Must be at least 1.
    pub max_chain_iterations: u32,

    /// Question shown above the proposed actions.
    pub approval_question: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            max_chain_iterations: DEFAULT_MAX_CHAIN_ITERATIONS,
            approval_question: DEFAULT_APPROVAL_QUESTION.to_string(),
        }
    }
}

/// Which checkpoint store to build.
///
/// ```toml
/// backend = "memory"
/// backend = "file"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
}

/// The `[store]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub backend: StoreBackend,

    /// Checkpoint directory for the `file` backend. Ignored by `memory`.
    pub directory: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            directory: PathBuf::from(DEFAULT_CHECKPOINT_DIR),
        }
    }
}
