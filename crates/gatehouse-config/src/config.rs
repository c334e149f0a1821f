//! Loading and applying Gatehouse configuration.
//!
//! `GatehouseConfig` is parsed from a TOML string or file, validated, and
//! then turned into the pieces a host needs to construct a `WorkflowEngine`:
//! an `EngineConfig` and a boxed `CheckpointStore`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use gatehouse_contracts::error::{GatehouseError, GatehouseResult};
use gatehouse_core::{engine::EngineConfig, traits::CheckpointStore};
use gatehouse_store::{FileCheckpointStore, InMemoryCheckpointStore};

use crate::schema::{EngineSection, StoreBackend, StoreSection};

/// Top-level configuration document.
///
/// ```rust,ignore
/// use gatehouse_config::GatehouseConfig;
///
/// let config = GatehouseConfig::from_file(Path::new("gatehouse.toml"))?;
/// let store = config.build_store()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatehouseConfig {
    pub engine: EngineSection,
    pub store: StoreSection,
}

impl GatehouseConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `GatehouseError::ConfigError` if the TOML is malformed, has
    /// unknown keys, or fails validation.
    pub fn from_toml_str(s: &str) -> GatehouseResult<Self> {
        let config: GatehouseConfig = toml::from_str(s).map_err(|e| GatehouseError::ConfigError {
            reason: format!("failed to parse configuration TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> GatehouseResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GatehouseError::ConfigError {
            reason: format!("failed to read configuration file '{}': {}", path.display(), e),
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), backend = ?config.store.backend, "configuration loaded");
        Ok(config)
    }

    /// `from_file` when `path` exists, defaults otherwise.
    pub fn from_file_or_default(path: &Path) -> GatehouseResult<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> GatehouseResult<()> {
        if self.engine.max_chain_iterations == 0 {
            return Err(GatehouseError::ConfigError {
                reason: "engine.max_chain_iterations must be at least 1".to_string(),
            });
        }
        if self.engine.approval_question.trim().is_empty() {
            return Err(GatehouseError::ConfigError {
                reason: "engine.approval_question must not be empty".to_string(),
            });
        }
        if self.store.backend == StoreBackend::File && self.store.directory.as_os_str().is_empty() {
            return Err(GatehouseError::ConfigError {
                reason: "store.directory is required for the file backend".to_string(),
            });
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_chain_iterations: self.engine.max_chain_iterations,
            approval_question: self.engine.approval_question.clone(),
        }
    }

    /// Construct the configured checkpoint store.
    pub fn build_store(&self) -> GatehouseResult<Box<dyn CheckpointStore>> {
        match self.store.backend {
            StoreBackend::Memory => {
                debug!("using in-memory checkpoint store");
                Ok(Box::new(InMemoryCheckpointStore::new()))
            }
            StoreBackend::File => {
                debug!(directory = %self.store.directory.display(), "using file checkpoint store");
                Ok(Box::new(FileCheckpointStore::new(&self.store.directory)?))
            }
        }
    }
}
