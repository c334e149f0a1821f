//! In-memory implementation of `CheckpointStore`.
//!
//! States are stored as serialized JSON; every load deserializes a fresh
//! copy.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use gatehouse_contracts::{
    error::{GatehouseError, GatehouseResult},
    workflow::{ThreadId, WorkflowState},
};
use gatehouse_core::traits::CheckpointStore;

#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    checkpoints: RwLock<HashMap<ThreadId, String>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored checkpoints.
    pub fn len(&self) -> usize {
        self.checkpoints.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All thread ids with a checkpoint, sorted.
    pub fn thread_ids(&self) -> Vec<ThreadId> {
        let mut ids: Vec<ThreadId> = self
            .checkpoints
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn save(&self, thread_id: &ThreadId, state: &WorkflowState) -> GatehouseResult<()> {
        let json = serde_json::to_string(state).map_err(|e| GatehouseError::CheckpointStore {
            reason: format!("cannot serialize state for thread '{thread_id}': {e}"),
        })?;

        let mut checkpoints = self.checkpoints.write().map_err(|_| GatehouseError::CheckpointStore {
            reason: "checkpoint map lock poisoned".to_string(),
        })?;
        checkpoints.insert(thread_id.clone(), json);

        debug!(thread_id = %thread_id, "checkpoint saved in memory");
        Ok(())
    }

    fn load(&self, thread_id: &ThreadId) -> GatehouseResult<WorkflowState> {
        let checkpoints = self.checkpoints.read().map_err(|_| GatehouseError::CheckpointStore {
            reason: "checkpoint map lock poisoned".to_string(),
        })?;

        let json = checkpoints
            .get(thread_id)
            .ok_or_else(|| GatehouseError::CheckpointNotFound {
                thread_id: thread_id.to_string(),
            })?;

        serde_json::from_str(json).map_err(|e| GatehouseError::CheckpointCorrupt {
            thread_id: thread_id.to_string(),
            reason: e.to_string(),
        })
    }
}
