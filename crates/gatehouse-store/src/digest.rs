//! Checkpoint digests.
//!
//! A checkpoint digest is the SHA-256 of:
//!   1. thread id bytes (UTF-8)
//!   2. revision as little-endian u64
//!   3. canonical JSON of the state (serde_json, no pretty-printing)
//!
//! `serde_json::Value` objects keep their keys sorted, so serializing the
//! state as a `Value` gives the same bytes on save and on load.

use sha2::{Digest, Sha256};

use serde_json::Value;

use gatehouse_contracts::{
    error::{GatehouseError, GatehouseResult},
    workflow::ThreadId,
};

/// Compute the digest committing a checkpoint to its thread and revision.
pub fn checkpoint_digest(thread_id: &ThreadId, revision: u64, state: &Value) -> GatehouseResult<String> {
    let state_json = serde_json::to_vec(state).map_err(|e| GatehouseError::CheckpointStore {
        reason: format!("cannot serialize state for thread '{thread_id}': {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(thread_id.as_str().as_bytes());
    hasher.update(revision.to_le_bytes());
    hasher.update(&state_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Check a stored digest against a freshly computed one.
pub fn verify_digest(thread_id: &ThreadId, revision: u64, state: &Value, expected: &str) -> GatehouseResult<()> {
    let actual = checkpoint_digest(thread_id, revision, state)?;
    if actual != expected {
        return Err(GatehouseError::CheckpointCorrupt {
            thread_id: thread_id.to_string(),
            reason: format!("digest mismatch at revision {revision}: stored {expected}, computed {actual}"),
        });
    }
    Ok(())
}
