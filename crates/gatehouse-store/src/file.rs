//! File-backed implementation of `CheckpointStore`.
//!
//! Each thread id gets one JSON envelope in the store directory:
//!
//! ```json
//! { "thread_id": "..", "revision": 3, "saved_at": "..", "digest": "..", "state": { .. } }
//! ```
//!
//! Writes go to a uniquely named temporary file in the same directory which
//! is then renamed over the old envelope, so a reader sees either the
//! previous checkpoint or the new one. Separate processes pointing at the
//! same directory share workflows: one can suspend and another resume.
//!
//! An engine entry claims its thread with a `<stem>.lock` file created
//! exclusively. A second claimant, in this process or another, gets
//! `ResumeConflict` until the file is removed. A lock file older than the
//! stale threshold is assumed to belong to a crashed process and is
//! replaced.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use gatehouse_contracts::{
    error::{GatehouseError, GatehouseResult},
    workflow::{ThreadId, WorkflowState},
};
use gatehouse_core::traits::{CheckpointStore, ThreadClaim};

use crate::digest::{checkpoint_digest, verify_digest};

/// The on-disk form of one checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointEnvelope {
    pub thread_id: ThreadId,
    /// Starts at 1 and increments on every save.
    pub revision: u64,
    pub saved_at: DateTime<Utc>,
    /// Hex SHA-256 over thread id, revision, and canonical state JSON.
    pub digest: String,
    pub state: Value,
}

#[derive(Deserialize)]
struct RevisionOnly {
    revision: u64,
}

/// Map a thread id onto a file stem.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes
/// `%XX`. The mapping is injective and never yields `.` or `/`.
pub fn file_stem(thread_id: &ThreadId) -> String {
    let mut stem = String::with_capacity(thread_id.as_str().len());
    for byte in thread_id.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    if stem.is_empty() {
        stem.push('%');
    }
    stem
}

/// Age after which a leftover lock file no longer blocks a claim.
pub const DEFAULT_STALE_CLAIM_AFTER: Duration = Duration::from_secs(600);

/// A held thread claim. Dropping it removes the lock file.
#[derive(Debug)]
struct FileClaim {
    path: PathBuf,
    _file: fs::File,
}

impl Drop for FileClaim {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "could not release thread claim");
        }
    }
}

pub struct FileCheckpointStore {
    directory: PathBuf,
    stale_claim_after: Duration,
}

impl FileCheckpointStore {
    /// Open (creating if needed) a store rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> GatehouseResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| GatehouseError::CheckpointStore {
            reason: format!("cannot create checkpoint directory {}: {e}", directory.display()),
        })?;
        Ok(Self {
            directory,
            stale_claim_after: DEFAULT_STALE_CLAIM_AFTER,
        })
    }

    /// Override how old a lock file must be before it is treated as stale.
    pub fn with_stale_claim_after(mut self, age: Duration) -> Self {
        self.stale_claim_after = age;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, thread_id: &ThreadId) -> PathBuf {
        self.directory.join(format!("{}.json", file_stem(thread_id)))
    }

    pub fn lock_path_for(&self, thread_id: &ThreadId) -> PathBuf {
        self.directory.join(format!("{}.lock", file_stem(thread_id)))
    }

    /// True if a claim on `thread_id` is currently held.
    pub fn is_claimed(&self, thread_id: &ThreadId) -> bool {
        self.lock_path_for(thread_id).exists()
    }

    /// Read and validate the envelope for `thread_id`.
    pub fn load_envelope(&self, thread_id: &ThreadId) -> GatehouseResult<CheckpointEnvelope> {
        let path = self.path_for(thread_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GatehouseError::CheckpointNotFound {
                    thread_id: thread_id.to_string(),
                })
            }
            Err(e) => {
                return Err(GatehouseError::CheckpointStore {
                    reason: format!("cannot read {}: {e}", path.display()),
                })
            }
        };

        let envelope: CheckpointEnvelope =
            serde_json::from_slice(&bytes).map_err(|e| GatehouseError::CheckpointCorrupt {
                thread_id: thread_id.to_string(),
                reason: format!("unreadable envelope: {e}"),
            })?;

        if envelope.thread_id != *thread_id {
            return Err(GatehouseError::CheckpointCorrupt {
                thread_id: thread_id.to_string(),
                reason: format!("envelope belongs to thread '{}'", envelope.thread_id),
            });
        }

        verify_digest(thread_id, envelope.revision, &envelope.state, &envelope.digest)?;
        Ok(envelope)
    }

    /// Remove a checkpoint. Returns `false` if there was none.
    pub fn remove(&self, thread_id: &ThreadId) -> GatehouseResult<bool> {
        let path = self.path_for(thread_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(GatehouseError::CheckpointStore {
                reason: format!("cannot remove {}: {e}", path.display()),
            }),
        }
    }

    fn next_revision(&self, path: &Path) -> u64 {
        let Ok(bytes) = fs::read(path) else {
            return 1;
        };
        match serde_json::from_slice::<RevisionOnly>(&bytes) {
            Ok(previous) => previous.revision + 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "overwriting unreadable checkpoint");
                1
            }
        }
    }

    fn write_atomically(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.directory)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn claim_is_stale(&self, lock_path: &Path) -> bool {
        fs::metadata(lock_path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age > self.stale_claim_after)
    }

    fn try_claim(&self, thread_id: &ThreadId) -> GatehouseResult<FileClaim> {
        let path = self.lock_path_for(thread_id);
        let mut stale_removed = false;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // Owner pid, for an operator inspecting a stuck claim.
                    if let Err(e) = writeln!(file, "{}", std::process::id()) {
                        debug!(path = %path.display(), error = %e, "could not record claim owner");
                    }
                    debug!(thread_id = %thread_id, path = %path.display(), "thread claimed");
                    return Ok(FileClaim { path, _file: file });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if !stale_removed && self.claim_is_stale(&path) {
                        warn!(thread_id = %thread_id, path = %path.display(), "removing stale thread claim");
                        // Lost races surface on the retry.
                        let _ = fs::remove_file(&path);
                        stale_removed = true;
                        continue;
                    }
                    return Err(GatehouseError::ResumeConflict {
                        thread_id: thread_id.to_string(),
                    });
                }
                Err(e) => {
                    return Err(GatehouseError::CheckpointStore {
                        reason: format!("cannot create lock file {}: {e}", path.display()),
                    })
                }
            }
        }
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn claim(&self, thread_id: &ThreadId) -> GatehouseResult<Option<ThreadClaim>> {
        let claim: ThreadClaim = Box::new(self.try_claim(thread_id)?);
        Ok(Some(claim))
    }

    fn save(&self, thread_id: &ThreadId, state: &WorkflowState) -> GatehouseResult<()> {
        let path = self.path_for(thread_id);
        let revision = self.next_revision(&path);

        let state = serde_json::to_value(state).map_err(|e| GatehouseError::CheckpointStore {
            reason: format!("cannot serialize state for thread '{thread_id}': {e}"),
        })?;
        let digest = checkpoint_digest(thread_id, revision, &state)?;

        let envelope = CheckpointEnvelope {
            thread_id: thread_id.clone(),
            revision,
            saved_at: Utc::now(),
            digest,
            state,
        };
        let bytes = serde_json::to_vec_pretty(&envelope).map_err(|e| GatehouseError::CheckpointStore {
            reason: format!("cannot serialize envelope for thread '{thread_id}': {e}"),
        })?;

        self.write_atomically(&path, &bytes)
            .map_err(|e| GatehouseError::CheckpointStore {
                reason: format!("cannot write {}: {e}", path.display()),
            })?;

        debug!(thread_id = %thread_id, revision, path = %path.display(), "checkpoint saved");
        Ok(())
    }

    fn load(&self, thread_id: &ThreadId) -> GatehouseResult<WorkflowState> {
        let envelope = self.load_envelope(thread_id)?;
        serde_json::from_value(envelope.state).map_err(|e| GatehouseError::CheckpointCorrupt {
            thread_id: thread_id.to_string(),
            reason: format!("state does not match the workflow schema: {e}"),
        })
    }
}
