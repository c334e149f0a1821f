//! Per-thread exclusion for engine entries.
//!
//! Two concurrent entries for the same thread id would both see an action
//! as "not yet executed" and both run it. The second caller is rejected with
//! `ResumeConflict` rather than queued.

use std::collections::HashSet;
use std::sync::Mutex;

use gatehouse_contracts::{
    error::{GatehouseError, GatehouseResult},
    workflow::ThreadId,
};

#[derive(Debug, Default)]
pub struct ThreadLocks {
    active: Mutex<HashSet<ThreadId>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `thread_id` until the returned guard is dropped.
    pub fn acquire(&self, thread_id: &ThreadId) -> GatehouseResult<ThreadGuard<'_>> {
        let mut active = self.active.lock().map_err(|e| GatehouseError::StateMachineError {
            reason: format!("thread lock table poisoned: {e}"),
        })?;

        if !active.insert(thread_id.clone()) {
            return Err(GatehouseError::ResumeConflict {
                thread_id: thread_id.to_string(),
            });
        }

        Ok(ThreadGuard {
            locks: self,
            thread_id: thread_id.clone(),
        })
    }

    pub fn is_held(&self, thread_id: &ThreadId) -> bool {
        self.active
            .lock()
            .map(|active| active.contains(thread_id))
            .unwrap_or(false)
    }
}

/// Releases the thread id on drop.
#[derive(Debug)]
pub struct ThreadGuard<'a> {
    locks: &'a ThreadLocks,
    thread_id: ThreadId,
}

impl Drop for ThreadGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut active) = self.locks.active.lock() {
            active.remove(&self.thread_id);
        }
    }
}
