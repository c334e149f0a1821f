//! Simple `EventSink` implementations.

use std::sync::{Arc, Mutex};

use gatehouse_contracts::{
    error::{GatehouseError, GatehouseResult},
    event::StepEvent,
};

use crate::traits::EventSink;

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &StepEvent) -> GatehouseResult<()> {
        Ok(())
    }
}

/// Keeps every event in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<StepEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events received so far, in order.
    pub fn events(&self) -> Vec<StepEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// The most recent event, if any.
    pub fn last(&self) -> Option<StepEvent> {
        self.events
            .lock()
            .ok()
            .and_then(|events| events.last().cloned())
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &StepEvent) -> GatehouseResult<()> {
        let mut events = self.events.lock().map_err(|e| GatehouseError::EventDelivery {
            reason: format!("event buffer poisoned: {e}"),
        })?;
        events.push(event.clone());
        Ok(())
    }
}
