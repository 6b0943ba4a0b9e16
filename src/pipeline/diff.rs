//! Change detection against the known-event set.
//!
//! Splits a freshly extracted batch into events seen before and events new
//! in this cycle. New events are inserted one at a time, so an insert that
//! loses a race against another cycle is simply counted as known.

use serde::Serialize;

use crate::error::Result;
use crate::models::Event;
use crate::storage::{EventStore, InsertOutcome};

/// Partition of one extracted batch.
#[derive(Debug, Clone, Serialize, Default)]
pub struct DiffResult {
    /// Events not known before this cycle, in extraction order
    pub added: Vec<Event>,
    /// Ids that were already known
    pub known: Vec<u64>,
}

impl DiffResult {
    /// Check if there are any new events.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Partition `current` into new and known events, persisting the new ones.
///
/// Persistence happens before this returns; a later notification failure
/// does not undo it.
pub async fn detect_changes(store: &dyn EventStore, current: &[Event]) -> Result<DiffResult> {
    let mut result = DiffResult::default();

    for event in current {
        if store.contains(event.id).await? {
            result.known.push(event.id);
            continue;
        }

        let outcome = match store.insert(event).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if result.has_changes() {
                    let ids: Vec<u64> = result.added.iter().map(|added| added.id).collect();
                    log::warn!(
                        "Insert of event {} failed; {:?} are stored but will not be notified",
                        event.id,
                        ids
                    );
                }
                return Err(e);
            }
        };

        match outcome {
            InsertOutcome::Inserted => result.added.push(event.clone()),
            InsertOutcome::AlreadyPresent => {
                log::debug!("Event {} was inserted concurrently, treating as known", event.id);
                result.known.push(event.id);
            }
        }
    }

    if result.has_changes() {
        log::info!(
            "Diff: {} new, {} already known",
            result.added.len(),
            result.known.len()
        );
    }

    Ok(result)
}
