//! In-memory event store for tests and throwaway runs.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::Event;
use crate::storage::{EventStore, InsertOutcome};

#[derive(Default)]
struct Inner {
    ids: HashSet<u64>,
    events: Vec<Event>,
}

/// Known-event set held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn contains(&self, id: u64) -> Result<bool> {
        Ok(self.inner.lock().await.ids.contains(&id))
    }

    async fn insert(&self, event: &Event) -> Result<InsertOutcome> {
        let mut inner = self.inner.lock().await;
        if !inner.ids.insert(event.id) {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        inner.events.push(event.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.lock().await.events.len())
    }

    async fn all(&self) -> Result<Vec<Event>> {
        Ok(self.inner.lock().await.events.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_event;

    #[tokio::test]
    async fn test_duplicate_insert_is_noop() {
        let store = MemoryStore::new();
        let event = sample_event(1);

        assert_eq!(store.insert(&event).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(
            store.insert(&event).await.unwrap(),
            InsertOutcome::AlreadyPresent
        );
        assert!(store.contains(1).await.unwrap());
        assert!(!store.contains(2).await.unwrap());
        assert_eq!(store.len().await.unwrap(), 1);
    }
}
