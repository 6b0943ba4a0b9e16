//! Storage abstractions for the known-event set.
//!
//! The set is append-only and keyed by event id: an event enters once, at
//! first observation, and is never updated or removed.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Service configuration
//! └── events.json           # Known events, ordered by first sighting
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Event;

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStore;

/// Result of inserting an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The id was already known; nothing changed
    AlreadyPresent,
}

/// Trait for known-event storage backends.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Whether an event with this id has been seen before.
    async fn contains(&self, id: u64) -> Result<bool>;

    /// Insert an event unless its id is already known.
    ///
    /// A duplicate id is not an error: concurrent cycles may race between
    /// `contains` and `insert`.
    async fn insert(&self, event: &Event) -> Result<InsertOutcome>;

    /// Number of known events.
    async fn len(&self) -> Result<usize>;

    /// All known events in insertion order.
    async fn all(&self) -> Result<Vec<Event>>;
}
