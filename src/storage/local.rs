//! Local filesystem storage implementation.
//!
//! Keeps the known-event set as a JSON array in `{root}/events.json`.
//! The file is loaded once when the store is opened and rewritten
//! atomically (temp file + rename) after every insert, so a crash mid-write
//! leaves the previous version in place.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::Event;
use crate::storage::{EventStore, InsertOutcome};

const EVENTS_KEY: &str = "events.json";

#[derive(Default)]
struct Known {
    ids: HashSet<u64>,
    events: Vec<Event>,
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    root_dir: PathBuf,
    known: Mutex<Known>,
}

impl LocalStorage {
    /// Open the store rooted at the given directory, creating an empty
    /// `events.json` if none exists yet.
    pub async fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self {
            root_dir: root_dir.into(),
            known: Mutex::new(Known::default()),
        };

        let events: Vec<Event> = match storage.read_json(EVENTS_KEY).await? {
            Some(events) => events,
            None => {
                log::info!("Creating empty event store at {}", storage.events_path().display());
                storage.write_json(EVENTS_KEY, &Vec::<Event>::new()).await?;
                Vec::new()
            }
        };

        let mut known = Known::default();
        for event in events {
            if known.ids.insert(event.id) {
                known.events.push(event);
            } else {
                log::warn!("Ignoring duplicate event {} in {}", event.id, EVENTS_KEY);
            }
        }
        log::info!(
            "Loaded {} known event(s) from {}",
            known.events.len(),
            storage.events_path().display()
        );
        *storage.known.lock().await = known;

        Ok(storage)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn events_path(&self) -> PathBuf {
        self.path(EVENTS_KEY)
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(|e| {
                AppError::storage(format!("{} is corrupt: {}", self.path(key).display(), e))
            })?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl EventStore for LocalStorage {
    async fn contains(&self, id: u64) -> Result<bool> {
        Ok(self.known.lock().await.ids.contains(&id))
    }

    async fn insert(&self, event: &Event) -> Result<InsertOutcome> {
        let mut known = self.known.lock().await;
        if known.ids.contains(&event.id) {
            return Ok(InsertOutcome::AlreadyPresent);
        }

        known.events.push(event.clone());
        if let Err(e) = self.write_json(EVENTS_KEY, &known.events).await {
            known.events.pop();
            return Err(e);
        }
        known.ids.insert(event.id);

        Ok(InsertOutcome::Inserted)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.known.lock().await.events.len())
    }

    async fn all(&self) -> Result<Vec<Event>> {
        Ok(self.known.lock().await.events.clone())
    }
}
