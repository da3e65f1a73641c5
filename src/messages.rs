//! Persisted message history.
//!
//! The whole log is one JSON array of [`MessageEntry`] stored under a single
//! blob key. Every update reads the full log, extends it and writes it back.

use std::sync::Arc;

use tracing::{debug, info};

use crate::models::MessageEntry;
use crate::storage::{BlobStore, StorageError};

/// Read/append access to the message log.
#[derive(Clone)]
pub struct MessageLog {
    store: Arc<dyn BlobStore>,
    key: String,
}

impl std::fmt::Debug for MessageLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageLog")
            .field("store", &self.store.name())
            .field("key", &self.key)
            .finish()
    }
}

impl MessageLog {
    pub fn new(store: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Every logged message, oldest first. A log that was never written is
    /// empty.
    pub async fn read(&self) -> Result<Vec<MessageEntry>, StorageError> {
        match self.store.get(&self.key).await {
            Ok(bytes) => {
                let entries: Vec<MessageEntry> = serde_json::from_slice(&bytes)?;
                debug!("Loaded {} messages from {}", entries.len(), self.key);
                Ok(entries)
            }
            Err(StorageError::NotFound(_)) => {
                debug!("No message log at {}, starting empty", self.key);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the whole log.
    pub async fn write(&self, entries: &[MessageEntry]) -> Result<(), StorageError> {
        let body = serde_json::to_vec(entries)?;
        self.store.put(&self.key, body).await
    }

    /// Append one sent message and its reply. Returns the new log length.
    pub async fn record_exchange(&self, sent: &str, reply: &str) -> Result<usize, StorageError> {
        let mut entries = self.read().await?;
        entries.push(MessageEntry::sender(sent));
        entries.push(MessageEntry::receiver(reply));
        self.write(&entries).await?;

        info!("Message log {} now holds {} messages", self.key, entries.len());
        Ok(entries.len())
    }
}
