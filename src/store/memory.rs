//! Process-local document store
//!
//! Keeps every collection as an append-only vector behind a mutex. Used for
//! local runs and tests; the server timestamp is the process clock read while
//! the lock is held, so timestamps within one collection never go backwards.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use super::{Document, DocumentRef, DocumentStore, StoreError};

/// A document as it was written, sentinels resolved
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub reference: DocumentRef,
    pub document: Document,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<Mutex<HashMap<String, Vec<StoredDocument>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a collection in write order
    pub fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        let guard = self.collections.lock().unwrap_or_else(PoisonError::into_inner);
        guard.get(collection).cloned().unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.documents(collection).len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn add(&self, collection: &str, document: Document) -> Result<DocumentRef, StoreError> {
        let mut guard = self.collections.lock().unwrap_or_else(PoisonError::into_inner);

        let write_time = Utc::now();
        let reference = DocumentRef {
            collection: collection.to_string(),
            id: Uuid::new_v4(),
            write_time,
        };

        guard
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument {
                reference: reference.clone(),
                document: document.resolve_server_timestamps(write_time),
            });

        tracing::debug!("Stored document {} in memory", reference.path());

        Ok(reference)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldValue;

    #[tokio::test]
    async fn test_add_resolves_sentinel_and_appends() {
        let store = InMemoryStore::new();
        let before = Utc::now();

        let doc = Document::new()
            .with("text", "first")
            .with("createdAt", FieldValue::ServerTimestamp);
        let reference = store.add("messages", doc).await.unwrap();

        let docs = store.documents("messages");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].reference, reference);
        match docs[0].document.get("createdAt") {
            Some(FieldValue::Timestamp(ts)) => assert!(*ts >= before),
            other => panic!("createdAt not resolved: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let store = InMemoryStore::new();
        store.add("messages", Document::new().with("text", "a")).await.unwrap();
        store.add("audit", Document::new().with("text", "b")).await.unwrap();

        assert_eq!(store.count("messages"), 1);
        assert_eq!(store.count("audit"), 1);
        assert_eq!(store.count("missing"), 0);
    }

    #[tokio::test]
    async fn test_poisoned_lock_still_accepts_writes() {
        let store = InMemoryStore::new();
        store.add("messages", Document::new().with("text", "before")).await.unwrap();

        let collections = Arc::clone(&store.collections);
        let _ = std::thread::spawn(move || {
            let _guard = collections.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(store.collections.is_poisoned());

        store.add("messages", Document::new().with("text", "after")).await.unwrap();
        assert_eq!(store.count("messages"), 2);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemoryStore::new();
        let handle = store.clone();
        handle.add("messages", Document::new().with("text", "x")).await.unwrap();
        assert_eq!(store.count("messages"), 1);
    }
}
