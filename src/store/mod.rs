//! Document store abstraction
//!
//! The handler only ever appends: [`DocumentStore::add`] writes one new
//! document to a named collection and returns a reference to it once the
//! backend has acknowledged the write. Field values may carry the
//! [`FieldValue::ServerTimestamp`] sentinel, which each backend replaces with
//! its own clock at write time.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresStore};

/// A single field value in a document
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    String(String),
    Timestamp(DateTime<Utc>),
    /// Placeholder resolved to the store's clock when the write happens
    ServerTimestamp,
}

impl FieldValue {
    pub fn is_server_timestamp(&self) -> bool {
        matches!(self, FieldValue::ServerTimestamp)
    }

    /// JSON form of a resolved value. The sentinel has no JSON form.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            FieldValue::Null => Some(serde_json::Value::Null),
            FieldValue::String(s) => Some(serde_json::Value::String(s.clone())),
            FieldValue::Timestamp(ts) => Some(serde_json::Value::String(ts.to_rfc3339())),
            FieldValue::ServerTimestamp => None,
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::String)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

/// Field name -> value. Ordered so stored documents serialize deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of the fields holding the server timestamp sentinel
    pub fn server_timestamp_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, v)| v.is_server_timestamp())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Replace every sentinel with `now`
    pub fn resolve_server_timestamps(mut self, now: DateTime<Utc>) -> Self {
        for value in self.fields.values_mut() {
            if value.is_server_timestamp() {
                *value = FieldValue::Timestamp(now);
            }
        }
        self
    }

    /// JSON object of the resolved fields; sentinel fields are skipped
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .filter_map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Reference to a document the store has durably written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub collection: String,
    pub id: Uuid,
    /// Value the store used for server timestamp sentinels in this write
    pub write_time: DateTime<Utc>,
}

impl DocumentRef {
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}

/// Failures reported by a document store backend
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Connection(String),
    PermissionDenied(String),
    ResourceExhausted(String),
    Rejected(String),
    Internal(String),
}

impl StoreError {
    /// The backend's own message, without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            StoreError::Connection(msg)
            | StoreError::PermissionDenied(msg)
            | StoreError::ResourceExhausted(msg)
            | StoreError::Rejected(msg)
            | StoreError::Internal(msg) => msg,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for StoreError {}

/// Append-only access to an external document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write `document` as a new document in `collection`.
    ///
    /// Returns only after the backend has acknowledged the write. The write is
    /// atomic: on error nothing is visible.
    async fn add(&self, collection: &str, document: Document) -> Result<DocumentRef, StoreError>;

    /// Cheap connectivity probe used by readiness checks
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}
