//! Integration tests for the addMessage handler against store doubles

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use message_ingress::{
    AddMessageRequest, Document, DocumentRef, DocumentStore, FieldValue, FunctionsErrorCode,
    InMemoryStore, InvocationContext, MessageIngressHandler, StoreError, ValidationMode,
    SUCCESS_RESULT,
};

/// Records every `add` call without resolving sentinels
#[derive(Default)]
struct RecordingStore {
    calls: Mutex<Vec<(String, Document)>>,
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn add(&self, collection: &str, document: Document) -> Result<DocumentRef, StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push((collection.to_string(), document));
        Ok(DocumentRef {
            collection: collection.to_string(),
            id: uuid::Uuid::new_v4(),
            write_time: Utc::now(),
        })
    }

    fn backend(&self) -> &'static str {
        "recording"
    }
}

/// Rejects every write with a fixed error
struct RejectingStore {
    error: StoreError,
}

#[async_trait]
impl DocumentStore for RejectingStore {
    async fn add(&self, _collection: &str, _document: Document) -> Result<DocumentRef, StoreError> {
        Err(self.error.clone())
    }

    fn backend(&self) -> &'static str {
        "rejecting"
    }
}

fn memory_handler(store: &InMemoryStore) -> MessageIngressHandler {
    MessageIngressHandler::new(Arc::new(store.clone()), "messages")
}

#[tokio::test]
async fn test_hello_issues_one_add_with_sentinel() {
    let store = Arc::new(RecordingStore::default());
    let handler = MessageIngressHandler::new(store.clone(), "messages");

    let response = handler
        .handle(AddMessageRequest::new("hello"), &InvocationContext::anonymous())
        .await
        .unwrap();
    assert_eq!(response.result, "Message added successfully!");

    let calls = store.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (collection, document) = &calls[0];
    assert_eq!(collection, "messages");
    assert_eq!(document.len(), 2);
    assert_eq!(document.get("text"), Some(&FieldValue::String("hello".to_string())));
    assert_eq!(document.get("createdAt"), Some(&FieldValue::ServerTimestamp));
}

#[tokio::test]
async fn test_record_text_and_created_at() {
    let store = InMemoryStore::new();
    let handler = memory_handler(&store);
    let start = Utc::now();

    handler
        .handle(AddMessageRequest::new("a message"), &InvocationContext::anonymous())
        .await
        .unwrap();

    let docs = store.documents("messages");
    assert_eq!(docs.len(), 1);
    assert_eq!(
        docs[0].document.get("text"),
        Some(&FieldValue::String("a message".to_string()))
    );
    match docs[0].document.get("createdAt") {
        Some(FieldValue::Timestamp(ts)) => assert!(*ts >= start),
        other => panic!("createdAt should be a resolved timestamp, got {:?}", other),
    }
}

#[tokio::test]
async fn test_store_failure_is_unknown_with_message() {
    let store = Arc::new(RejectingStore {
        error: StoreError::PermissionDenied("permission denied".to_string()),
    });
    let handler = MessageIngressHandler::new(store, "messages");

    let err = handler
        .handle(AddMessageRequest::new("hello"), &InvocationContext::anonymous())
        .await
        .unwrap_err();

    assert_eq!(err.code, FunctionsErrorCode::Unknown);
    assert_eq!(err.message, "permission denied");
}

#[tokio::test]
async fn test_every_store_failure_kind_maps_to_unknown() {
    let failures = vec![
        StoreError::Connection("connection reset".to_string()),
        StoreError::ResourceExhausted("quota exceeded".to_string()),
        StoreError::Rejected("document too large".to_string()),
        StoreError::Internal("lock poisoned".to_string()),
    ];

    for failure in failures {
        let expected = failure.message().to_string();
        let handler = MessageIngressHandler::new(Arc::new(RejectingStore { error: failure }), "messages");
        let err = handler
            .handle(AddMessageRequest::new("x"), &InvocationContext::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err.code, FunctionsErrorCode::Unknown);
        assert_eq!(err.message, expected);
    }
}

#[tokio::test]
async fn test_missing_message_lenient_stores_null_text() {
    let store = InMemoryStore::new();
    let handler = memory_handler(&store);

    let response = handler
        .handle_payload(serde_json::json!({}), &InvocationContext::anonymous())
        .await
        .unwrap();
    assert_eq!(response.result, SUCCESS_RESULT);

    let docs = store.documents("messages");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].document.get("text"), Some(&FieldValue::Null));
}

#[tokio::test]
async fn test_missing_message_strict_is_invalid_argument() {
    let store = InMemoryStore::new();
    let handler = memory_handler(&store).with_validation(ValidationMode::Strict);

    let err = handler
        .handle_payload(serde_json::json!({}), &InvocationContext::anonymous())
        .await
        .unwrap_err();

    assert_eq!(err.code, FunctionsErrorCode::InvalidArgument);
    assert_eq!(store.count("messages"), 0);
}

#[tokio::test]
async fn test_concurrent_distinct_messages_all_stored() {
    let store = InMemoryStore::new();
    let handler = Arc::new(memory_handler(&store));
    let n = 50;

    let mut tasks = Vec::new();
    for i in 0..n {
        let handler = Arc::clone(&handler);
        tasks.push(tokio::spawn(async move {
            handler
                .handle(
                    AddMessageRequest::new(format!("message {}", i)),
                    &InvocationContext::anonymous(),
                )
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let docs = store.documents("messages");
    assert_eq!(docs.len(), n);

    let texts: HashSet<String> = docs
        .iter()
        .filter_map(|d| match d.document.get("text") {
            Some(FieldValue::String(s)) => Some(s.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(texts.len(), n);

    let ids: HashSet<_> = docs.iter().map(|d| d.reference.id).collect();
    assert_eq!(ids.len(), n);
}

#[tokio::test]
async fn test_identical_messages_produce_two_records() {
    let store = InMemoryStore::new();
    let handler = memory_handler(&store);
    let ctx = InvocationContext::anonymous();

    handler.handle(AddMessageRequest::new("same"), &ctx).await.unwrap();
    handler.handle(AddMessageRequest::new("same"), &ctx).await.unwrap();

    let docs = store.documents("messages");
    assert_eq!(docs.len(), 2);
    assert_ne!(docs[0].reference.id, docs[1].reference.id);
}
