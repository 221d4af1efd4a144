//! The `addMessage` function
//!
//! Appends `{text, createdAt}` to the messages collection, with `createdAt`
//! left as a server timestamp sentinel for the store to resolve.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::callable::InvocationContext;
use crate::config::ValidationMode;
use crate::error::HttpsError;
use crate::store::{Document, DocumentStore, FieldValue};

pub const SUCCESS_RESULT: &str = "Message added successfully!";
pub const TEXT_FIELD: &str = "text";
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Decoded `addMessage` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
}

impl AddMessageRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMessageResponse {
    pub result: String,
}

pub struct MessageIngressHandler {
    store: Arc<dyn DocumentStore>,
    collection: String,
    validation: ValidationMode,
}

impl MessageIngressHandler {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            validation: ValidationMode::default(),
        }
    }

    pub fn with_validation(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn validation(&self) -> ValidationMode {
        self.validation
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Decode an untyped callable payload and run [`Self::handle`].
    ///
    /// The payload must be an object. A `null` payload is deliberately treated
    /// like `{}`. A `message` that is present must be a string or null.
    pub async fn handle_payload(
        &self,
        payload: Value,
        context: &InvocationContext,
    ) -> Result<AddMessageResponse, HttpsError> {
        let request = self.decode(payload)?;
        self.handle(request, context).await
    }

    fn decode(&self, payload: Value) -> Result<AddMessageRequest, HttpsError> {
        let message = match payload {
            Value::Null => None,
            Value::Object(mut fields) => match fields.remove("message") {
                None | Some(Value::Null) => None,
                Some(Value::String(message)) => Some(message),
                Some(other) => {
                    return Err(HttpsError::invalid_argument(format!(
                        "'message' must be a string, got {}",
                        json_type_name(&other)
                    )))
                }
            },
            other => {
                return Err(HttpsError::invalid_argument(format!(
                    "payload must be an object, got {}",
                    json_type_name(&other)
                )))
            }
        };
        Ok(AddMessageRequest { message })
    }

    /// Append one message record and acknowledge it.
    ///
    /// Any store failure is reported as `unknown` carrying the store's message.
    /// Nothing is retried.
    pub async fn handle(
        &self,
        request: AddMessageRequest,
        context: &InvocationContext,
    ) -> Result<AddMessageResponse, HttpsError> {
        if self.validation == ValidationMode::Strict {
            match request.message.as_deref() {
                None => {
                    return Err(HttpsError::invalid_argument("'message' is required"));
                }
                Some(m) if m.is_empty() => {
                    return Err(HttpsError::invalid_argument("'message' must not be empty"));
                }
                Some(_) => {}
            }
        } else if request.message.is_none() {
            tracing::warn!(
                invocation_id = %context.invocation_id,
                "addMessage called without 'message'; storing null text"
            );
        }

        let record = Document::new()
            .with(TEXT_FIELD, request.message)
            .with(CREATED_AT_FIELD, FieldValue::ServerTimestamp);

        match self.store.add(&self.collection, record).await {
            Ok(reference) => {
                tracing::info!(
                    invocation_id = %context.invocation_id,
                    authenticated = context.auth.is_some(),
                    "Message {} added at {}",
                    reference.path(),
                    reference.write_time
                );
                Ok(AddMessageResponse {
                    result: SUCCESS_RESULT.to_string(),
                })
            }
            Err(e) => {
                tracing::error!(
                    invocation_id = %context.invocation_id,
                    backend = self.store.backend(),
                    "Failed to add message: {}",
                    e
                );
                Err(HttpsError::unknown(e.message()))
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
