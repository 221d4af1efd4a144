//! # message-ingress: the `addMessage` callable function
//!
//! Accepts a text message over the callable-function HTTP protocol and appends
//! it to a document store collection, stamped with a server-side timestamp.
//!
//! ## Layout
//!
//! - [`handler`]: the function itself ([`MessageIngressHandler`])
//! - [`callable`]: request/response envelopes, invocation context, router
//! - [`store`]: the [`DocumentStore`] trait with in-memory and Postgres backends
//! - [`config`]: YAML + environment configuration
//! - [`error`]: callable error kinds and [`HttpsError`]
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use message_ingress::{InMemoryStore, InvocationContext, MessageIngressHandler, AddMessageRequest};
//!
//! let store = InMemoryStore::new();
//! let handler = MessageIngressHandler::new(Arc::new(store.clone()), "messages");
//! let response = handler
//!     .handle(AddMessageRequest::new("hello"), &InvocationContext::anonymous())
//!     .await?;
//! assert_eq!(response.result, "Message added successfully!");
//! ```

pub mod callable;
pub mod config;
pub mod error;
pub mod handler;
pub mod store;

pub use callable::{router, AppState, AuthToken, CallableRequest, CallableResponse, InvocationContext};
pub use config::{ConfigError, ServiceConfig, StoreConfig, ValidationMode};
pub use error::{FunctionsErrorCode, HttpsError};
pub use handler::{AddMessageRequest, AddMessageResponse, MessageIngressHandler, SUCCESS_RESULT};
pub use store::{Document, DocumentRef, DocumentStore, FieldValue, InMemoryStore, StoreError};

#[cfg(feature = "postgres")]
pub use store::{PostgresConfig, PostgresStore};
