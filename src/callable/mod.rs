//! HTTP surface for callable functions
//!
//! A callable is invoked with `POST /<name>` and a JSON body `{"data": ...}`.
//! It answers `{"result": ...}` on success, or an error body from
//! [`HttpsError`] with the mapped HTTP status.

pub mod context;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::Instrument;

use crate::error::HttpsError;
use crate::handler::MessageIngressHandler;

pub use context::{AuthToken, InvocationContext};

pub const ADD_MESSAGE_PATH: &str = "/addMessage";

/// Application state shared across requests
pub struct AppState {
    pub handler: MessageIngressHandler,
    pub cors_permissive: bool,
}

/// Request envelope of the callable protocol
#[derive(Debug)]
pub struct CallableRequest {
    pub data: serde_json::Value,
}

/// Success envelope of the callable protocol
#[derive(Debug, Serialize, Deserialize)]
pub struct CallableResponse<T> {
    pub result: T,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = state.cors_permissive;

    let app = Router::new()
        .route(ADD_MESSAGE_PATH, post(add_message).fallback(bad_method))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .with_state(state);

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Validate and unwrap the `{"data": ...}` envelope
pub fn decode_request(headers: &HeaderMap, body: &[u8]) -> Result<CallableRequest, HttpsError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    if !mime.eq_ignore_ascii_case("application/json") {
        tracing::warn!("Request has incorrect Content-Type: '{}'", content_type);
        return Err(HttpsError::invalid_argument("Bad Request"));
    }

    let body: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("Request body is not valid JSON: {}", e);
        HttpsError::invalid_argument("Bad Request")
    })?;

    match body {
        serde_json::Value::Object(mut envelope) => match envelope.remove("data") {
            Some(data) => Ok(CallableRequest { data }),
            None => {
                tracing::warn!("Request body is missing data");
                Err(HttpsError::invalid_argument("Bad Request"))
            }
        },
        _ => {
            tracing::warn!("Request body is not an object");
            Err(HttpsError::invalid_argument("Bad Request"))
        }
    }
}

/// Wrap a handler result in the success envelope
pub fn encode_result<T: Serialize>(result: T) -> Result<Response, HttpsError> {
    let body = serde_json::to_value(CallableResponse { result }).map_err(|e| {
        tracing::error!("Failed to encode result: {}", e);
        HttpsError::internal("INTERNAL")
    })?;
    Ok((StatusCode::OK, Json(body)).into_response())
}

async fn add_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpsError> {
    let context = InvocationContext::from_headers(&headers);
    let span = tracing::info_span!(
        "invocation",
        function = "addMessage",
        invocation_id = %context.invocation_id
    );

    async move {
        let request = decode_request(&headers, &body)?;
        let response = state.handler.handle_payload(request.data, &context).await?;
        encode_result(response)
    }
    .instrument(span)
    .await
}

async fn bad_method() -> HttpsError {
    tracing::warn!("Request has invalid method");
    HttpsError::invalid_argument("Bad Request")
}

/// Health check endpoint (liveness)
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "message-ingress",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint - verifies the document store answers
async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let store = state.handler.store();
    match store.ping().await {
        Ok(()) => Ok(Json(serde_json::json!({
            "status": "ready",
            "service": "message-ingress",
            "store": store.backend(),
        }))),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
