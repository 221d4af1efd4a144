//! Callable error kinds and the structured error returned to callers.
//!
//! A callable function fails with an [`HttpsError`]: a kind tag drawn from the
//! canonical set below plus a human-readable message. On the wire it becomes
//! `{"error": {"status": "UNKNOWN", "message": "..."}}` with an HTTP status
//! derived from the kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical error kinds understood by callable clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionsErrorCode {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl FunctionsErrorCode {
    /// The kebab-case tag, e.g. `invalid-argument`
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionsErrorCode::Ok => "ok",
            FunctionsErrorCode::Cancelled => "cancelled",
            FunctionsErrorCode::Unknown => "unknown",
            FunctionsErrorCode::InvalidArgument => "invalid-argument",
            FunctionsErrorCode::DeadlineExceeded => "deadline-exceeded",
            FunctionsErrorCode::NotFound => "not-found",
            FunctionsErrorCode::AlreadyExists => "already-exists",
            FunctionsErrorCode::PermissionDenied => "permission-denied",
            FunctionsErrorCode::ResourceExhausted => "resource-exhausted",
            FunctionsErrorCode::FailedPrecondition => "failed-precondition",
            FunctionsErrorCode::Aborted => "aborted",
            FunctionsErrorCode::OutOfRange => "out-of-range",
            FunctionsErrorCode::Unimplemented => "unimplemented",
            FunctionsErrorCode::Internal => "internal",
            FunctionsErrorCode::Unavailable => "unavailable",
            FunctionsErrorCode::DataLoss => "data-loss",
            FunctionsErrorCode::Unauthenticated => "unauthenticated",
        }
    }

    /// The upper-case status name used in the wire `error.status` field
    pub fn canonical_status(&self) -> &'static str {
        match self {
            FunctionsErrorCode::Ok => "OK",
            FunctionsErrorCode::Cancelled => "CANCELLED",
            FunctionsErrorCode::Unknown => "UNKNOWN",
            FunctionsErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            FunctionsErrorCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            FunctionsErrorCode::NotFound => "NOT_FOUND",
            FunctionsErrorCode::AlreadyExists => "ALREADY_EXISTS",
            FunctionsErrorCode::PermissionDenied => "PERMISSION_DENIED",
            FunctionsErrorCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            FunctionsErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            FunctionsErrorCode::Aborted => "ABORTED",
            FunctionsErrorCode::OutOfRange => "OUT_OF_RANGE",
            FunctionsErrorCode::Unimplemented => "UNIMPLEMENTED",
            FunctionsErrorCode::Internal => "INTERNAL",
            FunctionsErrorCode::Unavailable => "UNAVAILABLE",
            FunctionsErrorCode::DataLoss => "DATA_LOSS",
            FunctionsErrorCode::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            FunctionsErrorCode::Ok => StatusCode::OK,
            FunctionsErrorCode::Cancelled => StatusCode::from_u16(499)
                .unwrap_or(StatusCode::BAD_REQUEST),
            FunctionsErrorCode::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            FunctionsErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            FunctionsErrorCode::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            FunctionsErrorCode::NotFound => StatusCode::NOT_FOUND,
            FunctionsErrorCode::AlreadyExists => StatusCode::CONFLICT,
            FunctionsErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            FunctionsErrorCode::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
            FunctionsErrorCode::FailedPrecondition => StatusCode::BAD_REQUEST,
            FunctionsErrorCode::Aborted => StatusCode::CONFLICT,
            FunctionsErrorCode::OutOfRange => StatusCode::BAD_REQUEST,
            FunctionsErrorCode::Unimplemented => StatusCode::NOT_IMPLEMENTED,
            FunctionsErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            FunctionsErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            FunctionsErrorCode::DataLoss => StatusCode::INTERNAL_SERVER_ERROR,
            FunctionsErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }
}

impl fmt::Display for FunctionsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error surfaced to the caller of a callable function
#[derive(Debug, Clone, PartialEq)]
pub struct HttpsError {
    pub code: FunctionsErrorCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HttpsError {
    pub fn new(code: FunctionsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FunctionsErrorCode::Unknown, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(FunctionsErrorCode::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FunctionsErrorCode::Internal, message)
    }

    /// Wire representation: `{"error": {"status", "message", "details"?}}`
    pub fn to_body(&self) -> serde_json::Value {
        let mut error = serde_json::json!({
            "status": self.code.canonical_status(),
            "message": self.message,
        });
        if let Some(details) = &self.details {
            error["details"] = details.clone();
        }
        serde_json::json!({ "error": error })
    }
}

impl fmt::Display for HttpsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for HttpsError {}

impl IntoResponse for HttpsError {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self.to_body())).into_response()
    }
}
