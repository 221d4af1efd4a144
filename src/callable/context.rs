//! Per-invocation context supplied by the caller's headers
//!
//! Tokens are passed through as presented. Nothing here verifies them; the
//! hosting platform is expected to have done so before the call reaches us.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const INSTANCE_ID_HEADER: &str = "firebase-instance-id-token";

/// Bearer token from the `Authorization` header, unverified
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub invocation_id: Uuid,
    pub auth: Option<AuthToken>,
    pub instance_id_token: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl InvocationContext {
    /// Context for a call with no credentials, e.g. from tests or local tools
    pub fn anonymous() -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            auth: None,
            instance_id_token: None,
            received_at: Utc::now(),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_bearer)
            .map(|raw| AuthToken { raw });

        let instance_id_token = headers
            .get(INSTANCE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from);

        Self {
            auth,
            instance_id_token,
            ..Self::anonymous()
        }
    }
}

fn parse_bearer(value: &str) -> Option<String> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        headers.insert(INSTANCE_ID_HEADER, HeaderValue::from_static("iid-1"));

        let ctx = InvocationContext::from_headers(&headers);
        assert_eq!(ctx.auth, Some(AuthToken { raw: "abc.def".to_string() }));
        assert_eq!(ctx.instance_id_token.as_deref(), Some("iid-1"));
    }

    #[test]
    fn test_non_bearer_authorization_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));

        let ctx = InvocationContext::from_headers(&headers);
        assert!(ctx.auth.is_none());
        assert!(ctx.instance_id_token.is_none());
    }

    #[test]
    fn test_each_context_gets_its_own_id() {
        let headers = HeaderMap::new();
        let a = InvocationContext::from_headers(&headers);
        let b = InvocationContext::from_headers(&headers);
        assert_ne!(a.invocation_id, b.invocation_id);
    }
}
