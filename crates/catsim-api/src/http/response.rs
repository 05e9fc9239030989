//! Envelope response format for all API responses.
//!
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "errors": [],
//!   "_links": { "conversation": "/api/v1/chats/{chatId}/export" }
//! }
//! ```
//!
//! Handlers always build a 200 envelope; `AppError` overrides the status.

use std::collections::BTreeMap;

use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub meta: ApiMeta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiErrorDetail>,
    #[serde(rename = "_links", skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub request_id: String,
    pub timestamp: String,
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: &'static str,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    fn envelope(data: Option<T>, request_id: String, response_time_ms: u64) -> Self {
        Self {
            data,
            meta: ApiMeta {
                request_id,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                response_time_ms,
            },
            errors: Vec::new(),
            links: BTreeMap::new(),
        }
    }

    pub fn success(data: T, request_id: String, response_time_ms: u64) -> Self {
        Self::envelope(Some(data), request_id, response_time_ms)
    }

    pub fn with_link(mut self, rel: &'static str, href: &str) -> Self {
        self.links.insert(rel, href.to_string());
        self
    }
}

impl ApiResponse<()> {
    /// An envelope carrying a single error and no data.
    pub fn error(code: &'static str, message: &str, request_id: String) -> Self {
        let mut response = Self::envelope(None, request_id, 0);
        response.errors.push(ApiErrorDetail {
            code,
            message: message.to_string(),
        });
        response
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn success_envelope_omits_empty_sections() {
        let body = serde_json::to_value(ApiResponse::success(json!({"n": 1}), "r1".into(), 3)).unwrap();
        assert_eq!(body["data"], json!({"n": 1}));
        assert_eq!(body["meta"]["request_id"], "r1");
        assert_eq!(body["meta"]["response_time_ms"], 3);
        assert!(body.get("errors").is_none());
        assert!(body.get("_links").is_none());
    }

    #[test]
    fn error_envelope_has_no_data() {
        let body =
            serde_json::to_value(ApiResponse::error("NOT_FOUND", "gone", "r2".into())).unwrap();
        assert!(body.get("data").is_none());
        assert_eq!(body["errors"], json!([{"code": "NOT_FOUND", "message": "gone"}]));
        assert!(body["meta"]["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
    }

    #[test]
    fn links_are_keyed_by_relation() {
        let body: Value = serde_json::to_value(
            ApiResponse::success((), "r3".into(), 0).with_link("self", "/api/v1/chats/c1/export"),
        )
        .unwrap();
        assert_eq!(body["_links"], json!({"self": "/api/v1/chats/c1/export"}));
    }
}
