//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use catsim_types::error::{ChatError, StoreError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// The conversation table failed or refused the request.
    Store(StoreError),
    /// The chat model failed to reply.
    Model(String),
    Validation(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Store(e) => AppError::Store(e),
            ChatError::Model(e) => AppError::Model(e.to_string()),
            ChatError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Store(e) => {
                tracing::warn!(error = %e, "Conversation store failure");
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE", e.to_string())
            }
            AppError::Model(msg) => (StatusCode::BAD_GATEWAY, "MODEL_ERROR", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        };

        let request_id = uuid::Uuid::now_v7().to_string();
        let mut response = ApiResponse::error(code, &message, request_id).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catsim_types::llm::LlmError;

    #[test]
    fn store_errors_are_service_unavailable() {
        let throttled = AppError::from(StoreError::Throttled("busy".to_string())).into_response();
        assert_eq!(throttled.status(), StatusCode::SERVICE_UNAVAILABLE);

        let chat = AppError::from(ChatError::Store(StoreError::Unavailable("down".to_string())))
            .into_response();
        assert_eq!(chat.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn model_and_validation_errors() {
        let model = AppError::from(ChatError::Model(LlmError::AuthenticationFailed)).into_response();
        assert_eq!(model.status(), StatusCode::BAD_GATEWAY);

        let bad = AppError::from(ChatError::Validation("empty".to_string())).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }
}
