use thiserror::Error;

use crate::llm::LlmError;

/// Errors surfaced by the durable conversation table.
///
/// Both variants are the "store unavailable" class: the request was not
/// served and nothing was committed. They are propagated without retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store rejected the request (throughput exceeded): {0}")]
    Throttled(String),
}

/// A stored item that cannot be coerced into a record even under the
/// defaulting rules. Such items are skipped when listing.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed stored item: {0}")]
    Malformed(String),
}

/// Errors from the conversation turn flow (store plus model).
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("model error: {0}")]
    Model(#[from] LlmError),

    #[error("invalid request: {0}")]
    Validation(String),
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid table name '{0}': use 3-255 characters from [A-Za-z0-9_.-]")]
    InvalidTableName(String),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "store unavailable: connection refused");
    }

    #[test]
    fn test_chat_error_is_transparent_for_store() {
        let err: ChatError = StoreError::Throttled("busy".to_string()).into();
        assert!(err.to_string().contains("throughput exceeded"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidTableName("a;drop".to_string());
        assert!(err.to_string().contains("a;drop"));
    }
}
