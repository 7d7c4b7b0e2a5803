//! Error helpers for quiver-scraper

use quiver_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an error for a failed HTTP request
pub fn http_error(url: &str, err: reqwest::Error) -> ExError {
    let kind = if err.is_timeout() {
        ExErrorKind::Timeout
    } else {
        ExErrorKind::ExternalService
    };
    ExError::new(kind)
        .with_op("fetch_page")
        .with_entity_id(url)
        .with_message(err.to_string())
}

/// Create an error for a failed or unusable LLM call
pub fn llm_error(provider: &str, message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::ExternalService)
        .with_op("llm_complete")
        .with_entity_id(provider)
        .with_message(message.into())
}

/// Create a configuration error
pub fn config_error(message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Configuration)
        .with_op("scraper_config")
        .with_message(message.into())
}

/// Create an IO error for session files
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
