use std::fmt;
use thiserror::Error;

/// The base error type shared by every Sheetbook crate.
///
/// Crate-specific errors implement `From<SpecificError> for ServiceError`
/// so handlers can turn any failure into a consistent HTTP response.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred while reading or writing the row store
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for ServiceError {
    fn status_code(&self) -> u16 {
        match self {
            ServiceError::HttpError(_) => 500,
            ServiceError::ParseError(_) => 400,
            ServiceError::ConfigError(_) => 500,
            ServiceError::AuthError(_) => 400,
            ServiceError::ValidationError(_) => 400,
            ServiceError::StorageError(_) => 500,
            // Upstream failures surface as 500 with the provider message passed through
            ServiceError::ExternalServiceError { .. } => 500,
            ServiceError::NotFoundError(_) => 404,
            ServiceError::InternalError(_) => 500,
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::ParseError(err.to_string())
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> ServiceError {
    ServiceError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> ServiceError {
    ServiceError::NotFoundError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> ServiceError {
    ServiceError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> ServiceError {
    ServiceError::InternalError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_error_taxonomy() {
        assert_eq!(validation_error("missing eventId").status_code(), 400);
        assert_eq!(not_found("booking").status_code(), 404);
        assert_eq!(ServiceError::ConfigError("bad credentials".into()).status_code(), 500);
        assert_eq!(external_service_error("Stripe", "card declined").status_code(), 500);
        assert_eq!(internal_error("boom").status_code(), 500);
    }

    #[test]
    fn test_external_error_message_is_passed_through() {
        let err = external_service_error("Stripe", "No such checkout.session: cs_x");
        assert_eq!(
            err.to_string(),
            "External service error: Stripe - No such checkout.session: cs_x"
        );
    }
}
