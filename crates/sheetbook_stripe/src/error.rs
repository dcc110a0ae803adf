// --- File: crates/sheetbook_stripe/src/error.rs ---
use sheetbook_common::{external_service_error, HttpStatusCode, ServiceError};
use thiserror::Error;

/// Stripe-specific error types.
#[derive(Error, Debug)]
pub enum StripeError {
    /// Error occurred during a Stripe API request
    #[error("Stripe API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the Stripe API
    #[error("{message}")]
    ApiError { status_code: u16, message: String },

    /// Error parsing Stripe API response
    #[error("Failed to parse Stripe API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing or incomplete Stripe configuration
    #[error("Stripe configuration missing or incomplete: {0}")]
    ConfigError(String),

    /// An identifier that cannot be a Stripe object id
    #[error("Invalid Stripe identifier: {0}")]
    InvalidId(String),

    /// Webhook signature verification failed
    #[error("Stripe webhook signature verification failed: {0}")]
    WebhookSignatureError(String),

    /// Webhook payload could not be understood
    #[error("Stripe webhook event processing error: {0}")]
    WebhookProcessingError(String),

    /// Internal processing error
    #[error("Internal processing error: {0}")]
    InternalError(String),
}

/// Convert StripeError to ServiceError
impl From<StripeError> for ServiceError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::RequestError(e) => external_service_error("Stripe", e),
            StripeError::ApiError { message, .. } => external_service_error("Stripe", message),
            StripeError::ParseError(e) => {
                external_service_error("Stripe", format!("Unreadable response: {}", e))
            }
            StripeError::ConfigError(msg) => ServiceError::ConfigError(msg),
            StripeError::InvalidId(id) => {
                ServiceError::ValidationError(format!("Invalid Stripe identifier: {}", id))
            }
            StripeError::WebhookSignatureError(msg) => {
                ServiceError::AuthError(format!("Stripe webhook signature error: {}", msg))
            }
            StripeError::WebhookProcessingError(msg) => ServiceError::ValidationError(msg),
            StripeError::InternalError(msg) => {
                ServiceError::InternalError(format!("Stripe internal error: {}", msg))
            }
        }
    }
}

impl HttpStatusCode for StripeError {
    fn status_code(&self) -> u16 {
        match self {
            StripeError::InvalidId(_)
            | StripeError::WebhookSignatureError(_)
            | StripeError::WebhookProcessingError(_) => 400,
            _ => 500,
        }
    }
}
