// --- File: crates/sheetbook_common/src/lib.rs ---

pub mod error;     // Error handling
pub mod http;      // HTTP utilities
pub mod logging;   // Logging utilities
pub mod services;  // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    ServiceError,
    HttpStatusCode,
    validation_error,
    not_found,
    external_service_error,
    internal_error,
};

// Re-export HTTP utilities for easier access
pub use http::{
    client::{HTTP_CLIENT, create_client},
};

pub use services::BoxFuture;
