// --- File: crates/sheetbook_sheets/src/error.rs ---
use sheetbook_common::{external_service_error, HttpStatusCode, ServiceError};
use thiserror::Error;

/// Row store error types.
#[derive(Error, Debug)]
pub enum SheetError {
    /// The header row has no column with this exact name
    #[error("Column '{column}' not found in sheet '{sheet}'")]
    ColumnNotFound { sheet: String, column: String },

    /// No data row holds the requested value
    #[error("No row in sheet '{sheet}' where '{column}' = '{value}'")]
    RowNotFound {
        sheet: String,
        column: String,
        value: String,
    },

    /// The store rejected a write
    #[error("Write to {target} failed: {message}")]
    WriteError { target: String, message: String },

    /// Error returned by the Sheets API on a read
    #[error("Sheets API returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// Error occurred during a Sheets API request
    #[error("Sheets API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error parsing a Sheets API response
    #[error("Failed to parse Sheets API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Could not obtain an access token
    #[error("Sheets authentication error: {0}")]
    AuthError(String),

    /// Missing or malformed Sheets configuration
    #[error("Sheets configuration error: {0}")]
    ConfigError(String),

    /// Row or column address outside the sheet grid
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// A conditional write kept losing to concurrent writers
    #[error("Cell {cell} changed concurrently; gave up after {attempts} attempts")]
    Conflict { cell: String, attempts: u32 },
}

impl From<SheetError> for ServiceError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::ColumnNotFound { .. } => ServiceError::ConfigError(err.to_string()),
            SheetError::RowNotFound { .. } => ServiceError::NotFoundError(err.to_string()),
            SheetError::WriteError { .. } | SheetError::Conflict { .. } => {
                ServiceError::StorageError(err.to_string())
            }
            SheetError::ApiError {
                status_code,
                message,
            } => external_service_error(
                "Google Sheets",
                format!("Status: {}, Message: {}", status_code, message),
            ),
            SheetError::RequestError(e) => {
                ServiceError::HttpError(format!("Sheets request error: {}", e))
            }
            SheetError::ParseError(e) => {
                external_service_error("Google Sheets", format!("Unreadable response: {}", e))
            }
            SheetError::AuthError(msg) | SheetError::ConfigError(msg) => {
                ServiceError::ConfigError(msg)
            }
            SheetError::InvalidAddress(msg) => ServiceError::InternalError(msg),
        }
    }
}

impl HttpStatusCode for SheetError {
    fn status_code(&self) -> u16 {
        match self {
            SheetError::RowNotFound { .. } => 404,
            _ => 500,
        }
    }
}
