// --- File: crates/sheetbook_sheets/src/auth.rs ---
//! Access tokens for the Google Sheets API.
//!
//! Service-account credentials are exchanged for an OAuth2 token with the
//! spreadsheets scope. The key can come inline (`sheets.credentials_json`)
//! or from a key file (`sheets.key_path`).

use std::path::Path;
use std::sync::Arc;

use sheetbook_common::BoxFuture;
use sheetbook_config::SheetsConfig;
use tracing::{debug, info};
use yup_oauth2::{
    parse_service_account_key, read_service_account_key, ServiceAccountAuthenticator,
    ServiceAccountKey,
};

use crate::error::SheetError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Supplies bearer tokens for Sheets API calls.
pub trait TokenProvider: Send + Sync {
    fn access_token(&self) -> BoxFuture<'_, String, SheetError>;
}

/// Always hands out the same token. Useful against local API stand-ins.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn access_token(&self) -> BoxFuture<'_, String, SheetError> {
        let token = self.token.clone();
        Box::pin(async move { Ok(token) })
    }
}

type FetchToken = Box<dyn Fn() -> BoxFuture<'static, String, SheetError> + Send + Sync>;

/// Service-account token provider. The authenticator is built once and
/// keeps its own token cache, refreshing shortly before expiry.
pub struct ServiceAccountTokenProvider {
    client_email: String,
    fetch: FetchToken,
}

impl ServiceAccountTokenProvider {
    pub async fn new(key: ServiceAccountKey) -> Result<Self, SheetError> {
        let client_email = key.client_email.clone();
        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| SheetError::AuthError(format!("Authenticator setup failed: {}", e)))?;
        let auth = Arc::new(auth);
        let fetch: FetchToken = Box::new(move || {
            let auth = auth.clone();
            Box::pin(async move {
                let token = auth
                    .token(&[SHEETS_SCOPE])
                    .await
                    .map_err(|e| SheetError::AuthError(e.to_string()))?;
                token
                    .token()
                    .map(str::to_string)
                    .ok_or_else(|| SheetError::AuthError("No token available".to_string()))
            })
        });
        Ok(Self { client_email, fetch })
    }

    /// Loads the service-account key named by the config.
    ///
    /// Inline JSON wins over `key_path`. Malformed or missing credentials are
    /// reported as `ConfigError`.
    pub async fn from_config(config: &SheetsConfig) -> Result<Self, SheetError> {
        let key = if let Some(json) = config.credentials_json.as_deref() {
            parse_service_account_key(json).map_err(|e| {
                SheetError::ConfigError(format!("Malformed service account credentials: {}", e))
            })?
        } else if let Some(path) = config.key_path.as_deref() {
            read_service_account_key(Path::new(path))
                .await
                .map_err(|e| {
                    SheetError::ConfigError(format!(
                        "Cannot read service account key at {}: {}",
                        path, e
                    ))
                })?
        } else {
            return Err(SheetError::ConfigError(
                "Missing sheets.credentials_json or sheets.key_path".to_string(),
            ));
        };
        info!("Loaded Sheets service account {}", key.client_email);
        Self::new(key).await
    }
}

impl TokenProvider for ServiceAccountTokenProvider {
    fn access_token(&self) -> BoxFuture<'_, String, SheetError> {
        debug!("Sheets access token requested for {}", self.client_email);
        (self.fetch)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_without_credentials() -> SheetsConfig {
        SheetsConfig {
            credentials_json: None,
            key_path: None,
            bookings_spreadsheet_id: "doc".to_string(),
            events_spreadsheet_id: None,
            bookings_sheet: "Bookings".to_string(),
            events_sheet: "Events".to_string(),
            api_base: "http://localhost".to_string(),
        }
    }

    #[tokio::test]
    async fn test_static_token_provider() {
        let provider = StaticTokenProvider::new("ya29.test");
        assert_eq!(provider.access_token().await.unwrap(), "ya29.test");
    }

    #[tokio::test]
    async fn test_missing_credentials_is_config_error() {
        let result = ServiceAccountTokenProvider::from_config(&config_without_credentials()).await;
        assert!(matches!(result, Err(SheetError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_malformed_credentials_is_config_error() {
        let mut config = config_without_credentials();
        config.credentials_json = Some("{not json".to_string());
        let result = ServiceAccountTokenProvider::from_config(&config).await;
        assert!(matches!(result, Err(SheetError::ConfigError(_))));
    }
}
