// --- File: crates/sheetbook_config/src/models.rs ---

use serde::{Deserialize, Serialize};

/// Marker value that is swapped for an environment variable at load time.
pub const SECRET_FROM_ENV: &str = "secret_from_env";

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Public Site Config ---
// Used to build checkout redirect links and direct-booking confirmation links.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SiteConfig {
    pub base_url: String, // Mandatory, e.g. https://example.com
    #[serde(default = "default_confirmation_path")]
    pub confirmation_path: String,
    #[serde(default = "default_cancel_path")]
    pub cancel_path: String,
}

// --- Stripe Config ---
// Secret key and webhook secret usually arrive via "secret_from_env".
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StripeConfig {
    pub secret_key: String, // Loaded via STRIPE_SECRET_KEY
    #[serde(default)]
    pub webhook_secret: Option<String>, // Loaded via STRIPE_WEBHOOK_SECRET
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
}

// --- Google Sheets Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SheetsConfig {
    /// Inline service-account JSON (SHEETS_CREDENTIALS_JSON). Takes precedence over `key_path`.
    #[serde(default)]
    pub credentials_json: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
    pub bookings_spreadsheet_id: String, // Mandatory
    /// Separate document holding the events sheet. Falls back to the bookings document.
    #[serde(default)]
    pub events_spreadsheet_id: Option<String>,
    #[serde(default = "default_bookings_sheet")]
    pub bookings_sheet: String,
    #[serde(default = "default_events_sheet")]
    pub events_sheet: String,
    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,
}

impl SheetsConfig {
    pub fn events_spreadsheet_id(&self) -> &str {
        self.events_spreadsheet_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.bookings_spreadsheet_id)
    }
}

/// Where a confirmed booking row comes from.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Checkout writes a pending row; confirmation flips its status.
    UpdateExisting,
    /// Nothing is written until confirmation, which appends the row.
    #[default]
    AppendNew,
}

/// Which identifiers may match the booking's payment reference column.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookupKeys {
    SessionOnly,
    #[default]
    SessionOrIntent,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConfirmationConfig {
    #[serde(default)]
    pub write_mode: WriteMode,
    #[serde(default)]
    pub lookup_keys: LookupKeys,
    #[serde(default = "default_confirmed_status")]
    pub confirmed_status: String,
    #[serde(default = "default_direct_booking_marker")]
    pub direct_booking_marker: String,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::default(),
            lookup_keys: LookupKeys::default(),
            confirmed_status: default_confirmed_status(),
            direct_booking_marker: default_direct_booking_marker(),
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub stripe: StripeConfig,
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    /// e.g. "info", "debug". Defaults to info.
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_confirmation_path() -> String {
    "/booking-confirmation".to_string()
}

fn default_cancel_path() -> String {
    "/booking-cancelled".to_string()
}

fn default_currency() -> String {
    "gbp".to_string()
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_bookings_sheet() -> String {
    "Bookings".to_string()
}

fn default_events_sheet() -> String {
    "Events".to_string()
}

fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_confirmed_status() -> String {
    "Confirmed".to_string()
}

fn default_direct_booking_marker() -> String {
    "DIRECT_BOOKING".to_string()
}
