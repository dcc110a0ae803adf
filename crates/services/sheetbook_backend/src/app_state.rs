// --- File: crates/services/sheetbook_backend/src/app_state.rs ---
use std::sync::Arc;

use sheetbook_bookings::{BookingService, Ledger};
use sheetbook_common::ServiceError;
use sheetbook_config::AppConfig;
use sheetbook_sheets::{RowStore, ServiceAccountTokenProvider, SheetsClient, TokenProvider};
use sheetbook_stripe::StripePaymentService;
use tracing::info;

/// Everything the router needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub bookings: Arc<BookingService>,
}

impl AppState {
    /// Connects to the spreadsheets and checks both tab layouts.
    ///
    /// Fails on missing credentials or a missing required column, so a
    /// misconfigured deployment never starts serving.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, ServiceError> {
        let sheets = &config.sheets;
        let tokens: Arc<dyn TokenProvider> =
            Arc::new(ServiceAccountTokenProvider::from_config(sheets).await?);

        let bookings_store: Arc<dyn RowStore> = Arc::new(SheetsClient::new(
            sheets.api_base.clone(),
            sheets.bookings_spreadsheet_id.clone(),
            tokens.clone(),
        ));
        // One client per document, so counter updates share a write lock.
        let events_store: Arc<dyn RowStore> =
            if sheets.events_spreadsheet_id() == sheets.bookings_spreadsheet_id {
                bookings_store.clone()
            } else {
                info!(
                    "Events live in a separate spreadsheet ({})",
                    sheets.events_spreadsheet_id()
                );
                Arc::new(SheetsClient::new(
                    sheets.api_base.clone(),
                    sheets.events_spreadsheet_id(),
                    tokens,
                ))
            };

        let ledger = Ledger::connect(
            bookings_store,
            events_store,
            &sheets.bookings_sheet,
            &sheets.events_sheet,
        )
        .await?;
        let payments = Arc::new(StripePaymentService::new(config.clone()));
        let bookings = Arc::new(BookingService::new(ledger, payments, &config));

        Ok(Self { config, bookings })
    }
}
