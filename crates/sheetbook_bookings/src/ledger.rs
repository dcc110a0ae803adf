// --- File: crates/sheetbook_bookings/src/ledger.rs ---
use std::sync::Arc;

use sheetbook_sheets::store::{find_first, header_index};
use sheetbook_sheets::{Grid, ResolvedTable, RowStore, RowStoreAdapter, SheetError, TableSchema};
use tracing::info;

use crate::models::{
    bookings_schema, columns, events_schema, BookingRecord, EventRecord, NewBooking,
};

/// The bookings and events tabs, with their layouts checked at startup.
///
/// The two tabs may live in different spreadsheet documents.
pub struct Ledger {
    bookings: RowStoreAdapter,
    events: RowStoreAdapter,
    bookings_table: ResolvedTable,
    events_table: ResolvedTable,
}

async fn resolve(adapter: &RowStoreAdapter, schema: TableSchema) -> Result<ResolvedTable, SheetError> {
    let grid = adapter.read_grid(&schema.sheet).await?;
    let header = grid.first().cloned().unwrap_or_default();
    schema.resolve(&header)
}

impl Ledger {
    /// Reads both header rows and checks them against the declared schemas.
    ///
    /// Fails with `ColumnNotFound` when a required column is missing.
    pub async fn connect(
        bookings_store: Arc<dyn RowStore>,
        events_store: Arc<dyn RowStore>,
        bookings_sheet: &str,
        events_sheet: &str,
    ) -> Result<Self, SheetError> {
        let bookings = RowStoreAdapter::new(bookings_store);
        let events = RowStoreAdapter::new(events_store);
        let (bookings_table, events_table) = tokio::try_join!(
            resolve(&bookings, bookings_schema(bookings_sheet)),
            resolve(&events, events_schema(events_sheet)),
        )?;
        info!(
            "Ledger ready: bookings tab '{}', events tab '{}'",
            bookings_sheet, events_sheet
        );
        Ok(Self {
            bookings,
            events,
            bookings_table,
            events_table,
        })
    }

    pub fn bookings_table(&self) -> &ResolvedTable {
        &self.bookings_table
    }

    pub fn events_table(&self) -> &ResolvedTable {
        &self.events_table
    }

    pub async fn read_bookings(&self) -> Result<Grid, SheetError> {
        self.bookings.read_grid(self.bookings_table.sheet()).await
    }

    pub async fn read_events(&self) -> Result<Grid, SheetError> {
        self.events.read_grid(self.events_table.sheet()).await
    }

    /// First booking in `grid` whose `column` holds any of `candidates`.
    pub fn booking_in(
        &self,
        grid: &Grid,
        column: &str,
        candidates: &[String],
    ) -> Result<Option<BookingRecord>, SheetError> {
        let idx = header_index(grid, self.bookings_table.sheet(), column)?;
        Ok(find_first(grid, idx, candidates)
            .map(|row| BookingRecord::from_row(&self.bookings_table, &row)))
    }

    pub fn event_in(&self, grid: &Grid, event_id: &str) -> Result<Option<EventRecord>, SheetError> {
        let idx = header_index(grid, self.events_table.sheet(), columns::EVENT_ID)?;
        Ok(find_first(grid, idx, &[event_id])
            .map(|row| EventRecord::from_row(&self.events_table, &row)))
    }

    pub async fn find_booking_by_reference(
        &self,
        candidates: &[String],
    ) -> Result<Option<BookingRecord>, SheetError> {
        let row = self
            .bookings
            .find_row_matching_any(self.bookings_table.sheet(), columns::PAYMENT_REFERENCE, candidates)
            .await?;
        Ok(row.map(|row| BookingRecord::from_row(&self.bookings_table, &row)))
    }

    pub async fn find_booking_by_id(&self, booking_id: &str) -> Result<Option<BookingRecord>, SheetError> {
        let row = self
            .bookings
            .find_row_by_column_value(self.bookings_table.sheet(), columns::BOOKING_ID, booking_id)
            .await?;
        Ok(row.map(|row| BookingRecord::from_row(&self.bookings_table, &row)))
    }

    pub async fn find_event(&self, event_id: &str) -> Result<Option<EventRecord>, SheetError> {
        let row = self
            .events
            .find_row_by_column_value(self.events_table.sheet(), columns::EVENT_ID, event_id)
            .await?;
        Ok(row.map(|row| EventRecord::from_row(&self.events_table, &row)))
    }

    pub async fn append_booking(&self, booking: &NewBooking) -> Result<(), SheetError> {
        let row = self.bookings_table.build_row(&booking.cells());
        self.bookings
            .append_row(self.bookings_table.sheet(), row)
            .await?;
        info!(
            "Booking {} recorded for event {} (ref {})",
            booking.booking_id, booking.event_id, booking.payment_reference
        );
        Ok(())
    }

    pub async fn set_booking_status(
        &self,
        booking: &BookingRecord,
        status: &str,
    ) -> Result<(), SheetError> {
        let letter = self.bookings_table.letter(columns::STATUS)?;
        self.bookings
            .update_cell(self.bookings_table.sheet(), booking.row_number, &letter, status)
            .await?;
        info!(
            "Booking {} (row {}) status -> {}",
            booking.booking_id, booking.row_number, status
        );
        Ok(())
    }

    /// Takes one spot from the event, never going below zero.
    pub async fn decrement_capacity(&self, event_id: &str) -> Result<i64, SheetError> {
        self.events
            .decrement_counter(
                self.events_table.sheet(),
                columns::EVENT_ID,
                event_id,
                columns::SPOTS_REMAINING,
            )
            .await
    }
}
