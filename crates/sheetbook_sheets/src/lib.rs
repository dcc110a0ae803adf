// --- File: crates/sheetbook_sheets/src/lib.rs ---
//! Row store for the booking ledger.
//!
//! A spreadsheet tab is treated as a table: row 0 holds the column names and
//! every following row is a record. The [`RowStore`] trait is the storage seam;
//! [`SheetsClient`] talks to the Google Sheets v4 API and [`InMemoryRowStore`]
//! keeps grids in process. [`RowStoreAdapter`] layers the lookup, write and
//! counter operations on top of either.

pub mod adapter;
pub mod address;
#[cfg(test)]
mod address_proptest;
pub mod auth;
pub mod client;
pub mod error;
pub mod memory;
pub mod schema;
pub mod store;

pub use adapter::RowStoreAdapter;
pub use address::{a1_cell, column_index, column_letter, quote_sheet_name};
pub use auth::{ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};
pub use client::SheetsClient;
pub use error::SheetError;
pub use memory::InMemoryRowStore;
pub use schema::{ResolvedTable, TableSchema};
pub use store::{FoundRow, Grid, RowStore};
