// --- File: crates/sheetbook_bookings/src/lib.rs ---
//! Booking ledger service.
//!
//! Ties Stripe payments to a spreadsheet of bookings and events: checkout
//! creation, payment confirmation (client callback or signed webhook),
//! direct bookings and the booking details join for confirmation pages.

pub mod calendar;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod logic;
pub mod models;
pub mod policy;
pub mod routes;

pub use error::BookingError;
pub use ledger::Ledger;
pub use logic::BookingService;
pub use policy::ConfirmationPolicy;
pub use routes::routes;
