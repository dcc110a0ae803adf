// --- File: crates/sheetbook_stripe/src/lib.rs ---

pub mod error;
pub mod logic;
pub mod service;

pub use error::StripeError;
pub use logic::{
    is_checkout_session_id, CheckoutSession, CheckoutSessionParams, PaymentIntent, StripeEvent,
};
pub use service::{PaymentProvider, StripePaymentService};
