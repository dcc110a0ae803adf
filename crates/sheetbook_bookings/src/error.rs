// --- File: crates/sheetbook_bookings/src/error.rs ---
use axum::response::{IntoResponse, Response};
use sheetbook_common::{internal_error, not_found, validation_error, HttpStatusCode, ServiceError};
use sheetbook_sheets::SheetError;
use sheetbook_stripe::StripeError;
use thiserror::Error;
use tracing::{error, warn};

/// Booking flow errors.
#[derive(Error, Debug)]
pub enum BookingError {
    /// Malformed or incomplete request input
    #[error("{0}")]
    Validation(String),

    /// The checkout session exists but has not been paid
    #[error("Payment not completed for {0}")]
    PaymentIncomplete(String),

    /// The event has no spots left
    #[error("Event {0} is fully booked")]
    CapacityExhausted(String),

    /// A paid payment that carries neither an event nor a booking id
    #[error("Payment {0} carries no booking details")]
    NotABooking(String),

    #[error("Booking not found for {0}")]
    BookingNotFound(String),

    #[error("Event {0} not found")]
    EventNotFound(String),

    /// Confirmation expected a pending row written at checkout
    #[error("No pending booking row for payment {0}")]
    MissingPendingRow(String),

    /// Payment provider failure
    #[error(transparent)]
    Provider(#[from] StripeError),

    /// Row store failure
    #[error(transparent)]
    Store(#[from] SheetError),
}

impl From<BookingError> for ServiceError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => validation_error(msg),
            BookingError::PaymentIncomplete(_)
            | BookingError::CapacityExhausted(_)
            | BookingError::NotABooking(_) => {
                validation_error(err)
            }
            BookingError::BookingNotFound(_) | BookingError::EventNotFound(_) => not_found(err),
            // 5xx so the provider redelivers the webhook
            BookingError::MissingPendingRow(_) => internal_error(err),
            BookingError::Provider(e) => e.into(),
            BookingError::Store(e) => e.into(),
        }
    }
}

impl HttpStatusCode for BookingError {
    fn status_code(&self) -> u16 {
        match self {
            BookingError::Validation(_)
            | BookingError::PaymentIncomplete(_)
            | BookingError::CapacityExhausted(_)
            | BookingError::NotABooking(_) => 400,
            BookingError::BookingNotFound(_) | BookingError::EventNotFound(_) => 404,
            BookingError::MissingPendingRow(_) => 500,
            BookingError::Provider(e) => e.status_code(),
            BookingError::Store(e) => e.status_code(),
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status >= 500 {
            error!("Request failed ({}): {}", status, self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }
        ServiceError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_taxonomy_status_codes() {
        let cases: Vec<(BookingError, StatusCode)> = vec![
            (BookingError::Validation("Missing eventId".into()), StatusCode::BAD_REQUEST),
            (BookingError::PaymentIncomplete("cs_1".into()), StatusCode::BAD_REQUEST),
            (BookingError::CapacityExhausted("E1".into()), StatusCode::BAD_REQUEST),
            (BookingError::NotABooking("pi_1".into()), StatusCode::BAD_REQUEST),
            (BookingError::BookingNotFound("cs_1".into()), StatusCode::NOT_FOUND),
            (BookingError::EventNotFound("E1".into()), StatusCode::NOT_FOUND),
            (BookingError::MissingPendingRow("pi_1".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                StripeError::ApiError {
                    status_code: 404,
                    message: "No such checkout.session".into(),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                SheetError::ColumnNotFound {
                    sheet: "Events".into(),
                    column: "Spots Remaining".into(),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                SheetError::WriteError {
                    target: "Bookings".into(),
                    message: "quota".into(),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected.as_u16(), "{err}");
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
