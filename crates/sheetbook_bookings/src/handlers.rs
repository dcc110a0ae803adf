// --- File: crates/sheetbook_bookings/src/handlers.rs ---
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::info;

use crate::error::BookingError;
use crate::logic::BookingService;
use crate::models::{
    BookingDetails, BookingDetailsQuery, CheckoutResponse, ConfirmRequest, CreateCheckoutRequest,
    DirectBookingRequest, DirectBookingResponse, WebhookAck,
};

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Events whose object identifies a payment to confirm.
const CONFIRMING_EVENTS: [&str; 2] = ["checkout.session.completed", "payment_intent.succeeded"];

#[derive(Clone)]
pub struct BookingState {
    pub service: Arc<BookingService>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, BookingError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| BookingError::Validation(format!("Invalid request body: {}", rejection.body_text())))
}

pub async fn create_checkout_session_handler(
    State(state): State<Arc<BookingState>>,
    payload: Result<Json<CreateCheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, BookingError> {
    let request = json_body(payload)?;
    state.service.create_checkout(request).await.map(Json)
}

/// Confirmation entry point for both Stripe webhooks and the success page.
///
/// Requests carrying a `Stripe-Signature` header must verify against the
/// webhook secret; anything else is treated as a client confirmation.
/// Signed events for payments without booking metadata are acknowledged
/// as ignored.
pub async fn webhook_handler(
    State(state): State<Arc<BookingState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, BookingError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok());

    let identifier = match signature {
        Some(signature) => {
            let event = state.service.payments().verify_webhook(&body, Some(signature))?;
            if !CONFIRMING_EVENTS.contains(&event.event_type.as_str()) {
                info!("Ignoring Stripe event {} ({})", event.id, event.event_type);
                return Ok(Json(WebhookAck {
                    success: true,
                    ignored: true,
                })
                .into_response());
            }
            info!("Stripe event {} ({}) verified", event.id, event.event_type);
            event.object_id().map(str::to_string).ok_or_else(|| {
                BookingError::Validation(format!("Event {} has no object id", event.id))
            })?
        }
        None => {
            let request: ConfirmRequest = serde_json::from_slice(&body)
                .map_err(|e| BookingError::Validation(format!("Invalid request body: {}", e)))?;
            request
                .session_id
                .ok_or_else(|| BookingError::Validation("Missing sessionId".to_string()))?
        }
    };

    match state.service.confirm_payment(&identifier).await {
        Ok(confirmation) => Ok(Json(confirmation).into_response()),
        // Payments made outside the booking flow are not ours to retry.
        Err(BookingError::NotABooking(id)) if signature.is_some() => {
            info!("Payment {} is not a booking; acknowledging", id);
            Ok(Json(WebhookAck {
                success: true,
                ignored: true,
            })
            .into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn booking_details_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<BookingDetailsQuery>,
) -> Result<Json<BookingDetails>, BookingError> {
    state.service.booking_details(query).await.map(Json)
}

pub async fn create_direct_booking_handler(
    State(state): State<Arc<BookingState>>,
    payload: Result<Json<DirectBookingRequest>, JsonRejection>,
) -> Result<Json<DirectBookingResponse>, BookingError> {
    let request = json_body(payload)?;
    state.service.create_direct_booking(request).await.map(Json)
}

/// CORS preflight.
pub async fn options_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
