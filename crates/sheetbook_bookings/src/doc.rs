// --- File: crates/sheetbook_bookings/src/doc.rs ---
#![allow(dead_code)]
#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::models::{
    BookingDetails, BookingDetailsQuery, CheckoutResponse, ConfirmRequest, ConfirmationResponse,
    CreateCheckoutRequest, DirectBookingRequest, DirectBookingResponse, WebhookAck,
};

#[utoipa::path(
    post,
    path = "/create-checkout-session", // Path relative to /api
    request_body(content = CreateCheckoutRequest, example = json!({
        "eventId": "EVT-001",
        "eventName": "Wheel Throwing Taster",
        "customerName": "Sam Potter",
        "customerEmail": "sam@example.com",
        "skillLevel": "Beginner",
        "amount": 45,
        "addons": ["Apron hire"],
        "discountCode": "SPRING5",
        "discountAmount": 5
    })),
    responses(
        (status = 200, description = "Checkout session created", body = CheckoutResponse),
        (status = 400, description = "Invalid input or event fully booked"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Stripe or spreadsheet failure")
    ),
    tag = "Bookings"
)]
fn doc_create_checkout_session_handler() {}

#[utoipa::path(
    post,
    path = "/webhook", // Path relative to /api
    request_body(content = ConfirmRequest, description = "Client confirmation body, or a signed Stripe event when the Stripe-Signature header is present"),
    params(("Stripe-Signature" = Option<String>, Header, description = "Stripe webhook signature")),
    responses(
        (status = 200, description = "Payment confirmed (or event ignored)", body = ConfirmationResponse),
        (status = 400, description = "Bad payload, bad signature or unpaid session"),
        (status = 500, description = "Stripe or spreadsheet failure; Stripe will retry")
    ),
    tag = "Bookings"
)]
fn doc_webhook_handler() {}

#[utoipa::path(
    get,
    path = "/booking-details", // Path relative to /api
    params(BookingDetailsQuery),
    responses(
        (status = 200, description = "Booking joined with its event", body = BookingDetails),
        (status = 400, description = "Neither session_id nor booking_id given"),
        (status = 404, description = "Booking or event not found"),
        (status = 500, description = "Stripe or spreadsheet failure")
    ),
    tag = "Bookings"
)]
fn doc_booking_details_handler() {}

#[utoipa::path(
    post,
    path = "/create-direct-booking", // Path relative to /api
    request_body = DirectBookingRequest,
    responses(
        (status = 200, description = "Booking recorded", body = DirectBookingResponse),
        (status = 400, description = "Invalid input or event fully booked"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Spreadsheet failure")
    ),
    tag = "Bookings"
)]
fn doc_create_direct_booking_handler() {}

#[utoipa::path(
    get,
    path = "/health", // Path relative to /api
    responses((status = 200, description = "Service is up")),
    tag = "Bookings"
)]
fn doc_health_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_create_checkout_session_handler,
        doc_webhook_handler,
        doc_booking_details_handler,
        doc_create_direct_booking_handler,
        doc_health_handler,
    ),
    components(
        schemas(
            CreateCheckoutRequest,
            CheckoutResponse,
            ConfirmRequest,
            ConfirmationResponse,
            WebhookAck,
            BookingDetails,
            DirectBookingRequest,
            DirectBookingResponse,
        )
    ),
    tags(
        (name = "Bookings", description = "Checkout, confirmation and booking details")
    )
)]
pub struct BookingApiDoc;
