// --- File: crates/sheetbook_bookings/src/routes.rs ---
use std::sync::Arc;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{
    booking_details_handler, create_checkout_session_handler, create_direct_booking_handler,
    health_handler, options_handler, webhook_handler, BookingState,
};
use crate::logic::BookingService;

/// Creates a router containing all booking endpoints.
///
/// Other methods on these paths answer 405.
pub fn routes(service: Arc<BookingService>) -> Router {
    let state = Arc::new(BookingState { service });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route(
            "/create-checkout-session",
            post(create_checkout_session_handler).options(options_handler),
        )
        .route("/webhook", post(webhook_handler).options(options_handler))
        .route(
            "/booking-details",
            get(booking_details_handler).options(options_handler),
        )
        .route(
            "/create-direct-booking",
            post(create_direct_booking_handler).options(options_handler),
        )
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(cors)
}
