
use chrono::{Duration, Utc};
use fixtures::*;
use sheetbook_bookings::models::BookingDetailsQuery;
use sheetbook_bookings::BookingError;
use sheetbook_common::HttpStatusCode;
use sheetbook_config::{LookupKeys, WriteMode};

fn by_session(id: &str) -> BookingDetailsQuery {
    BookingDetailsQuery {
        session_id: Some(id.to_string()),
        booking_id: None,
    }
}

fn by_booking(id: &str) -> BookingDetailsQuery {
    BookingDetailsQuery {
        session_id: None,
        booking_id: Some(id.to_string()),
    }
}

#[tokio::test]
async fn test_details_join_booking_and_event() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_session(paid_session("cs_test_d", "pi_d", "EVT-001"));
    seed_booking(&store, "BK-DETAIL01", "EVT-001", "Wheel Throwing Taster", "pi_d", "Confirmed").await;
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store, payments, &config).await;

    // The row is keyed by the payment intent; the session id still finds it.
    let details = service.booking_details(by_session("cs_test_d")).await.unwrap();

    assert_eq!(details.booking_id, "BK-DETAIL01");
    assert_eq!(details.title, "Wheel Throwing Taster");
    assert_eq!(details.description, "Two hours on the wheel");
    assert_eq!(details.location, "The Studio, 4 Kiln Lane");
    assert_eq!(details.start_time, "2025-03-15T18:30:00Z");
    assert_eq!(details.end_time, "2025-03-15T20:30:00Z");
    assert_eq!(details.status.as_deref(), Some("Confirmed"));
    assert_eq!(details.spots_remaining, 3);
    assert_eq!(details.total_spots, Some(8));
}

#[tokio::test]
async fn test_details_by_booking_id_skip_stripe() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    seed_booking(&store, "BK-DIRECT01", "EVT-001", "Wheel Throwing Taster", "DIRECT_BOOKING", "Confirmed").await;
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store, payments.clone(), &config).await;

    let details = service.booking_details(by_booking("BK-DIRECT01")).await.unwrap();

    assert_eq!(details.payment_reference, "DIRECT_BOOKING");
    assert_eq!(payments.calls(), 0);
}

#[tokio::test]
async fn test_missing_event_fields_use_placeholders() {
    let store = seeded_store();
    seed_booking(&store, "BK-BARE0001", "EVT-BARE", "", "cs_test_bare", "Confirmed").await;
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOnly);
    let service = build_service(store, FakePaymentProvider::new(), &config).await;

    let details = service.booking_details(by_session("cs_test_bare")).await.unwrap();

    assert_eq!(details.title, "Event");
    assert_eq!(details.description, "Thank you for your booking.");
    assert_eq!(details.location, "Location to be confirmed");

    // No date or time on record: tomorrow at 10:00 UTC, two hours long.
    let tomorrow = (Utc::now() + Duration::days(1)).date_naive();
    assert!(
        details.start_time == format!("{}T10:00:00Z", tomorrow)
            || details.start_time == format!("{}T10:00:00Z", tomorrow + Duration::days(1)),
        "{}",
        details.start_time
    );
    assert!(details.end_time.ends_with("T12:00:00Z"));
}

#[tokio::test]
async fn test_unknown_booking_is_not_found() {
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(seeded_store(), FakePaymentProvider::new(), &config).await;

    let err = service.booking_details(by_booking("BK-NOPE0000")).await.unwrap_err();

    assert!(matches!(err, BookingError::BookingNotFound(_)));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_direct_booking_marker_is_not_a_session() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    seed_booking(&store, "BK-DIRECT01", "EVT-001", "Wheel Throwing Taster", "DIRECT_BOOKING", "Confirmed").await;
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store, payments.clone(), &config).await;

    let err = service.booking_details(by_session("DIRECT_BOOKING")).await.unwrap_err();

    assert!(matches!(err, BookingError::BookingNotFound(_)));
    assert_eq!(err.status_code(), 404);
    assert_eq!(payments.calls(), 0);
}

#[tokio::test]
async fn test_booking_for_deleted_event_is_not_found() {
    let store = seeded_store();
    seed_booking(&store, "BK-ORPHAN01", "EVT-GONE", "Raku Night", "DIRECT_BOOKING", "Confirmed").await;
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store, FakePaymentProvider::new(), &config).await;

    let err = service.booking_details(by_booking("BK-ORPHAN01")).await.unwrap_err();

    assert!(matches!(err, BookingError::EventNotFound(ref id) if id == "EVT-GONE"));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_query_needs_an_identifier() {
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(seeded_store(), FakePaymentProvider::new(), &config).await;

    let err = service
        .booking_details(BookingDetailsQuery::default())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_unresolvable_session_still_matches_its_own_row() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.set_failing(true);
    seed_booking(&store, "BK-PENDING2", "EVT-001", "Wheel Throwing Taster", "cs_test_pending", "").await;
    let config = create_test_config(WriteMode::UpdateExisting, LookupKeys::SessionOrIntent);
    let service = build_service(store, payments.clone(), &config).await;

    let details = service.booking_details(by_session("cs_test_pending")).await.unwrap();

    assert_eq!(details.booking_id, "BK-PENDING2");
    assert_eq!(details.status, None);
    assert_eq!(payments.calls(), 1);
}
