
use fixtures::*;
use sheetbook_bookings::BookingError;
use sheetbook_common::HttpStatusCode;
use sheetbook_config::{LookupKeys, WriteMode};
use sheetbook_stripe::PaymentIntent;

#[tokio::test]
async fn test_append_mode_records_booking_and_takes_a_spot() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_session(paid_session("cs_test_a", "pi_a", "EVT-001"));
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments.clone(), &config).await;

    let response = service.confirm_payment("cs_test_a").await.unwrap();

    assert!(response.success);
    assert!(!response.already_confirmed);
    assert_eq!(response.session_id.as_deref(), Some("cs_test_a"));
    assert_eq!(response.payment_intent_id.as_deref(), Some("pi_a"));
    assert_eq!(response.booking_id.as_deref(), Some("BK-0000ABCD"));
    assert_eq!(response.spots_remaining, Some(2));

    let rows = bookings(&store);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), BOOKINGS_HEADER.len());
    assert_eq!(rows[0][COL_EVENT_ID], "EVT-001");
    assert_eq!(rows[0][COL_AMOUNT], "40.00");
    assert_eq!(rows[0][COL_REFERENCE], "pi_a");
    assert_eq!(rows[0][COL_STATUS], "Confirmed");
    assert_eq!(rows[0][COL_EVENT_LOCATION], "The Studio, 4 Kiln Lane");
    assert_eq!(spots_remaining(&store, "EVT-001"), "2");
}

#[tokio::test]
async fn test_repeated_confirmation_is_idempotent() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_session(paid_session("cs_test_a", "pi_a", "EVT-001"));
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments.clone(), &config).await;

    service.confirm_payment("cs_test_a").await.unwrap();
    let again = service.confirm_payment("cs_test_a").await.unwrap();
    // The webhook for the payment intent finds the same row.
    let by_intent = service.confirm_payment("pi_a").await.unwrap();

    assert!(again.already_confirmed);
    assert!(by_intent.already_confirmed);
    assert_eq!(by_intent.booking_id.as_deref(), Some("BK-0000ABCD"));
    assert_eq!(bookings(&store).len(), 1);
    assert_eq!(spots_remaining(&store, "EVT-001"), "2");
}

#[tokio::test]
async fn test_unpaid_session_is_rejected_without_writes() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    let mut session = paid_session("cs_test_open", "pi_open", "EVT-001");
    session.payment_status = Some("unpaid".to_string());
    payments.insert_session(session);
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments, &config).await;

    let err = service.confirm_payment("cs_test_open").await.unwrap_err();

    assert!(matches!(err, BookingError::PaymentIncomplete(_)));
    assert_eq!(err.status_code(), 400);
    assert!(bookings(&store).is_empty());
    assert_eq!(spots_remaining(&store, "EVT-001"), "3");
}

#[tokio::test]
async fn test_update_mode_flips_pending_row() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_session(paid_session("cs_test_p", "pi_p", "EVT-001"));
    seed_booking(&store, "BK-PENDING1", "EVT-001", "Wheel Throwing Taster", "cs_test_p", "").await;
    let config = create_test_config(WriteMode::UpdateExisting, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments, &config).await;

    let response = service.confirm_payment("cs_test_p").await.unwrap();

    assert_eq!(response.booking_id.as_deref(), Some("BK-PENDING1"));
    assert_eq!(response.spots_remaining, Some(2));
    let rows = bookings(&store);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][COL_STATUS], "Confirmed");
    assert_eq!(rows[0][COL_REFERENCE], "cs_test_p");
}

#[tokio::test]
async fn test_update_mode_without_pending_row_fails() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_session(paid_session("cs_test_lost", "pi_lost", "EVT-001"));
    let config = create_test_config(WriteMode::UpdateExisting, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments, &config).await;

    let err = service.confirm_payment("cs_test_lost").await.unwrap_err();

    assert!(matches!(err, BookingError::MissingPendingRow(ref id) if id == "pi_lost"));
    assert_eq!(err.status_code(), 500);
    assert!(bookings(&store).is_empty());
}

#[tokio::test]
async fn test_intent_after_session_finds_row_by_booking_id() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    let session = paid_session("cs_test_a", "pi_a", "EVT-001");
    payments.insert_intent(succeeded_intent(&session));
    payments.insert_session(session);
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOnly);
    let service = build_service(store.clone(), payments, &config).await;

    service.confirm_payment("cs_test_a").await.unwrap();
    let by_intent = service.confirm_payment("pi_a").await.unwrap();

    assert!(by_intent.already_confirmed);
    assert_eq!(by_intent.booking_id.as_deref(), Some("BK-0000ABCD"));
    let rows = bookings(&store);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][COL_REFERENCE], "cs_test_a");
    assert_eq!(spots_remaining(&store, "EVT-001"), "2");
}

#[tokio::test]
async fn test_update_mode_intent_after_session_is_already_confirmed() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    let session = paid_session("cs_test_p", "pi_p", "EVT-001");
    payments.insert_intent(succeeded_intent(&session));
    payments.insert_session(session);
    seed_booking(&store, "BK-0000ABCD", "EVT-001", "Wheel Throwing Taster", "cs_test_p", "").await;
    let config = create_test_config(WriteMode::UpdateExisting, LookupKeys::SessionOnly);
    let service = build_service(store.clone(), payments, &config).await;

    let by_session = service.confirm_payment("cs_test_p").await.unwrap();
    let by_intent = service.confirm_payment("pi_p").await.unwrap();

    assert!(!by_session.already_confirmed);
    assert!(by_intent.already_confirmed);
    assert_eq!(by_intent.booking_id.as_deref(), Some("BK-0000ABCD"));
    let rows = bookings(&store);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][COL_STATUS], "Confirmed");
    assert_eq!(spots_remaining(&store, "EVT-001"), "2");
}

#[tokio::test]
async fn test_update_mode_intent_first_confirms_pending_row() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    let session = paid_session("cs_test_p", "pi_p", "EVT-001");
    payments.insert_intent(succeeded_intent(&session));
    payments.insert_session(session);
    seed_booking(&store, "BK-0000ABCD", "EVT-001", "Wheel Throwing Taster", "cs_test_p", "").await;
    let config = create_test_config(WriteMode::UpdateExisting, LookupKeys::SessionOnly);
    let service = build_service(store.clone(), payments, &config).await;

    let by_intent = service.confirm_payment("pi_p").await.unwrap();
    let by_session = service.confirm_payment("cs_test_p").await.unwrap();

    assert!(!by_intent.already_confirmed);
    assert_eq!(by_intent.spots_remaining, Some(2));
    assert!(by_session.already_confirmed);
    assert_eq!(bookings(&store)[0][COL_STATUS], "Confirmed");
    assert_eq!(spots_remaining(&store, "EVT-001"), "2");
}

#[tokio::test]
async fn test_direct_booking_marker_cannot_be_confirmed() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    seed_booking(&store, "BK-DIRECT01", "EVT-001", "Wheel Throwing Taster", "DIRECT_BOOKING", "Confirmed").await;
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store, payments.clone(), &config).await;

    let err = service.confirm_payment("DIRECT_BOOKING").await.unwrap_err();

    assert!(matches!(err, BookingError::Validation(_)));
    assert_eq!(payments.calls(), 0);
}

#[tokio::test]
async fn test_payment_without_booking_metadata_is_not_a_booking() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_intent(PaymentIntent {
        id: "pi_invoice".to_string(),
        status: Some("succeeded".to_string()),
        amount: Some(1200),
        ..Default::default()
    });
    let config = create_test_config(WriteMode::UpdateExisting, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments, &config).await;

    let err = service.confirm_payment("pi_invoice").await.unwrap_err();

    assert!(matches!(err, BookingError::NotABooking(ref id) if id == "pi_invoice"));
    assert_eq!(err.status_code(), 400);
    assert!(bookings(&store).is_empty());
}

#[tokio::test]
async fn test_session_only_lookup_ignores_intent_reference() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_session(paid_session("cs_test_s", "pi_s", "EVT-001"));
    // A row keyed by the payment intent is invisible to session-only lookups.
    seed_booking(&store, "BK-OTHER001", "EVT-001", "Wheel Throwing Taster", "pi_s", "Confirmed").await;
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOnly);
    let service = build_service(store.clone(), payments, &config).await;

    let response = service.confirm_payment("cs_test_s").await.unwrap();

    assert!(!response.already_confirmed);
    let rows = bookings(&store);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][COL_REFERENCE], "cs_test_s");
}

#[tokio::test]
async fn test_payment_intent_confirmation_uses_intent_metadata() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_intent(PaymentIntent {
        id: "pi_direct".to_string(),
        status: Some("succeeded".to_string()),
        amount: Some(4500),
        amount_received: Some(4500),
        currency: Some("gbp".to_string()),
        receipt_email: Some("receipt@example.com".to_string()),
        metadata: [("eventId", "EVT-001"), ("customerName", "Alex Clay")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    });
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments, &config).await;

    let response = service.confirm_payment("pi_direct").await.unwrap();

    assert!(response.session_id.is_none());
    assert_eq!(response.payment_intent_id.as_deref(), Some("pi_direct"));
    let rows = bookings(&store);
    assert_eq!(rows.len(), 1);
    assert!(rows[0][COL_BOOKING_ID].starts_with("BK-"));
    assert_eq!(rows[0][COL_AMOUNT], "45.00");
    assert_eq!(rows[0][5], "receipt@example.com");
    assert_eq!(rows[0][COL_REFERENCE], "pi_direct");
}

#[tokio::test]
async fn test_incomplete_payment_intent_is_rejected() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_intent(PaymentIntent {
        id: "pi_processing".to_string(),
        status: Some("processing".to_string()),
        metadata: [("eventId".to_string(), "EVT-001".to_string())].into_iter().collect(),
        ..Default::default()
    });
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments, &config).await;

    let err = service.confirm_payment("pi_processing").await.unwrap_err();

    assert!(matches!(err, BookingError::PaymentIncomplete(_)));
    assert!(bookings(&store).is_empty());
}

#[tokio::test]
async fn test_capacity_failure_does_not_fail_confirmation() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_session(paid_session("cs_test_gone", "pi_gone", "EVT-GONE"));
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments, &config).await;

    let response = service.confirm_payment("cs_test_gone").await.unwrap();

    assert!(response.success);
    assert_eq!(response.spots_remaining, None);
    assert_eq!(bookings(&store).len(), 1);
}

#[tokio::test]
async fn test_sold_out_event_floors_at_zero() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_session(paid_session("cs_test_late", "pi_late", "EVT-FULL"));
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments, &config).await;

    let response = service.confirm_payment("cs_test_late").await.unwrap();

    assert_eq!(response.spots_remaining, Some(0));
    assert_eq!(spots_remaining(&store, "EVT-FULL"), "0");
}

#[tokio::test]
async fn test_store_write_failure_surfaces() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    payments.insert_session(paid_session("cs_test_w", "pi_w", "EVT-001"));
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store.clone(), payments, &config).await;
    store.set_fail_writes(true);

    let err = service.confirm_payment("cs_test_w").await.unwrap_err();

    assert!(matches!(err, BookingError::Store(_)));
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_provider_errors_pass_through() {
    let store = seeded_store();
    let payments = FakePaymentProvider::new();
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(store, payments, &config).await;

    let err = service.confirm_payment("cs_test_missing").await.unwrap_err();

    assert_eq!(err.to_string(), "No such checkout.session: 'cs_test_missing'");
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_blank_identifier_is_rejected() {
    let payments = FakePaymentProvider::new();
    let config = create_test_config(WriteMode::AppendNew, LookupKeys::SessionOrIntent);
    let service = build_service(seeded_store(), payments.clone(), &config).await;

    let err = service.confirm_payment("  ").await.unwrap_err();

    assert!(matches!(err, BookingError::Validation(_)));
    assert_eq!(payments.calls(), 0);
}
