// --- File: crates/sheetbook_bookings/src/logic.rs ---
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sheetbook_config::{AppConfig, LookupKeys, SiteConfig, WriteMode};
use sheetbook_stripe::{is_checkout_session_id, CheckoutSessionParams, PaymentProvider};
use tracing::{info, warn};

use crate::calendar::event_window;
use crate::error::BookingError;
use crate::ledger::Ledger;
use crate::models::{
    columns, format_amount, format_minor_amount, new_booking_id, BookingDetails,
    BookingDetailsQuery, BookingRecord, CheckoutResponse, ConfirmationResponse, CreateCheckoutRequest,
    DirectBookingRequest, DirectBookingResponse, EventRecord, NewBooking,
};
use crate::policy::{ConfirmationPolicy, ResolvedPayment};

pub const DEFAULT_TITLE: &str = "Event";
pub const DEFAULT_DESCRIPTION: &str = "Thank you for your booking.";
pub const DEFAULT_LOCATION: &str = "Location to be confirmed";

// Metadata keys carried on checkout sessions and their payment intents.
const META_BOOKING_ID: &str = "bookingId";
const META_EVENT_ID: &str = "eventId";
const META_EVENT_NAME: &str = "eventName";
const META_CUSTOMER_NAME: &str = "customerName";
const META_CUSTOMER_EMAIL: &str = "customerEmail";
const META_SKILL_LEVEL: &str = "skillLevel";
const META_ADDONS: &str = "addons";
const META_AMOUNT: &str = "amount";
const META_DISCOUNT_CODE: &str = "discountCode";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, BookingError> {
    non_empty(value.as_deref()).ok_or_else(|| BookingError::Validation(format!("Missing {}", field)))
}

fn valid_email(value: &Option<String>) -> Result<&str, BookingError> {
    let email = required(value, "customerEmail")?;
    if !email.contains('@') {
        return Err(BookingError::Validation(format!(
            "Invalid customerEmail: {}",
            email
        )));
    }
    Ok(email)
}

fn today() -> String {
    Utc::now().format("%d/%m/%Y").to_string()
}

/// Session or intent data for a payment with no row found by reference.
#[derive(Default)]
struct PaymentDetails {
    metadata: HashMap<String, String>,
    amount_minor: Option<i64>,
    fallback_email: Option<String>,
}

impl PaymentDetails {
    fn meta(&self, key: &str) -> Option<String> {
        non_empty(self.metadata.get(key).map(String::as_str)).map(str::to_string)
    }
}

enum Lookup {
    Row(BookingRecord),
    Missing(PaymentDetails),
}

/// Booking flows over the ledger and the payment provider.
pub struct BookingService {
    ledger: Ledger,
    payments: Arc<dyn PaymentProvider>,
    policy: ConfirmationPolicy,
    site: SiteConfig,
    currency: String,
}

impl BookingService {
    pub fn new(ledger: Ledger, payments: Arc<dyn PaymentProvider>, config: &AppConfig) -> Self {
        Self {
            ledger,
            payments,
            policy: ConfirmationPolicy::from(&config.confirmation),
            site: config.site.clone(),
            currency: config.stripe.currency.clone(),
        }
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    pub fn payments(&self) -> &Arc<dyn PaymentProvider> {
        &self.payments
    }

    fn site_url(&self, path: &str) -> String {
        format!("{}{}", self.site.base_url.trim_end_matches('/'), path)
    }

    async fn require_event(&self, event_id: &str) -> Result<EventRecord, BookingError> {
        let event = self
            .ledger
            .find_event(event_id)
            .await?
            .ok_or_else(|| BookingError::EventNotFound(event_id.to_string()))?;
        if !event.has_capacity() {
            return Err(BookingError::CapacityExhausted(event_id.to_string()));
        }
        Ok(event)
    }

    /// Creates a Stripe checkout session for one place on an event.
    pub async fn create_checkout(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutResponse, BookingError> {
        let event_id = required(&request.event_id, "eventId")?;
        let customer_name = required(&request.customer_name, "customerName")?;
        let customer_email = valid_email(&request.customer_email)?;
        let amount = request
            .amount
            .filter(|a| a.is_finite())
            .ok_or_else(|| BookingError::Validation("Missing or invalid amount".to_string()))?;
        let discount = request.discount_amount.filter(|d| d.is_finite()).unwrap_or(0.0).max(0.0);
        let total = amount - discount;
        let unit_amount = (total * 100.0).round() as i64;
        if unit_amount <= 0 {
            return Err(BookingError::Validation(
                "Amount must be greater than zero".to_string(),
            ));
        }

        let event = self.require_event(event_id).await?;
        let event_name = non_empty(request.event_name.as_deref())
            .or(event.name.as_deref())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();
        let booking_id = new_booking_id();
        let addons = request.addons.join(", ");
        let skill_level = non_empty(request.skill_level.as_deref()).unwrap_or_default();
        let amount_text = format_minor_amount(unit_amount);

        let mut metadata = vec![
            (META_BOOKING_ID.to_string(), booking_id.clone()),
            (META_EVENT_ID.to_string(), event_id.to_string()),
            (META_EVENT_NAME.to_string(), event_name.clone()),
            (META_CUSTOMER_NAME.to_string(), customer_name.to_string()),
            (META_CUSTOMER_EMAIL.to_string(), customer_email.to_string()),
            (META_SKILL_LEVEL.to_string(), skill_level.to_string()),
            (META_ADDONS.to_string(), addons.clone()),
            (META_AMOUNT.to_string(), amount_text.clone()),
        ];
        if let Some(code) = non_empty(request.discount_code.as_deref()) {
            metadata.push((META_DISCOUNT_CODE.to_string(), code.to_string()));
        }

        let params = CheckoutSessionParams {
            product_name: event_name.clone(),
            description: event.description.clone(),
            unit_amount,
            currency: self.currency.clone(),
            customer_email: customer_email.to_string(),
            success_url: format!(
                "{}?session_id={{CHECKOUT_SESSION_ID}}",
                self.site_url(&self.site.confirmation_path)
            ),
            cancel_url: self.site_url(&self.site.cancel_path),
            client_reference_id: Some(booking_id.clone()),
            metadata,
        };
        let session = self.payments.create_checkout_session(params).await?;
        let url = session.url.clone().unwrap_or_default();

        if self.policy.writes_pending_rows() {
            let pending = NewBooking {
                booking_id,
                booking_date: today(),
                event_id: event_id.to_string(),
                event_name,
                customer_name: customer_name.to_string(),
                customer_email: customer_email.to_string(),
                amount_paid: amount_text,
                addons,
                payment_reference: session.id.clone(),
                status: String::new(),
                skill_level: skill_level.to_string(),
                event_date: event.date.clone().unwrap_or_default(),
                event_time: event.time.clone().unwrap_or_default(),
                event_location: event.location.clone().unwrap_or_default(),
            };
            self.ledger.append_booking(&pending).await?;
        }

        info!("Checkout session {} created for event {}", session.id, event_id);
        Ok(CheckoutResponse {
            url,
            session_id: session.id,
        })
    }

    /// Resolves a checkout session id to its payment intent. Other ids are
    /// returned unchanged without contacting the provider.
    async fn resolve_paid(&self, id: &str) -> Result<ResolvedPayment, BookingError> {
        if !is_checkout_session_id(id) {
            return Ok(ResolvedPayment::unresolved(id));
        }
        let session = self.payments.retrieve_checkout_session(id).await?;
        if !session.is_paid() {
            return Err(BookingError::PaymentIncomplete(id.to_string()));
        }
        Ok(ResolvedPayment::from_session(id, session))
    }

    /// Marks the booking for a payment as confirmed and takes a spot from its event.
    ///
    /// Idempotent: a booking already in the confirmed status is left alone.
    pub async fn confirm_payment(&self, identifier: &str) -> Result<ConfirmationResponse, BookingError> {
        let id = identifier.trim();
        if id.is_empty() {
            return Err(BookingError::Validation("Missing sessionId".to_string()));
        }
        if id == self.policy.direct_booking_marker {
            return Err(BookingError::Validation(format!(
                "{} is not a payment reference",
                id
            )));
        }

        let payment = self.resolve_paid(id).await?;
        let (booking_id, event_id) = match self.locate(&payment).await? {
            Lookup::Row(booking) if self.policy.is_confirmed(booking.status.as_deref()) => {
                info!(
                    "Booking {} already confirmed (ref {}); nothing to do",
                    booking.booking_id, booking.payment_reference
                );
                return Ok(ConfirmationResponse {
                    success: true,
                    session_id: payment.session_id().map(str::to_string),
                    payment_intent_id: payment.payment_intent_id.clone(),
                    event_id: Some(booking.event_id),
                    booking_id: Some(booking.booking_id),
                    spots_remaining: None,
                    already_confirmed: true,
                });
            }
            Lookup::Row(booking) => {
                self.ledger
                    .set_booking_status(&booking, &self.policy.confirmed_status)
                    .await?;
                (booking.booking_id, booking.event_id)
            }
            Lookup::Missing(details) => match self.policy.write_mode {
                WriteMode::UpdateExisting => {
                    return Err(BookingError::MissingPendingRow(payment.canonical_id));
                }
                WriteMode::AppendNew => {
                    let booking = self.booking_from_details(&payment, details).await?;
                    self.ledger.append_booking(&booking).await?;
                    (booking.booking_id, booking.event_id)
                }
            },
        };

        let spots_remaining = self.decrement_best_effort(&event_id).await;
        Ok(ConfirmationResponse {
            success: true,
            session_id: payment.session_id().map(str::to_string),
            payment_intent_id: payment.payment_intent_id.clone(),
            event_id: Some(event_id),
            booking_id: Some(booking_id),
            spots_remaining,
            already_confirmed: false,
        })
    }

    /// Finds the row for a payment by its reference, then by the booking id
    /// in its metadata. The second lookup catches a session and its payment
    /// intent arriving separately when only one of them is stored on the row.
    async fn locate(&self, payment: &ResolvedPayment) -> Result<Lookup, BookingError> {
        let candidates = self.policy.lookup_candidates(payment);
        if let Some(booking) = self.ledger.find_booking_by_reference(&candidates).await? {
            return Ok(Lookup::Row(booking));
        }

        let details = self.payment_details(payment).await?;
        let booking_id = details.meta(META_BOOKING_ID);
        if booking_id.is_none() && details.meta(META_EVENT_ID).is_none() {
            return Err(BookingError::NotABooking(payment.raw_id.clone()));
        }
        if let Some(booking_id) = booking_id {
            if let Some(booking) = self.ledger.find_booking_by_id(&booking_id).await? {
                return Ok(Lookup::Row(booking));
            }
        }
        Ok(Lookup::Missing(details))
    }

    /// Capacity bookkeeping never fails the request that triggered it.
    async fn decrement_best_effort(&self, event_id: &str) -> Option<i64> {
        match self.ledger.decrement_capacity(event_id).await {
            Ok(remaining) => Some(remaining),
            Err(e) => {
                warn!("Could not update spots for event {}: {}", event_id, e);
                None
            }
        }
    }

    /// Metadata stored on the session, topped up from the payment intent
    /// when the session does not carry the event.
    async fn payment_details(&self, payment: &ResolvedPayment) -> Result<PaymentDetails, BookingError> {
        let mut details = PaymentDetails::default();

        if let Some(session) = &payment.session {
            details.metadata = session.metadata.clone();
            details.amount_minor = session.amount_total;
            details.fallback_email = session
                .customer_details
                .as_ref()
                .and_then(|d| d.email.clone())
                .or_else(|| session.customer_email.clone());
        }

        if !details.metadata.contains_key(META_EVENT_ID) {
            if let Some(pi_id) = payment.payment_intent_id.as_deref() {
                let intent = self.payments.retrieve_payment_intent(pi_id).await?;
                if !intent.is_succeeded() {
                    return Err(BookingError::PaymentIncomplete(pi_id.to_string()));
                }
                details.metadata.extend(intent.metadata);
                details.amount_minor = details
                    .amount_minor
                    .or(intent.amount_received)
                    .or(intent.amount);
                details.fallback_email = details.fallback_email.or(intent.receipt_email);
            }
        }
        Ok(details)
    }

    /// Builds the row for a payment that has no booking yet.
    async fn booking_from_details(
        &self,
        payment: &ResolvedPayment,
        details: PaymentDetails,
    ) -> Result<NewBooking, BookingError> {
        let event_id = details
            .meta(META_EVENT_ID)
            .ok_or_else(|| BookingError::NotABooking(payment.raw_id.clone()))?;

        let event = match self.ledger.find_event(&event_id).await {
            Ok(event) => event,
            Err(e) => {
                warn!("Event {} lookup failed; booking without snapshot: {}", event_id, e);
                None
            }
        };
        let snapshot = |field: fn(&EventRecord) -> Option<String>| {
            event.as_ref().and_then(field).unwrap_or_default()
        };

        Ok(NewBooking {
            booking_id: details.meta(META_BOOKING_ID).unwrap_or_else(new_booking_id),
            booking_date: today(),
            event_name: details
                .meta(META_EVENT_NAME)
                .or_else(|| event.as_ref().and_then(|e| e.name.clone()))
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            event_id,
            customer_name: details.meta(META_CUSTOMER_NAME).unwrap_or_default(),
            customer_email: details
                .meta(META_CUSTOMER_EMAIL)
                .or_else(|| details.fallback_email.clone())
                .unwrap_or_default(),
            amount_paid: details
                .amount_minor
                .map(format_minor_amount)
                .or_else(|| details.meta(META_AMOUNT))
                .unwrap_or_default(),
            addons: details.meta(META_ADDONS).unwrap_or_default(),
            payment_reference: self.policy.reference_for(payment),
            status: self.policy.confirmed_status.clone(),
            skill_level: details.meta(META_SKILL_LEVEL).unwrap_or_default(),
            event_date: snapshot(|e| e.date.clone()),
            event_time: snapshot(|e| e.time.clone()),
            event_location: snapshot(|e| e.location.clone()),
        })
    }

    /// Records a booking that bypasses payment.
    pub async fn create_direct_booking(
        &self,
        request: DirectBookingRequest,
    ) -> Result<DirectBookingResponse, BookingError> {
        let event_id = required(&request.event_id, "eventId")?;
        let customer_name = required(&request.customer_name, "customerName")?;
        let customer_email = valid_email(&request.customer_email)?;
        let amount = request.amount.unwrap_or(0.0);
        if !amount.is_finite() || amount < 0.0 {
            return Err(BookingError::Validation("Invalid amount".to_string()));
        }

        let event = self.require_event(event_id).await?;
        let booking = NewBooking {
            booking_id: new_booking_id(),
            booking_date: today(),
            event_id: event_id.to_string(),
            event_name: non_empty(request.event_name.as_deref())
                .or(event.name.as_deref())
                .unwrap_or(DEFAULT_TITLE)
                .to_string(),
            customer_name: customer_name.to_string(),
            customer_email: customer_email.to_string(),
            amount_paid: format_amount(amount),
            addons: request.addons.join(", "),
            payment_reference: self.policy.direct_booking_marker.clone(),
            status: self.policy.confirmed_status.clone(),
            skill_level: non_empty(request.skill_level.as_deref())
                .unwrap_or_default()
                .to_string(),
            event_date: event.date.clone().unwrap_or_default(),
            event_time: event.time.clone().unwrap_or_default(),
            event_location: event.location.clone().unwrap_or_default(),
        };
        self.ledger.append_booking(&booking).await?;
        self.decrement_best_effort(event_id).await;

        Ok(DirectBookingResponse {
            success: true,
            redirect_url: format!(
                "{}?booking_id={}",
                self.site_url(&self.site.confirmation_path),
                booking.booking_id
            ),
            booking_id: booking.booking_id,
        })
    }

    /// Lookup values for the details page. A provider failure only narrows
    /// the lookup to the identifier as given; unpaid sessions are still shown.
    async fn detail_candidates(&self, session_id: &str) -> Vec<String> {
        let payment = match self.policy.lookup_keys {
            LookupKeys::SessionOrIntent if is_checkout_session_id(session_id) => {
                match self.payments.retrieve_checkout_session(session_id).await {
                    Ok(session) => ResolvedPayment::from_session(session_id, session),
                    Err(e) => {
                        warn!("Could not resolve {} for booking details: {}", session_id, e);
                        ResolvedPayment::unresolved(session_id)
                    }
                }
            }
            _ => ResolvedPayment::unresolved(session_id),
        };
        self.policy.lookup_candidates(&payment)
    }

    /// Joins a booking with its event for the confirmation page.
    pub async fn booking_details(
        &self,
        query: BookingDetailsQuery,
    ) -> Result<BookingDetails, BookingError> {
        let session_id = non_empty(query.session_id.as_deref());
        let booking_id = non_empty(query.booking_id.as_deref());
        let (key, column) = match (session_id, booking_id) {
            // Every direct booking shares the marker as its reference.
            (Some(id), _) if id == self.policy.direct_booking_marker => {
                return Err(BookingError::BookingNotFound(id.to_string()))
            }
            (Some(id), _) => (id, columns::PAYMENT_REFERENCE),
            (None, Some(id)) => (id, columns::BOOKING_ID),
            (None, None) => {
                return Err(BookingError::Validation(
                    "Missing session_id or booking_id".to_string(),
                ))
            }
        };

        let candidates = async {
            if column == columns::PAYMENT_REFERENCE {
                Ok::<_, BookingError>(self.detail_candidates(key).await)
            } else {
                Ok(vec![key.to_string()])
            }
        };
        let bookings = async { self.ledger.read_bookings().await.map_err(BookingError::from) };
        let events = async { self.ledger.read_events().await.map_err(BookingError::from) };
        let (candidates, bookings, events) = tokio::try_join!(candidates, bookings, events)?;

        let booking = self
            .ledger
            .booking_in(&bookings, column, &candidates)?
            .ok_or_else(|| BookingError::BookingNotFound(key.to_string()))?;
        let event = self
            .ledger
            .event_in(&events, &booking.event_id)?
            .ok_or_else(|| BookingError::EventNotFound(booking.event_id.clone()))?;

        let window = event_window(
            event.date.as_deref().or(booking.event_date.as_deref()),
            event.time.as_deref().or(booking.event_time.as_deref()),
            Utc::now(),
        );

        Ok(BookingDetails {
            title: event
                .name
                .clone()
                .or_else(|| booking.event_name.clone())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: event
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            location: event
                .location
                .clone()
                .or_else(|| booking.event_location.clone())
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            start_time: window.start_rfc3339(),
            end_time: window.end_rfc3339(),
            spots_remaining: event.spots_remaining,
            total_spots: event.total_spots,
            booking_id: booking.booking_id,
            event_id: booking.event_id,
            booking_date: booking.booking_date,
            amount_paid: booking.amount_paid,
            customer_name: booking.customer_name,
            customer_email: booking.customer_email,
            status: booking.status,
            addons: booking.addons,
            skill_level: booking.skill_level,
            payment_reference: booking.payment_reference,
        })
    }
}
