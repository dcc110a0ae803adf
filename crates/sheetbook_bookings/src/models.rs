// --- File: crates/sheetbook_bookings/src/models.rs ---
use serde::{Deserialize, Deserializer, Serialize};
use sheetbook_sheets::{FoundRow, ResolvedTable, TableSchema};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// Header names of the bookings and events tabs.
pub mod columns {
    pub const BOOKING_ID: &str = "Booking ID";
    pub const BOOKING_DATE: &str = "Booking Date";
    pub const EVENT_ID: &str = "Event ID";
    pub const EVENT_NAME: &str = "Event Name";
    pub const CUSTOMER_NAME: &str = "Customer Name";
    pub const CUSTOMER_EMAIL: &str = "Customer Email";
    pub const AMOUNT_PAID: &str = "Amount Paid";
    pub const ADDONS: &str = "Add-ons Selected";
    pub const PAYMENT_REFERENCE: &str = "Payment Reference";
    pub const STATUS: &str = "Status";
    pub const SKILL_LEVEL: &str = "Skill Level";
    pub const EVENT_DATE: &str = "Event Date";
    pub const EVENT_TIME: &str = "Event Time";
    pub const EVENT_LOCATION: &str = "Event Location";

    pub const DESCRIPTION: &str = "Description";
    pub const DATE: &str = "Date";
    pub const TIME: &str = "Time";
    pub const LOCATION: &str = "Location";
    pub const TOTAL_SPOTS: &str = "Total Spots";
    pub const SPOTS_REMAINING: &str = "Spots Remaining";
}

use columns::*;

pub fn bookings_schema(sheet: &str) -> TableSchema {
    TableSchema::new(sheet)
        .required(BOOKING_ID)
        .required(BOOKING_DATE)
        .required(EVENT_ID)
        .required(EVENT_NAME)
        .required(CUSTOMER_NAME)
        .required(CUSTOMER_EMAIL)
        .required(AMOUNT_PAID)
        .required(ADDONS)
        .required(PAYMENT_REFERENCE)
        .required(STATUS)
        .optional(SKILL_LEVEL)
        .optional(EVENT_DATE)
        .optional(EVENT_TIME)
        .optional(EVENT_LOCATION)
}

pub fn events_schema(sheet: &str) -> TableSchema {
    TableSchema::new(sheet)
        .required(EVENT_ID)
        .optional(EVENT_NAME)
        .optional(DESCRIPTION)
        .optional(DATE)
        .optional(TIME)
        .optional(LOCATION)
        .optional(TOTAL_SPOTS)
        .required(SPOTS_REMAINING)
}

// --- Ledger records ---

/// A row of the bookings tab.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub row_number: usize,
    pub booking_id: String,
    pub booking_date: Option<String>,
    pub event_id: String,
    pub event_name: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub amount_paid: Option<String>,
    pub addons: Option<String>,
    pub payment_reference: String,
    pub status: Option<String>,
    pub skill_level: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub event_location: Option<String>,
}

impl BookingRecord {
    pub fn from_row(table: &ResolvedTable, row: &FoundRow) -> Self {
        let text = |column| table.value(row, column).map(str::to_string);
        Self {
            row_number: row.row_number,
            booking_id: text(BOOKING_ID).unwrap_or_default(),
            booking_date: text(BOOKING_DATE),
            event_id: text(EVENT_ID).unwrap_or_default(),
            event_name: text(EVENT_NAME),
            customer_name: text(CUSTOMER_NAME),
            customer_email: text(CUSTOMER_EMAIL),
            amount_paid: text(AMOUNT_PAID),
            addons: text(ADDONS),
            payment_reference: text(PAYMENT_REFERENCE).unwrap_or_default(),
            status: text(STATUS),
            skill_level: text(SKILL_LEVEL),
            event_date: text(EVENT_DATE),
            event_time: text(EVENT_TIME),
            event_location: text(EVENT_LOCATION),
        }
    }
}

/// A row of the events tab.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub row_number: usize,
    pub event_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub total_spots: Option<i64>,
    /// Blank or non-numeric cells read as 0.
    pub spots_remaining: i64,
}

impl EventRecord {
    pub fn from_row(table: &ResolvedTable, row: &FoundRow) -> Self {
        let text = |column| table.value(row, column).map(str::to_string);
        Self {
            row_number: row.row_number,
            event_id: text(EVENT_ID).unwrap_or_default(),
            name: text(EVENT_NAME),
            description: text(DESCRIPTION),
            date: text(DATE),
            time: text(TIME),
            location: text(LOCATION),
            total_spots: table
                .value(row, TOTAL_SPOTS)
                .and_then(|v| v.trim().parse().ok()),
            spots_remaining: sheetbook_sheets::store::parse_count(table.value(row, SPOTS_REMAINING)),
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.spots_remaining > 0
    }
}

/// A booking about to be appended.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewBooking {
    pub booking_id: String,
    pub booking_date: String,
    pub event_id: String,
    pub event_name: String,
    pub customer_name: String,
    pub customer_email: String,
    pub amount_paid: String,
    pub addons: String,
    pub payment_reference: String,
    pub status: String,
    pub skill_level: String,
    pub event_date: String,
    pub event_time: String,
    pub event_location: String,
}

impl NewBooking {
    pub fn cells(&self) -> Vec<(&'static str, String)> {
        vec![
            (BOOKING_ID, self.booking_id.clone()),
            (BOOKING_DATE, self.booking_date.clone()),
            (EVENT_ID, self.event_id.clone()),
            (EVENT_NAME, self.event_name.clone()),
            (CUSTOMER_NAME, self.customer_name.clone()),
            (CUSTOMER_EMAIL, self.customer_email.clone()),
            (AMOUNT_PAID, self.amount_paid.clone()),
            (ADDONS, self.addons.clone()),
            (PAYMENT_REFERENCE, self.payment_reference.clone()),
            (STATUS, self.status.clone()),
            (SKILL_LEVEL, self.skill_level.clone()),
            (EVENT_DATE, self.event_date.clone()),
            (EVENT_TIME, self.event_time.clone()),
            (EVENT_LOCATION, self.event_location.clone()),
        ]
    }
}

/// `BK-` followed by 8 uppercase hex characters.
pub fn new_booking_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("BK-{}", id[..8].to_uppercase())
}

/// Major currency units with two decimals, e.g. `4500` -> `"45.00"`.
pub fn format_minor_amount(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

pub fn format_amount(major: f64) -> String {
    format!("{:.2}", major)
}

/// Accepts `45`, `45.5` or `"45.50"` (optionally with a leading `£`).
/// Unparseable strings become `None`.
fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().trim_start_matches('£').trim().parse().ok(),
        None => None,
    })
}

// --- HTTP payloads ---

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateCheckoutRequest {
    #[cfg_attr(feature = "openapi", schema(example = "EVT-001"))]
    pub event_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "Wheel Throwing Taster"))]
    pub event_name: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub skill_level: Option<String>,
    /// Major units before discount.
    #[serde(default, deserialize_with = "lenient_amount")]
    #[cfg_attr(feature = "openapi", schema(example = 45.0))]
    pub amount: Option<f64>,
    #[serde(default)]
    pub addons: Vec<String>,
    pub discount_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub discount_amount: Option<f64>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CheckoutResponse {
    #[cfg_attr(feature = "openapi", schema(example = "https://checkout.stripe.com/c/pay/cs_test_a1..."))]
    pub url: String,
    #[cfg_attr(feature = "openapi", schema(example = "cs_test_a1..."))]
    pub session_id: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DirectBookingRequest {
    pub event_id: Option<String>,
    pub event_name: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub skill_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub addons: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DirectBookingResponse {
    pub success: bool,
    #[cfg_attr(feature = "openapi", schema(example = "BK-1A2B3C4D"))]
    pub booking_id: String,
    pub redirect_url: String,
}

/// Client-side confirmation body posted to the webhook endpoint.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ConfirmRequest {
    #[serde(alias = "session_id", alias = "paymentIntentId", alias = "payment_intent_id")]
    #[cfg_attr(feature = "openapi", schema(example = "cs_test_a1..."))]
    pub session_id: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ConfirmationResponse {
    pub success: bool,
    pub session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub event_id: Option<String>,
    pub booking_id: Option<String>,
    /// `null` when the capacity update did not go through.
    pub spots_remaining: Option<i64>,
    pub already_confirmed: bool,
}

/// Acknowledgement for webhook events that need no action.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WebhookAck {
    pub success: bool,
    pub ignored: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct BookingDetailsQuery {
    #[cfg_attr(feature = "openapi", param(example = "cs_test_a1..."))]
    pub session_id: Option<String>,
    #[cfg_attr(feature = "openapi", param(example = "BK-1A2B3C4D"))]
    pub booking_id: Option<String>,
}

/// Booking joined with its event, as shown on the confirmation page.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookingDetails {
    pub booking_id: String,
    pub event_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    /// RFC 3339, UTC.
    pub start_time: String,
    pub end_time: String,
    pub booking_date: Option<String>,
    pub amount_paid: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub status: Option<String>,
    pub addons: Option<String>,
    pub skill_level: Option<String>,
    pub payment_reference: String,
    pub spots_remaining: i64,
    pub total_spots: Option<i64>,
}
