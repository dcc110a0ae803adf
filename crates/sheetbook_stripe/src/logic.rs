// --- File: crates/sheetbook_stripe/src/logic.rs ---
use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sheetbook_common::HTTP_CLIENT;
use sheetbook_config::StripeConfig;
use tracing::{debug, error, info, warn};

use crate::error::StripeError;

/// Checkout Session ids start with this prefix; payment intents use `pi_`.
pub const CHECKOUT_SESSION_PREFIX: &str = "cs_";

/// Maximum age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECONDS: i64 = 600;

// --- Data Structures ---

/// Represents the `data` field within a Stripe Event.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeEventData {
    /// The object the event is about. Its shape depends on the event type.
    pub object: serde_json::Value,
}

/// Represents the outer Stripe Event object.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String, // e.g., "checkout.session.completed"
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub livemode: Option<bool>,
    pub data: StripeEventData,
}

impl StripeEvent {
    /// The `id` of the object the event carries.
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct StripeCustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// A Checkout Session as returned by `/v1/checkout/sessions`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>, // Payment Intent ID (pi_...)
    #[serde(default)]
    pub payment_status: Option<String>, // e.g., "paid", "unpaid", "no_payment_required"
    #[serde(default)]
    pub status: Option<String>, // e.g., "open", "complete", "expired"
    #[serde(default)]
    pub amount_total: Option<i64>, // minor units
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        matches!(
            self.payment_status.as_deref(),
            Some("paid") | Some("no_payment_required")
        )
    }
}

/// A Payment Intent as returned by `/v1/payment_intents/{id}`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>, // e.g., "succeeded", "processing"
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub amount_received: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub receipt_email: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status.as_deref() == Some("succeeded")
    }
}

/// What to charge for and where to send the customer afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionParams {
    pub product_name: String,
    pub description: Option<String>,
    /// Minor currency units (pence, cents).
    pub unit_amount: i64,
    pub currency: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub client_reference_id: Option<String>,
    /// Copied to both the session and its payment intent, in order.
    pub metadata: Vec<(String, String)>,
}

// --- Identifier helpers ---

pub fn is_checkout_session_id(id: &str) -> bool {
    id.starts_with(CHECKOUT_SESSION_PREFIX)
}

/// Stripe object ids are `prefix_` plus alphanumerics. Anything else is
/// rejected before it reaches a request path.
fn validate_object_id(id: &str) -> Result<(), StripeError> {
    let valid = !id.is_empty()
        && id.contains('_')
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StripeError::InvalidId(id.to_string()))
    }
}

fn api_url(config: &StripeConfig, path: &str) -> String {
    format!("{}/v1/{}", config.api_base.trim_end_matches('/'), path)
}

// --- Webhook Processing Logic ---

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"` keyed by the webhook secret.
pub fn compute_signature(secret: &str, timestamp: &str, payload: &[u8]) -> Result<String, StripeError> {
    let mac = signed_mac(secret, timestamp, payload)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn signed_mac(secret: &str, timestamp: &str, payload: &[u8]) -> Result<Hmac<Sha256>, StripeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| {
        StripeError::WebhookSignatureError("Invalid webhook secret format for HMAC".to_string())
    })?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Verifies the `Stripe-Signature` header of an incoming webhook request.
pub fn verify_stripe_signature(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
) -> Result<(), StripeError> {
    verify_stripe_signature_at(
        payload_bytes,
        sig_header,
        secret,
        chrono::Utc::now().timestamp(),
    )
}

/// [`verify_stripe_signature`] against an explicit current time (Unix seconds).
///
/// The header carries one `t=` timestamp and one or more `v1=` signatures;
/// any matching `v1` is accepted. Events older or newer than
/// [`SIGNATURE_TOLERANCE_SECONDS`] are rejected.
pub fn verify_stripe_signature_at(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
    now: i64,
) -> Result<(), StripeError> {
    let sig_header_value = sig_header.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing Stripe-Signature header".to_string())
    })?;

    let mut timestamp_str: Option<&str> = None;
    let mut v1_signatures_hex: Vec<&str> = Vec::new();
    for item in sig_header_value.split(',') {
        if let Some((key, value)) = item.trim().split_once('=') {
            match key {
                "t" => timestamp_str = Some(value),
                "v1" => v1_signatures_hex.push(value),
                _ => {} // v0 and future schemes are ignored
            }
        }
    }

    let timestamp_str = timestamp_str.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing timestamp 't' in Stripe-Signature".to_string())
    })?;
    let parsed_timestamp = timestamp_str.parse::<i64>().map_err(|_| {
        StripeError::WebhookSignatureError(
            "Invalid timestamp format in Stripe-Signature".to_string(),
        )
    })?;
    if v1_signatures_hex.is_empty() {
        return Err(StripeError::WebhookSignatureError(
            "Missing v1 signature in Stripe-Signature".to_string(),
        ));
    }

    let age = (now - parsed_timestamp).abs();
    if age > SIGNATURE_TOLERANCE_SECONDS {
        warn!(
            "[Stripe Webhook] Timestamp outside tolerance ({}s > {}s)",
            age, SIGNATURE_TOLERANCE_SECONDS
        );
        return Err(StripeError::WebhookSignatureError(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let mac = signed_mac(secret, timestamp_str, payload_bytes)?;
    for provided_sig_hex in v1_signatures_hex {
        let Ok(provided) = hex::decode(provided_sig_hex) else {
            continue;
        };
        // verify_slice compares in constant time
        if mac.clone().verify_slice(&provided).is_ok() {
            return Ok(());
        }
    }
    info!("[Stripe Webhook] Signature mismatch; no v1 signature matched");
    Err(StripeError::WebhookSignatureError(
        "Signature mismatch".to_string(),
    ))
}

/// Parses a verified webhook body into a [`StripeEvent`].
pub fn parse_event(payload_bytes: &[u8]) -> Result<StripeEvent, StripeError> {
    serde_json::from_slice(payload_bytes).map_err(|e| {
        StripeError::WebhookProcessingError(format!("Invalid Stripe event payload: {}", e))
    })
}

// --- API calls ---

/// Form body for `POST /v1/checkout/sessions`.
pub fn checkout_form(params: &CheckoutSessionParams) -> Vec<(String, String)> {
    let mut form_body: Vec<(String, String)> = vec![
        ("payment_method_types[]".to_string(), "card".to_string()),
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), params.success_url.clone()),
        ("cancel_url".to_string(), params.cancel_url.clone()),
        ("customer_email".to_string(), params.customer_email.clone()),
        (
            "line_items[0][price_data][currency]".to_string(),
            params.currency.to_lowercase(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            params.product_name.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            params.unit_amount.to_string(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
    ];
    if let Some(description) = params.description.as_ref().filter(|d| !d.is_empty()) {
        form_body.push((
            "line_items[0][price_data][product_data][description]".to_string(),
            description.clone(),
        ));
    }
    if let Some(client_ref_id) = &params.client_reference_id {
        form_body.push(("client_reference_id".to_string(), client_ref_id.clone()));
    }
    for (key, value) in &params.metadata {
        form_body.push((format!("metadata[{}]", key), value.clone()));
    }
    for (key, value) in &params.metadata {
        form_body.push((
            format!("payment_intent_data[metadata][{}]", key),
            value.clone(),
        ));
    }
    form_body
}

/// Reads a Stripe response, passing the API's own `error.message` through on failure.
async fn read_response<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<T, StripeError> {
    let status = response.status();
    let body_text = response.text().await?;
    if status.is_success() {
        return Ok(serde_json::from_str(&body_text)?);
    }
    let error_message = serde_json::from_str::<serde_json::Value>(&body_text)
        .ok()
        .and_then(|json_body| {
            json_body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body_text);
    error!(
        "[Stripe Logic] {} failed: {} - {}",
        context, status, error_message
    );
    Err(StripeError::ApiError {
        status_code: status.as_u16(),
        message: error_message,
    })
}

/// Creates a Stripe Checkout Session.
pub async fn create_checkout_session(
    config: &StripeConfig,
    params: &CheckoutSessionParams,
) -> Result<CheckoutSession, StripeError> {
    info!(
        "[Stripe Logic] Creating Checkout Session: '{}' {} {}",
        params.product_name, params.unit_amount, params.currency
    );
    let response = HTTP_CLIENT
        .post(api_url(config, "checkout/sessions"))
        .basic_auth(&config.secret_key, None::<&str>)
        .form(&checkout_form(params))
        .send()
        .await?;
    let session: CheckoutSession = read_response(response, "Create checkout session").await?;
    if session.url.is_none() {
        error!("[Stripe Logic] Session {} has no checkout URL", session.id);
        return Err(StripeError::InternalError(
            "Stripe response missing checkout URL".to_string(),
        ));
    }
    info!("[Stripe Logic] Checkout Session {} created", session.id);
    Ok(session)
}

/// Retrieves a Stripe Checkout Session.
pub async fn retrieve_checkout_session(
    config: &StripeConfig,
    session_id: &str,
) -> Result<CheckoutSession, StripeError> {
    validate_object_id(session_id)?;
    debug!("[Stripe Logic] Retrieving Checkout Session {}", session_id);
    let response = HTTP_CLIENT
        .get(api_url(config, &format!("checkout/sessions/{}", session_id)))
        .basic_auth(&config.secret_key, None::<&str>)
        .send()
        .await?;
    read_response(response, "Retrieve checkout session").await
}

/// Retrieves a Stripe Payment Intent.
pub async fn retrieve_payment_intent(
    config: &StripeConfig,
    payment_intent_id: &str,
) -> Result<PaymentIntent, StripeError> {
    validate_object_id(payment_intent_id)?;
    debug!("[Stripe Logic] Retrieving Payment Intent {}", payment_intent_id);
    let response = HTTP_CLIENT
        .get(api_url(config, &format!("payment_intents/{}", payment_intent_id)))
        .basic_auth(&config.secret_key, None::<&str>)
        .send()
        .await?;
    read_response(response, "Retrieve payment intent").await
}
