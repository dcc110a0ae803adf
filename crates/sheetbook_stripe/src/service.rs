// --- File: crates/sheetbook_stripe/src/service.rs ---
use std::sync::Arc;

use sheetbook_common::BoxFuture;
use sheetbook_config::AppConfig;

use crate::error::StripeError;
use crate::logic::{
    create_checkout_session, parse_event, retrieve_checkout_session, retrieve_payment_intent,
    verify_stripe_signature, CheckoutSession, CheckoutSessionParams, PaymentIntent, StripeEvent,
};

/// Payment provider operations used by the booking flows.
pub trait PaymentProvider: Send + Sync {
    fn create_checkout_session(
        &self,
        params: CheckoutSessionParams,
    ) -> BoxFuture<'_, CheckoutSession, StripeError>;

    fn retrieve_checkout_session<'a>(
        &'a self,
        session_id: &'a str,
    ) -> BoxFuture<'a, CheckoutSession, StripeError>;

    fn retrieve_payment_intent<'a>(
        &'a self,
        payment_intent_id: &'a str,
    ) -> BoxFuture<'a, PaymentIntent, StripeError>;

    /// Verifies a signed webhook body and parses the event it carries.
    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<StripeEvent, StripeError>;
}

/// Stripe payment service implementation
pub struct StripePaymentService {
    config: Arc<AppConfig>,
}

impl StripePaymentService {
    /// Create a new Stripe payment service
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}

impl PaymentProvider for StripePaymentService {
    fn create_checkout_session(
        &self,
        params: CheckoutSessionParams,
    ) -> BoxFuture<'_, CheckoutSession, StripeError> {
        Box::pin(async move { create_checkout_session(&self.config.stripe, &params).await })
    }

    fn retrieve_checkout_session<'a>(
        &'a self,
        session_id: &'a str,
    ) -> BoxFuture<'a, CheckoutSession, StripeError> {
        Box::pin(retrieve_checkout_session(&self.config.stripe, session_id))
    }

    fn retrieve_payment_intent<'a>(
        &'a self,
        payment_intent_id: &'a str,
    ) -> BoxFuture<'a, PaymentIntent, StripeError> {
        Box::pin(retrieve_payment_intent(&self.config.stripe, payment_intent_id))
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<StripeEvent, StripeError> {
        let secret = self
            .config
            .stripe
            .webhook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                StripeError::ConfigError("stripe.webhook_secret is not set".to_string())
            })?;
        verify_stripe_signature(payload, signature, secret)?;
        parse_event(payload)
    }
}
