// --- File: crates/sheetbook_bookings/src/policy.rs ---
use sheetbook_config::{ConfirmationConfig, LookupKeys, WriteMode};
use sheetbook_stripe::CheckoutSession;

/// A payment identifier after resolution against the provider.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPayment {
    /// The identifier as received.
    pub raw_id: String,
    /// Present when `raw_id` was a checkout session id.
    pub session: Option<CheckoutSession>,
    pub payment_intent_id: Option<String>,
    /// Payment intent id when known, otherwise `raw_id`.
    pub canonical_id: String,
}

impl ResolvedPayment {
    /// An identifier that needs no provider lookup.
    pub fn unresolved(raw_id: &str) -> Self {
        Self {
            raw_id: raw_id.to_string(),
            session: None,
            payment_intent_id: raw_id.starts_with("pi_").then(|| raw_id.to_string()),
            canonical_id: raw_id.to_string(),
        }
    }

    pub fn from_session(raw_id: &str, session: CheckoutSession) -> Self {
        let payment_intent_id = session.payment_intent.clone().filter(|pi| !pi.is_empty());
        Self {
            raw_id: raw_id.to_string(),
            canonical_id: payment_intent_id.clone().unwrap_or_else(|| raw_id.to_string()),
            payment_intent_id,
            session: Some(session),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }
}

/// How confirmations find and write booking rows.
#[derive(Debug, Clone)]
pub struct ConfirmationPolicy {
    pub write_mode: WriteMode,
    pub lookup_keys: LookupKeys,
    pub confirmed_status: String,
    pub direct_booking_marker: String,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self::from(&ConfirmationConfig::default())
    }
}

impl From<&ConfirmationConfig> for ConfirmationPolicy {
    fn from(config: &ConfirmationConfig) -> Self {
        Self {
            write_mode: config.write_mode,
            lookup_keys: config.lookup_keys,
            confirmed_status: config.confirmed_status.clone(),
            direct_booking_marker: config.direct_booking_marker.clone(),
        }
    }
}

impl ConfirmationPolicy {
    /// Whether checkout creation writes a pending row for confirmation to update.
    pub fn writes_pending_rows(&self) -> bool {
        self.write_mode == WriteMode::UpdateExisting
    }

    /// Values that may appear in the payment reference column for this payment.
    pub fn lookup_candidates(&self, payment: &ResolvedPayment) -> Vec<String> {
        let mut candidates = vec![payment.raw_id.clone()];
        if self.lookup_keys == LookupKeys::SessionOrIntent {
            let extra = [payment.session_id(), payment.payment_intent_id.as_deref()];
            for id in extra.into_iter().flatten() {
                if !candidates.iter().any(|c| c == id) {
                    candidates.push(id.to_string());
                }
            }
        }
        candidates
    }

    /// Payment reference written on rows appended at confirmation.
    ///
    /// Always one of [`lookup_candidates`](Self::lookup_candidates), so a
    /// repeated confirmation finds the row it appended.
    pub fn reference_for(&self, payment: &ResolvedPayment) -> String {
        match self.lookup_keys {
            LookupKeys::SessionOrIntent => payment.canonical_id.clone(),
            LookupKeys::SessionOnly => payment.raw_id.clone(),
        }
    }

    pub fn is_confirmed(&self, status: Option<&str>) -> bool {
        status.is_some_and(|s| s.trim().eq_ignore_ascii_case(self.confirmed_status.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_payment() -> ResolvedPayment {
        ResolvedPayment::from_session(
            "cs_test_1",
            CheckoutSession {
                id: "cs_test_1".to_string(),
                payment_intent: Some("pi_1".to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_session_resolves_to_payment_intent() {
        let payment = session_payment();
        assert_eq!(payment.canonical_id, "pi_1");
        assert_eq!(payment.session_id(), Some("cs_test_1"));
    }

    #[test]
    fn test_session_without_intent_stays_canonical() {
        let payment = ResolvedPayment::from_session(
            "cs_free",
            CheckoutSession {
                id: "cs_free".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(payment.canonical_id, "cs_free");
        assert!(payment.payment_intent_id.is_none());
    }

    #[test]
    fn test_lookup_candidates_follow_policy() {
        let mut policy = ConfirmationPolicy::default();
        assert_eq!(
            policy.lookup_candidates(&session_payment()),
            vec!["cs_test_1".to_string(), "pi_1".to_string()]
        );
        assert_eq!(policy.reference_for(&session_payment()), "pi_1");

        policy.lookup_keys = LookupKeys::SessionOnly;
        assert_eq!(
            policy.lookup_candidates(&session_payment()),
            vec!["cs_test_1".to_string()]
        );
        assert_eq!(policy.reference_for(&session_payment()), "cs_test_1");
    }

    #[test]
    fn test_unresolved_payment_intent() {
        let payment = ResolvedPayment::unresolved("pi_9");
        assert_eq!(payment.payment_intent_id.as_deref(), Some("pi_9"));
        assert_eq!(
            ConfirmationPolicy::default().lookup_candidates(&payment),
            vec!["pi_9".to_string()]
        );
    }

    #[test]
    fn test_confirmed_status_comparison() {
        let policy = ConfirmationPolicy::default();
        assert!(policy.is_confirmed(Some("confirmed ")));
        assert!(!policy.is_confirmed(Some("Pending")));
        assert!(!policy.is_confirmed(None));
    }
}
