use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subset of the provider's PaymentIntent object the marketplace relies on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    pub fn is_canceled(&self) -> bool {
        self.status == "canceled"
    }

    pub fn offer_id(&self) -> Option<&str> {
        self.metadata.get("offer_id").map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub metadata: Vec<(String, String)>,
    /// Lets the provider collapse retried creations into one intent
    pub idempotency_key: String,
}

impl NewPaymentIntent {
    /// Form body in the provider's bracketed-key encoding.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("amount".to_string(), self.amount.to_string()),
            ("currency".to_string(), self.currency.clone()),
            ("description".to_string(), self.description.clone()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
        ];
        for (key, value) in &self.metadata {
            fields.push((format!("metadata[{}]", key), value.clone()));
        }
        fields
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorDetail {
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub code: Option<String>,
}

/// Webhook envelope; `data.object` is kept raw and decoded per event type
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_encode_metadata() {
        let intent = NewPaymentIntent {
            amount: 12_500,
            currency: "usd".into(),
            description: "Offer 1".into(),
            metadata: vec![("offer_id".into(), "abc".into())],
            idempotency_key: "offer-abc".into(),
        };
        let fields = intent.form_fields();

        assert!(fields.contains(&("amount".to_string(), "12500".to_string())));
        assert!(fields.contains(&("metadata[offer_id]".to_string(), "abc".to_string())));
        assert!(fields.contains(&("automatic_payment_methods[enabled]".to_string(), "true".to_string())));
    }

    #[test]
    fn test_payment_intent_decodes_provider_json() {
        let json = serde_json::json!({
            "id": "pi_123",
            "object": "payment_intent",
            "amount": 5000,
            "currency": "usd",
            "status": "requires_payment_method",
            "client_secret": "pi_123_secret_456",
            "metadata": { "offer_id": "65f1a2b3c4d5e6f708091a2b" },
            "livemode": false
        });
        let intent: PaymentIntent = serde_json::from_value(json).unwrap();

        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.offer_id(), Some("65f1a2b3c4d5e6f708091a2b"));
        assert!(!intent.is_succeeded());
    }
}
