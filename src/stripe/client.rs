use async_trait::async_trait;

use super::types::{NewPaymentIntent, PaymentIntent, StripeErrorBody};
use super::PaymentProvider;
use crate::config::StripeConfig;
use crate::utils::{AppError, AppResult};

/// REST client for the Stripe PaymentIntents API
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        if config.secret_key.is_empty() {
            log::warn!("⚠️  STRIPE_SECRET_KEY not set, payment endpoints will fail");
        }

        Ok(Self {
            http,
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn parse_response(response: reqwest::Response) -> AppResult<PaymentIntent> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<PaymentIntent>()
                .await
                .map_err(|e| AppError::PaymentProvider(format!("Unexpected response: {}", e)));
        }

        let message = match response.json::<StripeErrorBody>().await {
            Ok(body) => body
                .error
                .message
                .or(body.error.code)
                .or(body.error.kind)
                .unwrap_or_else(|| status.to_string()),
            Err(_) => status.to_string(),
        };

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Payment intent not found: {}", message)));
        }
        Err(AppError::PaymentProvider(message))
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_payment_intent(&self, request: &NewPaymentIntent) -> AppResult<PaymentIntent> {
        log::info!(
            "💳 Creating payment intent: {} {} ({})",
            request.amount,
            request.currency,
            request.idempotency_key
        );

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&request.form_fields())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn retrieve_payment_intent(&self, intent_id: &str) -> AppResult<PaymentIntent> {
        log::debug!("💳 Retrieving payment intent {}", intent_id);

        let response = self
            .http
            .get(format!(
                "{}/v1/payment_intents/{}",
                self.api_base,
                urlencoding::encode(intent_id)
            ))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        Self::parse_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let client = StripeClient::new(&StripeConfig {
            secret_key: "sk_test_123".into(),
            webhook_secret: String::new(),
            api_base: "http://localhost:12111/".into(),
        })
        .unwrap();
        assert_eq!(client.api_base, "http://localhost:12111");
    }

    #[tokio::test]
    #[ignore] // Requires STRIPE_SECRET_KEY (test mode) and network access
    async fn test_create_and_retrieve_intent() {
        dotenv::dotenv().ok();
        let client = StripeClient::new(&StripeConfig {
            secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            webhook_secret: String::new(),
            api_base: "https://api.stripe.com".into(),
        })
        .unwrap();

        let created = client
            .create_payment_intent(&NewPaymentIntent {
                amount: 1000,
                currency: "usd".into(),
                description: "integration test".into(),
                metadata: vec![("offer_id".into(), "test".into())],
                idempotency_key: uuid::Uuid::new_v4().to_string(),
            })
            .await
            .unwrap();
        assert!(created.client_secret.is_some());

        let fetched = client.retrieve_payment_intent(&created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.offer_id(), Some("test"));
    }
}
