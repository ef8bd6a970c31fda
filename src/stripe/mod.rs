//! Payment provider integration. Handlers depend on the `PaymentProvider`
//! trait; `StripeClient` is the production implementation.

pub mod client;
pub mod types;
pub mod webhook;

pub use client::StripeClient;
pub use types::*;

use async_trait::async_trait;

use crate::utils::AppResult;

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment_intent(&self, request: &NewPaymentIntent) -> AppResult<PaymentIntent>;

    async fn retrieve_payment_intent(&self, intent_id: &str) -> AppResult<PaymentIntent>;
}
