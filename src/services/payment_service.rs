use crate::{
    database::{MongoDB, OFFERS},
    models::{NotificationKind, Offer, OfferAction, OfferResponse, OfferStatus},
    realtime::NotificationHub,
    services::{notification_service, offer_service},
    stripe::{webhook, NewPaymentIntent, PaymentIntent, PaymentProvider},
    utils::{parse_object_id, AppError, AppResult},
};
use chrono::Utc;
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PaymentIntentRequest {
    pub offer_id: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PaymentIntentResponse {
    pub success: bool,
    pub offer_id: String,
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookOutcome {
    pub received: bool,
    pub event_type: String,
    pub handled: bool,
}

fn intent_response(offer_id: String, intent: PaymentIntent) -> PaymentIntentResponse {
    PaymentIntentResponse {
        success: true,
        offer_id,
        payment_intent_id: intent.id,
        client_secret: intent.client_secret,
        amount: intent.amount,
        currency: intent.currency,
        status: intent.status,
    }
}

/// Creates (or reuses) the payment intent that pays for an accepted offer.
pub async fn create_payment_intent(
    db: &MongoDB,
    provider: &dyn PaymentProvider,
    client_id: &str,
    offer_id: &str,
) -> AppResult<PaymentIntentResponse> {
    // Rejeita IDs inválidos antes de tocar no banco ou no provider
    parse_object_id(offer_id, "offer")?;

    let (offer, party) = offer_service::get_offer_for(db, client_id, offer_id).await?;
    offer_service::ensure_actor(party, OfferAction::RequestPayment)?;
    crate::models::transition(offer.status, OfferAction::RequestPayment)?;

    if let Some(existing_id) = &offer.payment_intent_id {
        if let Some(intent) = reusable_intent(provider, existing_id).await? {
            log::info!("♻️ Reusing payment intent {} for offer {}", intent.id, offer_id);
            if offer.status != OfferStatus::PaymentPending {
                offer_service::transition_offer(db, &offer, OfferAction::RequestPayment, doc! {}).await?;
            }
            return Ok(intent_response(offer.id_hex(), intent));
        }
    }

    let request = NewPaymentIntent {
        amount: offer.amount,
        currency: offer.currency.clone(),
        description: format!("Handyman job: {}", offer.description),
        metadata: vec![
            ("offer_id".to_string(), offer.id_hex()),
            ("client_id".to_string(), offer.client_id.clone()),
            ("handyman_id".to_string(), offer.handyman_id.clone()),
        ],
        idempotency_key: format!(
            "offer-{}-{}",
            offer.id_hex(),
            offer.payment_intent_id.as_deref().unwrap_or("first")
        ),
    };
    let intent = provider.create_payment_intent(&request).await?;

    offer_service::transition_offer(
        db,
        &offer,
        OfferAction::RequestPayment,
        doc! { "payment_intent_id": &intent.id },
    )
    .await?;

    log::info!("✅ Payment intent {} created for offer {}", intent.id, offer_id);
    Ok(intent_response(offer.id_hex(), intent))
}

/// Looks up the intent an offer already references. `None` means it is gone
/// (canceled or unknown to the provider) and may be replaced; any other
/// provider failure is returned, since the old intent could still be paid.
async fn reusable_intent(
    provider: &dyn PaymentProvider,
    intent_id: &str,
) -> AppResult<Option<PaymentIntent>> {
    match provider.retrieve_payment_intent(intent_id).await {
        Ok(intent) if !intent.is_canceled() => Ok(Some(intent)),
        Ok(_) => {
            log::info!("💳 Previous intent {} was canceled, creating a new one", intent_id);
            Ok(None)
        }
        Err(AppError::NotFound(_)) => {
            log::warn!("⚠️ Previous intent {} not found at the provider", intent_id);
            Ok(None)
        }
        Err(e) => {
            log::error!("❌ Could not check intent {}: {}", intent_id, e);
            Err(e)
        }
    }
}

/// Checks that a provider intent really pays for `offer`.
pub fn check_intent_matches(offer: &Offer, intent: &PaymentIntent) -> AppResult<()> {
    if offer.payment_intent_id.as_deref() != Some(intent.id.as_str()) {
        return Err(AppError::InvalidRequest(
            "Payment intent does not belong to this offer".to_string(),
        ));
    }
    if intent.offer_id().is_some_and(|id| id != offer.id_hex()) {
        return Err(AppError::InvalidRequest(
            "Payment intent metadata names another offer".to_string(),
        ));
    }
    if intent.amount != offer.amount || !intent.currency.eq_ignore_ascii_case(&offer.currency) {
        return Err(AppError::InvalidRequest(
            "Payment amount does not match the offer".to_string(),
        ));
    }
    Ok(())
}

/// Moves the offer to `paid`. Already-paid offers are returned unchanged.
async fn settle(db: &MongoDB, hub: &NotificationHub, offer: Offer) -> AppResult<Offer> {
    if offer.status.is_settled() {
        return Ok(offer);
    }

    let updated = offer_service::transition_offer(db, &offer, OfferAction::ConfirmPayment, doc! {}).await?;
    offer_service::notify_counterpart(db, hub, &updated, OfferAction::ConfirmPayment).await;
    Ok(updated)
}

pub async fn confirm_payment(
    db: &MongoDB,
    provider: &dyn PaymentProvider,
    hub: &NotificationHub,
    client_id: &str,
    offer_id: &str,
) -> AppResult<OfferResponse> {
    parse_object_id(offer_id, "offer")?;

    let (offer, party) = offer_service::get_offer_for(db, client_id, offer_id).await?;
    offer_service::ensure_actor(party, OfferAction::ConfirmPayment)?;

    if offer.status.is_settled() {
        return Ok(OfferResponse::from(offer));
    }

    let intent_id = offer
        .payment_intent_id
        .clone()
        .ok_or_else(|| AppError::Conflict("No payment has been started for this offer".to_string()))?;

    let intent = provider.retrieve_payment_intent(&intent_id).await?;
    check_intent_matches(&offer, &intent)?;

    if !intent.is_succeeded() {
        return Err(AppError::InvalidRequest(format!(
            "Payment not completed (status: {})",
            intent.status
        )));
    }

    settle(db, hub, offer).await.map(OfferResponse::from)
}

/// Verifies and applies a provider webhook delivery.
pub async fn handle_webhook(
    db: &MongoDB,
    hub: &NotificationHub,
    webhook_secret: &str,
    signature_header: Option<&str>,
    payload: &[u8],
) -> AppResult<WebhookOutcome> {
    let header = signature_header
        .ok_or_else(|| AppError::InvalidRequest("Missing Stripe-Signature header".to_string()))?;
    webhook::verify_signature(webhook_secret, header, payload, Utc::now().timestamp())?;

    let event = webhook::parse_event(payload)?;
    log::info!("📬 Webhook {} ({})", event.id, event.event_type);

    let handled = match event.event_type.as_str() {
        "payment_intent.succeeded" | "payment_intent.payment_failed" => {
            let intent: PaymentIntent = serde_json::from_value(event.data.object).map_err(|e| {
                AppError::InvalidRequest(format!("Malformed payment intent: {}", e))
            })?;
            let offer = db
                .collection::<Offer>(OFFERS)
                .find_one(doc! { "payment_intent_id": &intent.id })
                .await?;

            match offer {
                Some(offer) if event.event_type == "payment_intent.succeeded" => {
                    check_intent_matches(&offer, &intent)?;
                    if offer.status == OfferStatus::PaymentPending || offer.status.is_settled() {
                        settle(db, hub, offer).await?;
                        true
                    } else {
                        log::warn!(
                            "⚠️ Payment succeeded for offer {} in status {}",
                            offer.id_hex(),
                            offer.status
                        );
                        false
                    }
                }
                Some(offer) => {
                    notification_service::notify_quietly(
                        db,
                        hub,
                        &offer.client_id,
                        NotificationKind::PaymentFailed,
                        "Payment failed",
                        "Your payment could not be processed. Please try again.",
                        serde_json::json!({ "offer_id": offer.id_hex() }),
                    )
                    .await;
                    true
                }
                None => {
                    log::warn!("⚠️ No offer references payment intent {}", intent.id);
                    false
                }
            }
        }
        _ => false,
    };

    Ok(WebhookOutcome {
        received: true,
        event_type: event.event_type,
        handled,
    })
}
