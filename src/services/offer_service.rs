use crate::{
    database::{MongoDB, OFFERS},
    models::{
        page_size, transition, CreateOfferRequest, NotificationKind, Offer, OfferAction,
        OfferListQuery, OfferResponse, OfferStatus, Party,
    },
    realtime::NotificationHub,
    services::{handyman_service, listing_service, notification_service},
    utils::{parse_object_id, AppError, AppResult},
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;

pub const MAX_OFFER_AMOUNT: i64 = 10_000_000;
const MAX_DESCRIPTION_LEN: usize = 4000;

pub fn validate_offer(request: &CreateOfferRequest, client_id: &str) -> AppResult<()> {
    if request.handyman_id.trim().is_empty() {
        return Err(AppError::InvalidRequest("handyman_id is required".to_string()));
    }
    if request.handyman_id == client_id {
        return Err(AppError::InvalidRequest("You cannot make an offer to yourself".to_string()));
    }
    let description = request.description.trim();
    if description.is_empty() || description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Description must be between 1 and {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    if request.amount <= 0 || request.amount > MAX_OFFER_AMOUNT {
        return Err(AppError::InvalidRequest(format!(
            "Amount must be between 1 and {} (minor units)",
            MAX_OFFER_AMOUNT
        )));
    }
    if let Some(currency) = &request.currency {
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::InvalidRequest("Currency must be a 3-letter ISO code".to_string()));
        }
    }
    if let Some(when) = request.scheduled_for {
        if when < Utc::now().timestamp() {
            return Err(AppError::InvalidRequest("scheduled_for must be in the future".to_string()));
        }
    }
    Ok(())
}

pub async fn create_offer(
    db: &MongoDB,
    hub: &NotificationHub,
    client_id: &str,
    request: &CreateOfferRequest,
    default_currency: &str,
) -> AppResult<OfferResponse> {
    validate_offer(request, client_id)?;

    let handyman = handyman_service::find_profile(db, &request.handyman_id).await?;
    if !handyman.is_available {
        return Err(AppError::Conflict("Handyman is not taking new jobs".to_string()));
    }

    if let Some(service_id) = &request.service_id {
        let listing = listing_service::get_listing(db, service_id).await?;
        if listing.handyman_id != handyman.user_id || !listing.is_active {
            return Err(AppError::InvalidRequest(
                "Service is not offered by this handyman".to_string(),
            ));
        }
    }

    let now = Utc::now().timestamp();
    let mut offer = Offer {
        id: None,
        client_id: client_id.to_string(),
        handyman_id: handyman.user_id.clone(),
        service_id: request.service_id.clone(),
        description: request.description.trim().to_string(),
        amount: request.amount,
        currency: request
            .currency
            .as_deref()
            .unwrap_or(default_currency)
            .to_lowercase(),
        status: OfferStatus::Pending,
        payment_intent_id: None,
        scheduled_for: request.scheduled_for,
        created_at: now,
        updated_at: now,
        accepted_at: None,
        paid_at: None,
        completed_at: None,
    };

    let result = db.collection::<Offer>(OFFERS).insert_one(&offer).await?;
    offer.id = result.inserted_id.as_object_id();

    log::info!(
        "📨 Offer {} created: {} -> {} ({} {})",
        offer.id_hex(),
        client_id,
        offer.handyman_id,
        offer.amount,
        offer.currency
    );

    notification_service::notify_quietly(
        db,
        hub,
        &offer.handyman_id,
        NotificationKind::OfferCreated,
        "New offer",
        &format!("You received a new offer: {}", offer.description),
        serde_json::json!({ "offer_id": offer.id_hex() }),
    )
    .await;

    Ok(OfferResponse::from(offer))
}

pub fn build_list_filter(user_id: &str, query: &OfferListQuery) -> AppResult<Document> {
    let mut filter = match query.role.as_deref() {
        Some("client") => doc! { "client_id": user_id },
        Some("handyman") => doc! { "handyman_id": user_id },
        None | Some("") => doc! { "$or": [ { "client_id": user_id }, { "handyman_id": user_id } ] },
        Some(other) => {
            return Err(AppError::InvalidRequest(format!("Unknown role: {}", other)));
        }
    };

    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status = OfferStatus::parse(status)
            .ok_or_else(|| AppError::InvalidRequest(format!("Unknown status: {}", status)))?;
        filter.insert("status", status.as_str());
    }

    Ok(filter)
}

pub async fn list_offers(
    db: &MongoDB,
    user_id: &str,
    query: &OfferListQuery,
) -> AppResult<Vec<OfferResponse>> {
    let filter = build_list_filter(user_id, query)?;

    let offers = db
        .collection::<Offer>(OFFERS)
        .find(filter)
        .sort(doc! { "updated_at": -1 })
        .skip(query.offset.unwrap_or(0))
        .limit(page_size(query.limit))
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    Ok(offers.into_iter().map(OfferResponse::from).collect())
}

/// Loads an offer the caller takes part in. Outsiders get a 404, not a 403.
pub async fn get_offer_for(db: &MongoDB, user_id: &str, offer_id: &str) -> AppResult<(Offer, Party)> {
    let id = parse_object_id(offer_id, "offer")?;

    let offer = db
        .collection::<Offer>(OFFERS)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Offer not found".to_string()))?;

    match offer.party_of(user_id) {
        Some(party) => Ok((offer, party)),
        None => Err(AppError::NotFound("Offer not found".to_string())),
    }
}

pub fn ensure_actor(party: Party, action: OfferAction) -> AppResult<()> {
    if party == action.actor() {
        return Ok(());
    }
    let who = match action.actor() {
        Party::Client => "client",
        Party::Handyman => "handyman",
    };
    Err(AppError::Forbidden(format!(
        "Only the {} can {} this offer",
        who,
        action.verb()
    )))
}

/// Applies `action` with a conditional write on the current status, so a
/// concurrent transition makes this one fail with a conflict.
pub async fn transition_offer(
    db: &MongoDB,
    offer: &Offer,
    action: OfferAction,
    extra: Document,
) -> AppResult<Offer> {
    let target = transition(offer.status, action)?;
    let now = Utc::now().timestamp();

    let mut set = doc! { "status": target.as_str(), "updated_at": now };
    match target {
        OfferStatus::Accepted => {
            set.insert("accepted_at", now);
        }
        OfferStatus::Paid => {
            set.insert("paid_at", now);
        }
        OfferStatus::Completed => {
            set.insert("completed_at", now);
        }
        _ => {}
    }
    set.extend(extra);

    let updated = db
        .collection::<Offer>(OFFERS)
        .find_one_and_update(
            doc! { "_id": offer.id, "status": offer.status.as_str() },
            doc! { "$set": set },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::Conflict("Offer was modified concurrently, retry".to_string()))?;

    log::info!(
        "🔁 Offer {}: {} -> {}",
        updated.id_hex(),
        offer.status,
        updated.status
    );
    Ok(updated)
}

fn notification_for(action: OfferAction, offer: &Offer) -> Option<(NotificationKind, &'static str, String)> {
    match action {
        OfferAction::Accept => Some((
            NotificationKind::OfferAccepted,
            "Offer accepted",
            "Your offer was accepted. You can now proceed to payment.".to_string(),
        )),
        OfferAction::Decline => Some((
            NotificationKind::OfferDeclined,
            "Offer declined",
            "Your offer was declined.".to_string(),
        )),
        OfferAction::Cancel => Some((
            NotificationKind::OfferCancelled,
            "Offer cancelled",
            format!("The client cancelled the offer: {}", offer.description),
        )),
        OfferAction::ConfirmPayment => Some((
            NotificationKind::PaymentReceived,
            "Payment received",
            format!("Payment of {} {} received.", offer.amount, offer.currency.to_uppercase()),
        )),
        OfferAction::Complete => Some((
            NotificationKind::OfferCompleted,
            "Job completed",
            "The handyman marked the job as completed. Leave a review!".to_string(),
        )),
        OfferAction::RequestPayment => None,
    }
}

pub async fn notify_counterpart(
    db: &MongoDB,
    hub: &NotificationHub,
    offer: &Offer,
    action: OfferAction,
) {
    if let Some((kind, title, message)) = notification_for(action, offer) {
        notification_service::notify_quietly(
            db,
            hub,
            offer.counterpart(action.actor()),
            kind,
            title,
            &message,
            serde_json::json!({ "offer_id": offer.id_hex(), "status": offer.status }),
        )
        .await;
    }
}

/// Accept, decline, cancel or complete an offer on behalf of `user_id`.
pub async fn apply_action(
    db: &MongoDB,
    hub: &NotificationHub,
    user_id: &str,
    offer_id: &str,
    action: OfferAction,
) -> AppResult<OfferResponse> {
    if matches!(action, OfferAction::RequestPayment | OfferAction::ConfirmPayment) {
        return Err(AppError::InvalidRequest(
            "Payment transitions go through the payments API".to_string(),
        ));
    }

    let (offer, party) = get_offer_for(db, user_id, offer_id).await?;
    ensure_actor(party, action)?;

    let updated = transition_offer(db, &offer, action, Document::new()).await?;
    notify_counterpart(db, hub, &updated, action).await;

    Ok(OfferResponse::from(updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: i64) -> CreateOfferRequest {
        CreateOfferRequest {
            handyman_id: "handy".into(),
            service_id: None,
            description: "Replace kitchen faucet".into(),
            amount,
            currency: None,
            scheduled_for: None,
        }
    }

    fn list_query(status: Option<&str>, role: Option<&str>) -> OfferListQuery {
        OfferListQuery {
            status: status.map(String::from),
            role: role.map(String::from),
            limit: None,
            offset: None,
        }
    }

    #[test]
    fn test_validate_offer_amounts() {
        assert!(validate_offer(&request(5000), "client").is_ok());
        assert!(validate_offer(&request(0), "client").is_err());
        assert!(validate_offer(&request(-100), "client").is_err());
        assert!(validate_offer(&request(MAX_OFFER_AMOUNT + 1), "client").is_err());
    }

    #[test]
    fn test_offer_to_self_rejected() {
        let err = validate_offer(&request(5000), "handy").unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_currency_and_schedule_validation() {
        let mut r = request(5000);
        r.currency = Some("EURO".into());
        assert!(validate_offer(&r, "client").is_err());

        let mut r = request(5000);
        r.currency = Some("EUR".into());
        assert!(validate_offer(&r, "client").is_ok());

        let mut r = request(5000);
        r.scheduled_for = Some(Utc::now().timestamp() - 3600);
        assert!(validate_offer(&r, "client").is_err());
    }

    #[test]
    fn test_list_filter_both_sides_by_default() {
        let filter = build_list_filter("u1", &list_query(None, None)).unwrap();
        assert_eq!(filter.get_array("$or").unwrap().len(), 2);
    }

    #[test]
    fn test_list_filter_role_and_status() {
        let filter = build_list_filter("u1", &list_query(Some("payment_pending"), Some("client"))).unwrap();
        assert_eq!(filter.get_str("client_id").unwrap(), "u1");
        assert_eq!(filter.get_str("status").unwrap(), "payment_pending");

        assert!(build_list_filter("u1", &list_query(Some("bogus"), None)).is_err());
        assert!(build_list_filter("u1", &list_query(None, Some("admin"))).is_err());
    }

    #[test]
    fn test_only_the_right_party_may_act() {
        assert!(ensure_actor(Party::Handyman, OfferAction::Accept).is_ok());
        assert!(matches!(
            ensure_actor(Party::Client, OfferAction::Accept),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_actor(Party::Client, OfferAction::Cancel).is_ok());
        assert!(ensure_actor(Party::Handyman, OfferAction::Cancel).is_err());
    }

    #[tokio::test]
    async fn test_invalid_offer_id_rejected_before_lookup() {
        let db = MongoDB::unconnected("mongodb://127.0.0.1:1/handyman_test").await;
        let err = get_offer_for(&db, "u1", "12345").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_payment_actions_not_applied_directly() {
        let db = MongoDB::unconnected("mongodb://127.0.0.1:1/handyman_test").await;
        let hub = NotificationHub::new();
        let err = apply_action(&db, &hub, "u1", "65f1a2b3c4d5e6f708091a2b", OfferAction::ConfirmPayment)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
}
