use actix_web::{web, HttpResponse};

use crate::{
    config::AppConfig,
    database::MongoDB,
    models::{CreateOfferRequest, OfferAction, OfferListQuery, OfferResponse},
    realtime::NotificationHub,
    services::{auth_service::Claims, offer_service},
    utils::AppError,
};

#[utoipa::path(
    post,
    path = "/api/v1/offers",
    tag = "Offers",
    request_body = CreateOfferRequest,
    responses(
        (status = 201, description = "Offer sent to the handyman", body = OfferResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Handyman or service not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_offer(
    db: web::Data<MongoDB>,
    hub: web::Data<NotificationHub>,
    config: web::Data<AppConfig>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateOfferRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📨 POST /offers - client: {} -> {}", claims.sub, request.handyman_id);

    let offer = offer_service::create_offer(&db, &hub, &claims.sub, &request, &config.default_currency).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "offer": offer
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/offers",
    tag = "Offers",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("role" = Option<String>, Query, description = "client | handyman"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"),
        ("offset" = Option<u64>, Query, description = "Items to skip")
    ),
    responses((status = 200, description = "Caller's offers", body = [OfferResponse])),
    security(("bearer_auth" = []))
)]
pub async fn list_offers(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    query: web::Query<OfferListQuery>,
) -> Result<HttpResponse, AppError> {
    let offers = offer_service::list_offers(&db, &claims.sub, &query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "offers": offers,
        "count": offers.len()
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/offers/{id}",
    tag = "Offers",
    params(("id" = String, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer", body = OfferResponse),
        (status = 404, description = "Offer not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_offer(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let (offer, _) = offer_service::get_offer_for(&db, &claims.sub, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "offer": OfferResponse::from(offer)
    })))
}

async fn run_action(
    db: &MongoDB,
    hub: &NotificationHub,
    claims: &Claims,
    offer_id: &str,
    action: OfferAction,
) -> Result<HttpResponse, AppError> {
    log::info!("🔁 {} offer {} - user: {}", action.verb(), offer_id, claims.sub);

    let offer = offer_service::apply_action(db, hub, &claims.sub, offer_id, action).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "offer": offer
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/offers/{id}/accept",
    tag = "Offers",
    params(("id" = String, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer accepted", body = OfferResponse),
        (status = 403, description = "Only the handyman can accept"),
        (status = 409, description = "Offer is not pending")
    ),
    security(("bearer_auth" = []))
)]
pub async fn accept_offer(
    db: web::Data<MongoDB>,
    hub: web::Data<NotificationHub>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    run_action(&db, &hub, &claims, &path, OfferAction::Accept).await
}

#[utoipa::path(
    post,
    path = "/api/v1/offers/{id}/decline",
    tag = "Offers",
    params(("id" = String, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer declined", body = OfferResponse),
        (status = 409, description = "Offer is not pending")
    ),
    security(("bearer_auth" = []))
)]
pub async fn decline_offer(
    db: web::Data<MongoDB>,
    hub: web::Data<NotificationHub>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    run_action(&db, &hub, &claims, &path, OfferAction::Decline).await
}

#[utoipa::path(
    post,
    path = "/api/v1/offers/{id}/cancel",
    tag = "Offers",
    params(("id" = String, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer cancelled", body = OfferResponse),
        (status = 409, description = "Payment already started")
    ),
    security(("bearer_auth" = []))
)]
pub async fn cancel_offer(
    db: web::Data<MongoDB>,
    hub: web::Data<NotificationHub>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    run_action(&db, &hub, &claims, &path, OfferAction::Cancel).await
}

#[utoipa::path(
    post,
    path = "/api/v1/offers/{id}/complete",
    tag = "Offers",
    params(("id" = String, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Job completed", body = OfferResponse),
        (status = 409, description = "Offer is not paid")
    ),
    security(("bearer_auth" = []))
)]
pub async fn complete_offer(
    db: web::Data<MongoDB>,
    hub: web::Data<NotificationHub>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    run_action(&db, &hub, &claims, &path, OfferAction::Complete).await
}
