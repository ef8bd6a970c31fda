use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    models::{CreateReviewRequest, ReviewResponse},
    realtime::NotificationHub,
    services::{auth_service::Claims, review_service},
    utils::AppError,
};

#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    tag = "Reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 403, description = "Caller was not the client"),
        (status = 409, description = "Offer not paid or already reviewed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_review(
    db: web::Data<MongoDB>,
    hub: web::Data<NotificationHub>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("⭐ POST /reviews - offer: {} client: {}", request.offer_id, claims.sub);

    let review = review_service::create_review(&db, &hub, &claims.sub, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "review": review
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{id}",
    tag = "Reviews",
    params(("id" = String, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 404, description = "Review not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_review(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    log::info!("🗑️ DELETE /reviews/{} - user: {}", path, claims.sub);

    review_service::delete_review(&db, &claims.sub, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Review deleted"
    })))
}
