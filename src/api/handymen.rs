use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    models::{
        CreateHandymanRequest, HandymanResponse, HandymanSearchQuery, PaginationQuery,
        ServiceSearchQuery, UpdateHandymanRequest,
    },
    services::{auth_service::Claims, handyman_service, listing_service, review_service},
    utils::AppError,
};

#[utoipa::path(
    post,
    path = "/api/v1/handymen",
    tag = "Handymen",
    request_body = CreateHandymanRequest,
    responses(
        (status = 201, description = "Profile created", body = HandymanResponse),
        (status = 403, description = "Caller is not a handyman"),
        (status = 409, description = "Profile already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_profile(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateHandymanRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🧰 POST /handymen - user: {}", claims.sub);

    let profile = handyman_service::create_profile(&db, &claims.sub, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "handyman": profile
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/handymen/me",
    tag = "Handymen",
    request_body = UpdateHandymanRequest,
    responses(
        (status = 200, description = "Profile updated", body = HandymanResponse),
        (status = 404, description = "No profile yet")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<UpdateHandymanRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("✏️ PUT /handymen/me - user: {}", claims.sub);

    let profile = handyman_service::update_profile(&db, &claims.sub, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "handyman": profile
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/handymen",
    tag = "Handymen",
    params(
        ("skill" = Option<String>, Query, description = "Skill, e.g. plumbing"),
        ("city" = Option<String>, Query, description = "City (case-insensitive)"),
        ("min_rating" = Option<f64>, Query, description = "Minimum average rating"),
        ("available" = Option<bool>, Query, description = "Only handymen taking jobs"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"),
        ("offset" = Option<u64>, Query, description = "Items to skip")
    ),
    responses((status = 200, description = "Matching handymen", body = [HandymanResponse]))
)]
pub async fn search(
    db: web::Data<MongoDB>,
    query: web::Query<HandymanSearchQuery>,
) -> Result<HttpResponse, AppError> {
    log::debug!("🔎 GET /handymen - {:?}", query);

    let handymen = handyman_service::search_profiles(&db, &query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "handymen": handymen,
        "count": handymen.len()
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/handymen/{id}",
    tag = "Handymen",
    params(("id" = String, Path, description = "Handyman (user) ID")),
    responses(
        (status = 200, description = "Handyman profile", body = HandymanResponse),
        (status = 404, description = "Handyman not found")
    )
)]
pub async fn get_profile(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let profile = handyman_service::find_profile(&db, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "handyman": HandymanResponse::from(profile)
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/handymen/{id}/services",
    tag = "Handymen",
    params(("id" = String, Path, description = "Handyman (user) ID")),
    responses((status = 200, description = "Active listings of the handyman"))
)]
pub async fn list_services(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    page: web::Query<PaginationQuery>,
) -> Result<HttpResponse, AppError> {
    let query = ServiceSearchQuery {
        category: None,
        handyman_id: Some(path.into_inner()),
        q: None,
        limit: page.limit,
        offset: page.offset,
    };
    let services = listing_service::search_listings(&db, &query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "services": services,
        "count": services.len()
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/handymen/{id}/reviews",
    tag = "Handymen",
    params(
        ("id" = String, Path, description = "Handyman (user) ID"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"),
        ("offset" = Option<u64>, Query, description = "Items to skip")
    ),
    responses((status = 200, description = "Reviews, newest first"))
)]
pub async fn list_reviews(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    page: web::Query<PaginationQuery>,
) -> Result<HttpResponse, AppError> {
    let reviews = review_service::list_for_handyman(&db, &path, &page).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "reviews": reviews,
        "count": reviews.len()
    })))
}
