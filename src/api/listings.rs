use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    models::{CreateServiceRequest, ServiceResponse, ServiceSearchQuery, UpdateServiceRequest},
    services::{auth_service::Claims, listing_service},
    utils::AppError,
};

#[utoipa::path(
    post,
    path = "/api/v1/services",
    tag = "Services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Listing created", body = ServiceResponse),
        (status = 403, description = "Caller has no handyman profile")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_service(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateServiceRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🛠️ POST /services - handyman: {}", claims.sub);

    let service = listing_service::create_listing(&db, &claims.sub, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "service": service
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/services",
    tag = "Services",
    params(
        ("category" = Option<String>, Query, description = "Category"),
        ("handyman_id" = Option<String>, Query, description = "Owner"),
        ("q" = Option<String>, Query, description = "Title contains (case-insensitive)"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"),
        ("offset" = Option<u64>, Query, description = "Items to skip")
    ),
    responses((status = 200, description = "Active listings", body = [ServiceResponse]))
)]
pub async fn search_services(
    db: web::Data<MongoDB>,
    query: web::Query<ServiceSearchQuery>,
) -> Result<HttpResponse, AppError> {
    let services = listing_service::search_listings(&db, &query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "services": services,
        "count": services.len()
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/services/{id}",
    tag = "Services",
    params(("id" = String, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Listing", body = ServiceResponse),
        (status = 400, description = "Invalid service ID"),
        (status = 404, description = "Service not found")
    )
)]
pub async fn get_service(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let service = listing_service::get_listing(&db, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "service": ServiceResponse::from(service)
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/services/{id}",
    tag = "Services",
    params(("id" = String, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Listing updated", body = ServiceResponse),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_service(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateServiceRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("✏️ PUT /services/{} - user: {}", path, claims.sub);

    let service = listing_service::update_listing(&db, &claims.sub, &path, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "service": service
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/services/{id}",
    tag = "Services",
    params(("id" = String, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Listing deleted"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_service(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    log::info!("🗑️ DELETE /services/{} - user: {}", path, claims.sub);

    listing_service::delete_listing(&db, &claims.sub, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Service deleted"
    })))
}
