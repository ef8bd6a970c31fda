use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    models::{PublicUser, UpdateUserRequest, UserInfo},
    services::{auth_service::Claims, user_service},
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    log::info!("👤 GET /users/me - user: {}", claims.sub);

    let user = user_service::get_current_user(&db, &claims.sub).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "Users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserInfo),
        (status = 400, description = "Invalid request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("✏️ PUT /users/me - user: {}", claims.sub);

    let user = user_service::update_current_user(&db, &claims.sub, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user
    })))
}

/// Deletes the account and everything it owns
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Account deleted"),
        (status = 409, description = "Account has offers in progress")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_me(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    log::info!("🗑️ DELETE /users/me - user: {}", claims.sub);

    match user_service::delete_user_account(&db, &claims.sub).await {
        Ok(()) => {
            log::info!("✅ Account deleted successfully: {}", claims.sub);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Account deleted successfully"
            })))
        }
        Err(e) => {
            log::error!("❌ Failed to delete account {}: {}", claims.sub, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Public profile", body = PublicUser),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    log::debug!("👤 GET /users/{}", user_id);

    let user = user_service::get_public_user(&db, &user_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user
    })))
}
