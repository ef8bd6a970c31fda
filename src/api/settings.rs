use actix_web::{web, HttpResponse};

use crate::{
    config::AppConfig,
    database::MongoDB,
    models::{UpdateSettingsRequest, UserSettings},
    services::{auth_service::Claims, settings_service},
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/v1/settings",
    tag = "Settings",
    responses((status = 200, description = "Caller's settings (defaults if never saved)", body = UserSettings)),
    security(("bearer_auth" = []))
)]
pub async fn get_settings(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let settings = settings_service::get_settings(&db, &claims.sub, &config.default_currency).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "settings": settings
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/settings",
    tag = "Settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings saved", body = UserSettings),
        (status = 400, description = "Unsupported language or currency")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_settings(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    claims: web::ReqData<Claims>,
    request: web::Json<UpdateSettingsRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("⚙️ PUT /settings - user: {}", claims.sub);

    let settings = settings_service::update_settings(
        &db,
        &claims.sub,
        request.into_inner(),
        &config.default_currency,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "settings": settings
    })))
}
