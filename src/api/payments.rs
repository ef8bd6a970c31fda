use actix_web::{web, HttpRequest, HttpResponse};

use crate::{
    api::metrics,
    config::AppConfig,
    database::MongoDB,
    models::OfferResponse,
    realtime::NotificationHub,
    services::{
        auth_service::Claims,
        payment_service::{self, PaymentIntentRequest, PaymentIntentResponse},
    },
    stripe::PaymentProvider,
    utils::AppError,
};

#[utoipa::path(
    post,
    path = "/api/v1/payments/intent",
    tag = "Payments",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Client secret for the accepted offer", body = PaymentIntentResponse),
        (status = 400, description = "Invalid offer ID"),
        (status = 409, description = "Offer is not accepted"),
        (status = 502, description = "Payment provider error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_intent(
    db: web::Data<MongoDB>,
    provider: web::Data<dyn PaymentProvider>,
    claims: web::ReqData<Claims>,
    request: web::Json<PaymentIntentRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("💳 POST /payments/intent - offer: {} client: {}", request.offer_id, claims.sub);

    let intent =
        payment_service::create_payment_intent(&db, provider.get_ref(), &claims.sub, &request.offer_id)
            .await?;

    Ok(HttpResponse::Ok().json(intent))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/confirm",
    tag = "Payments",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Offer paid", body = OfferResponse),
        (status = 400, description = "Payment not completed or does not match"),
        (status = 409, description = "No payment started")
    ),
    security(("bearer_auth" = []))
)]
pub async fn confirm(
    db: web::Data<MongoDB>,
    provider: web::Data<dyn PaymentProvider>,
    hub: web::Data<NotificationHub>,
    claims: web::ReqData<Claims>,
    request: web::Json<PaymentIntentRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("💳 POST /payments/confirm - offer: {} client: {}", request.offer_id, claims.sub);

    let offer = payment_service::confirm_payment(
        &db,
        provider.get_ref(),
        &hub,
        &claims.sub,
        &request.offer_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "offer": offer
    })))
}

/// Provider callback. Authenticated by the `Stripe-Signature` header, not a session.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    tag = "Payments",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Event received"),
        (status = 400, description = "Bad signature or payload")
    )
)]
pub async fn webhook(
    db: web::Data<MongoDB>,
    hub: web::Data<NotificationHub>,
    config: web::Data<AppConfig>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok());

    let outcome = match payment_service::handle_webhook(
        &db,
        &hub,
        &config.stripe.webhook_secret,
        signature,
        &body,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("❌ Webhook rejected: {}", e);
            return Err(e);
        }
    };

    if outcome.handled {
        metrics::increment_payment_events();
    }
    Ok(HttpResponse::Ok().json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;
    use crate::services::payment_service::tests::RecordingProvider;
    use actix_web::{dev::Service, http::StatusCode, test, App, HttpMessage};
    use std::sync::{atomic::Ordering, Arc};

    fn client_claims() -> Claims {
        Claims {
            sub: "client-1".into(),
            email: "client@example.com".into(),
            user_type: UserType::Client,
            sid: "session-1".into(),
            iat: 0,
            exp: usize::MAX,
            aud: "handyman-api".into(),
            iss: "handyman-service".into(),
        }
    }

    #[actix_web::test]
    async fn test_intent_with_invalid_offer_id_is_bad_request() {
        let db = MongoDB::unconnected("mongodb://127.0.0.1:1/handyman_test").await;
        let provider = Arc::new(RecordingProvider::default());
        let provider_data: web::Data<dyn PaymentProvider> =
            web::Data::from(provider.clone() as Arc<dyn PaymentProvider>);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(provider_data)
                .wrap_fn(|req, srv| {
                    req.extensions_mut().insert(client_claims());
                    srv.call(req)
                })
                .route("/api/v1/payments/intent", web::post().to(create_intent)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/payments/intent")
            .set_json(serde_json::json!({ "offer_id": "not-an-object-id" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid offer ID");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_webhook_without_signature_is_bad_request() {
        let db = MongoDB::unconnected("mongodb://127.0.0.1:1/handyman_test").await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(NotificationHub::new()))
                .app_data(web::Data::new(AppConfig::for_tests()))
                .route("/api/v1/payments/webhook", web::post().to(webhook)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/payments/webhook")
            .set_payload(r#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{}}}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
