use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::{
    config::AppConfig,
    database::MongoDB,
    services::{auth_service, session_service},
    utils::AppError,
};

pub use crate::services::auth_service::Claims;

/// Requires a valid bearer token backed by a live session. On success the
/// session window slides forward and `Claims` are inserted for handlers.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

/// Token from `Authorization: Bearer ...`, or `?access_token=` for clients
/// (EventSource) that cannot set headers.
pub fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(value) = req.headers().get("Authorization") {
        return value
            .to_str()
            .ok()
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());
    }

    req.query_string()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "access_token")
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|token| token.into_owned())
        .filter(|token| !token.is_empty())
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = extract_token(&req)
                .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

            let config = req
                .app_data::<web::Data<AppConfig>>()
                .cloned()
                .ok_or_else(|| AppError::Internal("AppConfig not registered".to_string()))?;
            let db = req
                .app_data::<web::Data<MongoDB>>()
                .cloned()
                .ok_or_else(|| AppError::Internal("MongoDB not registered".to_string()))?;

            let claims = auth_service::verify_token(&config.auth, &token)?;
            session_service::touch_session(&db, &config.auth, &claims.sid, &claims.sub).await?;

            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App, HttpResponse};

    async fn protected() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    /// Middleware rejections surface as service errors, not responses
    async fn status_of<S, R, B>(app: &S, req: R) -> StatusCode
    where
        S: Service<R, Response = ServiceResponse<B>, Error = Error>,
    {
        match test::try_call_service(app, req).await {
            Ok(resp) => resp.status(),
            Err(e) => e.as_response_error().status_code(),
        }
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppConfig::for_tests()))
                .service(
                    web::scope("/private")
                        .wrap(AuthMiddleware)
                        .route("", web::get().to(protected)),
                ),
        )
        .await;

        let req = test::TestRequest::get().uri("/private").to_request();
        assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_forged_token_is_unauthorized() {
        let db = MongoDB::unconnected("mongodb://127.0.0.1:1/handyman_test").await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppConfig::for_tests()))
                .app_data(web::Data::new(db))
                .service(
                    web::scope("/private")
                        .wrap(AuthMiddleware)
                        .route("", web::get().to(protected)),
                ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header(("Authorization", "Bearer not.a.jwt"))
            .to_request();
        assert_eq!(status_of(&app, req).await, StatusCode::UNAUTHORIZED);
    }

    #[::core::prelude::v1::test]
    fn test_token_from_header_or_query() {
        let req = test::TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def.ghi"))
            .to_srv_request();
        assert_eq!(extract_token(&req).as_deref(), Some("abc.def.ghi"));

        let req = test::TestRequest::with_uri("/stream?x=1&access_token=abc%2Edef").to_srv_request();
        assert_eq!(extract_token(&req).as_deref(), Some("abc.def"));

        let req = test::TestRequest::default()
            .insert_header(("Authorization", "Basic Zm9vOmJhcg=="))
            .to_srv_request();
        assert_eq!(extract_token(&req), None);
    }
}
