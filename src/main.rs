mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod realtime;
mod services;
mod stripe;
mod utils;

use actix_cors::Cors;
use actix_web::{dev::Service, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppConfig,
    realtime::NotificationHub,
    stripe::{PaymentProvider, StripeClient},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    log::info!("🚀 Starting Handyman Marketplace Service...");

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.database_url).await.map_err(|e| {
        log::error!("❌ Failed to connect to MongoDB: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
    })?;
    log::info!("✅ MongoDB connected successfully");

    let stripe = StripeClient::new(&config.stripe)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let provider: Arc<dyn PaymentProvider> = Arc::new(stripe);

    let db_data = web::Data::new(db.clone());
    let config_data = web::Data::new(config.clone());
    let hub_data = web::Data::new(NotificationHub::new());
    let provider_data: web::Data<dyn PaymentProvider> = web::Data::from(provider);

    log::info!("📅 Starting background jobs...");
    jobs::session_cleanup::start_session_cleanup(db);
    log::info!("✅ Background jobs started");

    let bind_addr = format!("{}:{}", config.host, config.port);
    log::info!("🌐 Server starting on {}", bind_addr);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_addr);
    log::info!("📄 OpenAPI spec at: http://{}/api-docs/openapi.json", bind_addr);

    let cors_origins = config.cors_origins.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CACHE_CONTROL,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(hub_data.clone())
            .app_data(provider_data.clone())
            .app_data(utils::json_config())
            .app_data(utils::query_config())
            .app_data(utils::path_config())
            .wrap_fn(|req, srv| {
                api::metrics::increment_request_count();
                let fut = srv.call(req);
                async move {
                    let res = fut.await;
                    match &res {
                        Ok(response) if response.status().is_client_error() || response.status().is_server_error() => {
                            api::metrics::increment_error_count();
                        }
                        Err(_) => api::metrics::increment_error_count(),
                        _ => {}
                    }
                    res
                }
            })
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))

            // ==================== AUTH & USERS ====================

            .service(
                web::scope("/api/v1/auth")
                    .route("/register", web::post().to(api::auth::register))
                    .route("/login", web::post().to(api::auth::login))
                    .service(
                        web::scope("")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("/logout", web::post().to(api::auth::logout))
                            .route("/verify", web::get().to(api::auth::verify_token))
                    )
            )
            .service(
                web::scope("/api/v1/users")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/me", web::get().to(api::users::get_me))
                    .route("/me", web::put().to(api::users::update_me))
                    .route("/me", web::delete().to(api::users::delete_me))
                    .route("/{user_id}", web::get().to(api::users::get_user))
            )

            // ==================== MARKETPLACE CATALOG ====================

            .service(
                web::scope("/api/v1/handymen")
                    // Protected: own profile
                    .service(
                        web::resource("")
                            .route(web::get().to(api::handymen::search))
                            .route(
                                web::post()
                                    .to(api::handymen::create_profile)
                                    .wrap(middleware::auth::AuthMiddleware)
                            )
                    )
                    .service(
                        web::resource("/me")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route(web::put().to(api::handymen::update_profile))
                    )
                    // Public
                    .route("/{id}", web::get().to(api::handymen::get_profile))
                    .route("/{id}/services", web::get().to(api::handymen::list_services))
                    .route("/{id}/reviews", web::get().to(api::handymen::list_reviews))
            )
            .service(
                web::scope("/api/v1/services")
                    .service(
                        web::resource("")
                            .route(web::get().to(api::listings::search_services))
                            .route(
                                web::post()
                                    .to(api::listings::create_service)
                                    .wrap(middleware::auth::AuthMiddleware)
                            )
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(api::listings::get_service))
                            .route(
                                web::put()
                                    .to(api::listings::update_service)
                                    .wrap(middleware::auth::AuthMiddleware)
                            )
                            .route(
                                web::delete()
                                    .to(api::listings::delete_service)
                                    .wrap(middleware::auth::AuthMiddleware)
                            )
                    )
            )

            // ==================== OFFERS & PAYMENTS ====================

            .service(
                web::scope("/api/v1/offers")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::post().to(api::offers::create_offer))
                    .route("", web::get().to(api::offers::list_offers))
                    .route("/{id}", web::get().to(api::offers::get_offer))
                    .route("/{id}/accept", web::post().to(api::offers::accept_offer))
                    .route("/{id}/decline", web::post().to(api::offers::decline_offer))
                    .route("/{id}/cancel", web::post().to(api::offers::cancel_offer))
                    .route("/{id}/complete", web::post().to(api::offers::complete_offer))
            )
            .service(
                web::scope("/api/v1/payments")
                    // Signed by the provider, no session
                    .route("/webhook", web::post().to(api::payments::webhook))
                    .service(
                        web::scope("")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("/intent", web::post().to(api::payments::create_intent))
                            .route("/confirm", web::post().to(api::payments::confirm))
                    )
            )

            // ==================== ENGAGEMENT ====================

            .service(
                web::scope("/api/v1/notifications")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::get().to(api::notifications::list))
                    .route("/stream", web::get().to(api::notifications::stream))
                    .route("/read-all", web::post().to(api::notifications::mark_all_read))
                    .route("/{id}/read", web::post().to(api::notifications::mark_read))
                    .route("/{id}", web::delete().to(api::notifications::delete))
            )
            .service(
                web::scope("/api/v1/reviews")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::post().to(api::reviews::create_review))
                    .route("/{id}", web::delete().to(api::reviews::delete_review))
            )
            .service(
                web::scope("/api/v1/settings")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("", web::get().to(api::settings::get_settings))
                    .route("", web::put().to(api::settings::update_settings))
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
