use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Handyman Marketplace API",
        version = "1.0.0",
        description = "Backend for a marketplace where clients hire handymen.\n\n**Authentication:** protected endpoints take a JWT Bearer token. Each request slides the session's idle window forward.\n\n**Flow:** client sends an offer, handyman accepts, client pays through a payment intent, handyman completes, client reviews.\n\n**Live updates:** `GET /api/v1/notifications/stream` (Server-Sent Events).",
        contact(
            name = "Handyman Marketplace Team",
            email = "support@handyman-marketplace.example"
        )
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::logout,
        crate::api::auth::verify_token,

        // Users
        crate::api::users::get_me,
        crate::api::users::update_me,
        crate::api::users::delete_me,
        crate::api::users::get_user,

        // Handymen
        crate::api::handymen::create_profile,
        crate::api::handymen::update_profile,
        crate::api::handymen::search,
        crate::api::handymen::get_profile,
        crate::api::handymen::list_services,
        crate::api::handymen::list_reviews,

        // Services
        crate::api::listings::create_service,
        crate::api::listings::search_services,
        crate::api::listings::get_service,
        crate::api::listings::update_service,
        crate::api::listings::delete_service,

        // Offers
        crate::api::offers::create_offer,
        crate::api::offers::list_offers,
        crate::api::offers::get_offer,
        crate::api::offers::accept_offer,
        crate::api::offers::decline_offer,
        crate::api::offers::cancel_offer,
        crate::api::offers::complete_offer,

        // Payments
        crate::api::payments::create_intent,
        crate::api::payments::confirm,
        crate::api::payments::webhook,

        // Notifications
        crate::api::notifications::list,
        crate::api::notifications::mark_read,
        crate::api::notifications::mark_all_read,
        crate::api::notifications::delete,
        crate::api::notifications::stream,

        // Reviews
        crate::api::reviews::create_review,
        crate::api::reviews::delete_review,

        // Settings
        crate::api::settings::get_settings,
        crate::api::settings::update_settings,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::VerifyTokenResponse,
            crate::models::UserType,
            crate::models::UserInfo,
            crate::models::PublicUser,
            crate::models::UpdateUserRequest,
            crate::models::CreateHandymanRequest,
            crate::models::UpdateHandymanRequest,
            crate::models::HandymanResponse,
            crate::models::PriceType,
            crate::models::CreateServiceRequest,
            crate::models::UpdateServiceRequest,
            crate::models::ServiceResponse,
            crate::models::OfferStatus,
            crate::models::CreateOfferRequest,
            crate::models::OfferResponse,
            crate::services::payment_service::PaymentIntentRequest,
            crate::services::payment_service::PaymentIntentResponse,
            crate::models::NotificationKind,
            crate::models::NotificationResponse,
            crate::services::notification_service::NotificationListResponse,
            crate::models::CreateReviewRequest,
            crate::models::ReviewResponse,
            crate::models::UserSettings,
            crate::models::UpdateSettingsRequest,
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and session management."),
        (name = "Users", description = "Own account and public user profiles."),
        (name = "Handymen", description = "Handyman profiles, search, their listings and reviews."),
        (name = "Services", description = "Service listings offered by handymen."),
        (name = "Offers", description = "Offer lifecycle: pending, accepted, payment_pending, paid, completed."),
        (name = "Payments", description = "Payment intents for accepted offers and the provider webhook."),
        (name = "Notifications", description = "Stored notifications and the live event stream."),
        (name = "Reviews", description = "Ratings for paid or completed jobs."),
        (name = "Settings", description = "Per-user preferences."),
        (name = "Health", description = "Health check and metrics for monitoring."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/v1/auth/login"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_marketplace_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/v1/offers/{id}/accept"));
        assert!(paths.contains_key("/api/v1/payments/intent"));
        assert!(paths.contains_key("/api/v1/notifications/stream"));
        assert!(doc
            .components
            .as_ref()
            .map(|c| c.schemas.contains_key("NotificationListResponse"))
            .unwrap_or(false));
        assert!(doc
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("bearer_auth"))
            .unwrap_or(false));
    }
}
