pub mod auth_service;
pub mod handyman_service;
pub mod listing_service;
pub mod notification_service;
pub mod offer_service;
pub mod payment_service;
pub mod review_service;
pub mod session_service;
pub mod settings_service;
pub mod user_service;
