pub mod auth;
pub mod handymen;
pub mod health;
pub mod listings;
pub mod metrics;
pub mod notifications;
pub mod offers;
pub mod payments;
pub mod reviews;
pub mod settings;
pub mod swagger;
pub mod users;
