pub mod handyman;
pub mod notification;
pub mod offer;
pub mod review;
pub mod service;
pub mod session;
pub mod settings;
pub mod user;

pub use handyman::*;
pub use notification::*;
pub use offer::*;
pub use review::*;
pub use service::*;
pub use session::*;
pub use settings::*;
pub use user::*;

use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<u64>,
}

/// Clamps a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn page_size(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}
