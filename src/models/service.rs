use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    Fixed,
    Hourly,
}

/// A listing a handyman offers to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListing {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub handyman_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    /// Minor currency units (per job or per hour depending on `price_type`)
    pub price: i64,
    pub price_type: PriceType,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateServiceRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub price: i64,
    pub price_type: PriceType,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateServiceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<i64>,
    pub price_type: Option<PriceType>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceSearchQuery {
    pub category: Option<String>,
    pub handyman_id: Option<String>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ServiceResponse {
    pub id: String,
    pub handyman_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub price: i64,
    pub price_type: PriceType,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<ServiceListing> for ServiceResponse {
    fn from(listing: ServiceListing) -> Self {
        ServiceResponse {
            id: listing.id.map(|id| id.to_hex()).unwrap_or_default(),
            handyman_id: listing.handyman_id,
            title: listing.title,
            description: listing.description,
            category: listing.category,
            price: listing.price,
            price_type: listing.price_type,
            is_active: listing.is_active,
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        }
    }
}
