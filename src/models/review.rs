use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
pub const MAX_COMMENT_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub handyman_id: String,
    pub client_id: String,
    pub offer_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateReviewRequest {
    pub offer_id: String,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub id: String,
    pub handyman_id: String,
    pub client_id: String,
    pub offer_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: i64,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        ReviewResponse {
            id: review.id.map(|id| id.to_hex()).unwrap_or_default(),
            handyman_id: review.handyman_id,
            client_id: review.client_id,
            offer_id: review.offer_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}
