use serde::{Deserialize, Serialize};

/// Handyman profile, keyed by the owning user's `user_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandymanProfile {
    pub user_id: String,
    pub display_name: String,
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub city: Option<String>,
    /// Minor currency units per hour
    pub hourly_rate: Option<i64>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub rating_total: i64,
    #[serde(default)]
    pub review_count: i64,
    #[serde(default)]
    pub rating_avg: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateHandymanRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub city: Option<String>,
    pub hourly_rate: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateHandymanRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub city: Option<String>,
    pub hourly_rate: Option<i64>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct HandymanSearchQuery {
    pub skill: Option<String>,
    pub city: Option<String>,
    pub min_rating: Option<f64>,
    pub available: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HandymanResponse {
    pub id: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub city: Option<String>,
    pub hourly_rate: Option<i64>,
    pub is_available: bool,
    pub rating: f64,
    pub review_count: i64,
    pub created_at: i64,
}

impl From<HandymanProfile> for HandymanResponse {
    fn from(profile: HandymanProfile) -> Self {
        HandymanResponse {
            id: profile.user_id,
            display_name: profile.display_name,
            bio: profile.bio,
            skills: profile.skills,
            city: profile.city,
            hourly_rate: profile.hourly_rate,
            is_available: profile.is_available,
            rating: (profile.rating_avg * 10.0).round() / 10.0,
            review_count: profile.review_count,
            created_at: profile.created_at,
        }
    }
}

/// Lower-cases, trims and de-duplicates skills so that searches match reliably.
pub fn normalize_skills(skills: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_skills() {
        let skills = vec![
            " Plumbing".to_string(),
            "plumbing".to_string(),
            "".to_string(),
            "Electrical ".to_string(),
        ];
        assert_eq!(normalize_skills(&skills), vec!["electrical", "plumbing"]);
    }

    #[test]
    fn test_response_rounds_rating() {
        let profile = HandymanProfile {
            user_id: "u1".into(),
            display_name: "Bob".into(),
            bio: None,
            skills: vec![],
            city: None,
            hourly_rate: Some(4500),
            is_available: true,
            rating_total: 14,
            review_count: 3,
            rating_avg: 14.0 / 3.0,
            created_at: 0,
            updated_at: 0,
        };
        let response = HandymanResponse::from(profile);
        assert_eq!(response.rating, 4.7);
        assert_eq!(response.id, "u1");
    }
}
