use crate::{
    database::{MongoDB, HANDYMEN},
    models::{
        normalize_skills, page_size, CreateHandymanRequest, HandymanProfile, HandymanResponse,
        HandymanSearchQuery, UpdateHandymanRequest, UserType,
    },
    services::user_service,
    utils::{AppError, AppResult},
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document, Regex};

fn validate_rate(rate: Option<i64>) -> AppResult<()> {
    match rate {
        Some(r) if r <= 0 => Err(AppError::InvalidRequest(
            "Hourly rate must be positive".to_string(),
        )),
        _ => Ok(()),
    }
}

pub async fn find_profile(db: &MongoDB, handyman_id: &str) -> AppResult<HandymanProfile> {
    db.collection::<HandymanProfile>(HANDYMEN)
        .find_one(doc! { "user_id": handyman_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Handyman not found".to_string()))
}

pub async fn create_profile(
    db: &MongoDB,
    user_id: &str,
    request: &CreateHandymanRequest,
) -> AppResult<HandymanResponse> {
    let user = user_service::find_user(db, user_id).await?;
    if user.user_type != UserType::Handyman {
        return Err(AppError::Forbidden(
            "Only handyman accounts can create a handyman profile".to_string(),
        ));
    }
    validate_rate(request.hourly_rate)?;

    let now = Utc::now().timestamp();
    let display_name = request
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(user.name.as_str())
        .to_string();

    let profile = HandymanProfile {
        user_id: user.user_id,
        display_name,
        bio: request.bio.clone(),
        skills: normalize_skills(&request.skills),
        city: request.city.as_deref().map(|c| c.trim().to_string()),
        hourly_rate: request.hourly_rate,
        is_available: true,
        rating_total: 0,
        review_count: 0,
        rating_avg: 0.0,
        created_at: now,
        updated_at: now,
    };

    db.collection::<HandymanProfile>(HANDYMEN)
        .insert_one(&profile)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Handyman profile already exists".to_string()),
            other => other,
        })?;

    log::info!("🧰 Handyman profile created for {}", user_id);
    Ok(HandymanResponse::from(profile))
}

pub fn build_profile_update(request: &UpdateHandymanRequest) -> AppResult<Document> {
    validate_rate(request.hourly_rate)?;

    let mut set = Document::new();
    if let Some(name) = &request.display_name {
        if name.trim().is_empty() {
            return Err(AppError::InvalidRequest("Display name cannot be empty".to_string()));
        }
        set.insert("display_name", name.trim());
    }
    if let Some(bio) = &request.bio {
        set.insert("bio", bio.as_str());
    }
    if let Some(skills) = &request.skills {
        set.insert("skills", normalize_skills(skills));
    }
    if let Some(city) = &request.city {
        set.insert("city", city.trim());
    }
    if let Some(rate) = request.hourly_rate {
        set.insert("hourly_rate", rate);
    }
    if let Some(available) = request.is_available {
        set.insert("is_available", available);
    }

    if set.is_empty() {
        return Err(AppError::InvalidRequest("No fields to update".to_string()));
    }
    set.insert("updated_at", Utc::now().timestamp());
    Ok(set)
}

pub async fn update_profile(
    db: &MongoDB,
    user_id: &str,
    request: &UpdateHandymanRequest,
) -> AppResult<HandymanResponse> {
    let set = build_profile_update(request)?;

    let result = db
        .collection::<HandymanProfile>(HANDYMEN)
        .update_one(doc! { "user_id": user_id }, doc! { "$set": set })
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::NotFound("Handyman profile not found".to_string()));
    }

    find_profile(db, user_id).await.map(HandymanResponse::from)
}

pub fn build_search_filter(query: &HandymanSearchQuery) -> Document {
    let mut filter = Document::new();

    if let Some(skill) = query.skill.as_deref().map(|s| s.trim().to_lowercase()) {
        if !skill.is_empty() {
            filter.insert("skills", skill);
        }
    }
    if let Some(city) = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        filter.insert(
            "city",
            Regex {
                pattern: format!("^{}$", escape_regex(city)),
                options: "i".to_string(),
            },
        );
    }
    if let Some(min_rating) = query.min_rating {
        filter.insert("rating_avg", doc! { "$gte": min_rating });
    }
    if let Some(available) = query.available {
        filter.insert("is_available", available);
    }

    filter
}

pub async fn search_profiles(
    db: &MongoDB,
    query: &HandymanSearchQuery,
) -> AppResult<Vec<HandymanResponse>> {
    let profiles = db
        .collection::<HandymanProfile>(HANDYMEN)
        .find(build_search_filter(query))
        .sort(doc! { "rating_avg": -1, "review_count": -1 })
        .skip(query.offset.unwrap_or(0))
        .limit(page_size(query.limit))
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    Ok(profiles.into_iter().map(HandymanResponse::from).collect())
}

/// Escapes regex metacharacters so user input matches literally.
pub fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
