use crate::{
    database::{MongoDB, SERVICES},
    models::{
        page_size, CreateServiceRequest, ServiceListing, ServiceResponse, ServiceSearchQuery,
        UpdateServiceRequest,
    },
    services::handyman_service::{self, escape_regex},
    utils::{parse_object_id, AppError, AppResult},
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document, Regex};

const MAX_TITLE_LEN: usize = 120;

pub fn validate_listing(title: &str, category: &str, price: i64) -> AppResult<()> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Title must be between 1 and {} characters",
            MAX_TITLE_LEN
        )));
    }
    if category.trim().is_empty() {
        return Err(AppError::InvalidRequest("Category is required".to_string()));
    }
    if price <= 0 {
        return Err(AppError::InvalidRequest("Price must be positive".to_string()));
    }
    Ok(())
}

pub async fn create_listing(
    db: &MongoDB,
    user_id: &str,
    request: &CreateServiceRequest,
) -> AppResult<ServiceResponse> {
    validate_listing(&request.title, &request.category, request.price)?;

    // Só handymen com perfil podem anunciar serviços
    handyman_service::find_profile(db, user_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => {
                AppError::Forbidden("Create a handyman profile before listing services".to_string())
            }
            other => other,
        })?;

    let now = Utc::now().timestamp();
    let mut listing = ServiceListing {
        id: None,
        handyman_id: user_id.to_string(),
        title: request.title.trim().to_string(),
        description: request.description.clone(),
        category: request.category.trim().to_lowercase(),
        price: request.price,
        price_type: request.price_type,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<ServiceListing>(SERVICES)
        .insert_one(&listing)
        .await?;
    listing.id = result.inserted_id.as_object_id();

    log::info!("🛠️ Service '{}' listed by {}", listing.title, user_id);
    Ok(ServiceResponse::from(listing))
}

pub async fn get_listing(db: &MongoDB, service_id: &str) -> AppResult<ServiceListing> {
    let id = parse_object_id(service_id, "service")?;
    db.collection::<ServiceListing>(SERVICES)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))
}

pub fn build_search_filter(query: &ServiceSearchQuery) -> Document {
    let mut filter = doc! { "is_active": true };

    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        filter.insert("category", category.to_lowercase());
    }
    if let Some(handyman_id) = query.handyman_id.as_deref().filter(|h| !h.is_empty()) {
        filter.insert("handyman_id", handyman_id);
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        filter.insert(
            "title",
            Regex {
                pattern: escape_regex(q),
                options: "i".to_string(),
            },
        );
    }

    filter
}

pub async fn search_listings(
    db: &MongoDB,
    query: &ServiceSearchQuery,
) -> AppResult<Vec<ServiceResponse>> {
    let listings = db
        .collection::<ServiceListing>(SERVICES)
        .find(build_search_filter(query))
        .sort(doc! { "created_at": -1 })
        .skip(query.offset.unwrap_or(0))
        .limit(page_size(query.limit))
        .await?
        .try_collect::<Vec<_>>()
        .await?;

    Ok(listings.into_iter().map(ServiceResponse::from).collect())
}

pub fn build_listing_update(request: &UpdateServiceRequest) -> AppResult<Document> {
    let mut set = Document::new();

    if let Some(title) = &request.title {
        validate_listing(title, "-", 1)?;
        set.insert("title", title.trim());
    }
    if let Some(description) = &request.description {
        set.insert("description", description.as_str());
    }
    if let Some(category) = &request.category {
        if category.trim().is_empty() {
            return Err(AppError::InvalidRequest("Category is required".to_string()));
        }
        set.insert("category", category.trim().to_lowercase());
    }
    if let Some(price) = request.price {
        if price <= 0 {
            return Err(AppError::InvalidRequest("Price must be positive".to_string()));
        }
        set.insert("price", price);
    }
    if let Some(price_type) = request.price_type {
        set.insert("price_type", mongodb::bson::to_bson(&price_type)?);
    }
    if let Some(active) = request.is_active {
        set.insert("is_active", active);
    }

    if set.is_empty() {
        return Err(AppError::InvalidRequest("No fields to update".to_string()));
    }
    set.insert("updated_at", Utc::now().timestamp());
    Ok(set)
}

pub async fn update_listing(
    db: &MongoDB,
    user_id: &str,
    service_id: &str,
    request: &UpdateServiceRequest,
) -> AppResult<ServiceResponse> {
    let listing = get_listing(db, service_id).await?;
    if listing.handyman_id != user_id {
        return Err(AppError::Forbidden("You can only edit your own services".to_string()));
    }

    let set = build_listing_update(request)?;
    db.collection::<ServiceListing>(SERVICES)
        .update_one(doc! { "_id": listing.id }, doc! { "$set": set })
        .await?;

    get_listing(db, service_id).await.map(ServiceResponse::from)
}

pub async fn delete_listing(db: &MongoDB, user_id: &str, service_id: &str) -> AppResult<()> {
    let listing = get_listing(db, service_id).await?;
    if listing.handyman_id != user_id {
        return Err(AppError::Forbidden("You can only delete your own services".to_string()));
    }

    db.collection::<ServiceListing>(SERVICES)
        .delete_one(doc! { "_id": listing.id })
        .await?;
    log::info!("🗑️ Service {} deleted by {}", service_id, user_id);
    Ok(())
}
