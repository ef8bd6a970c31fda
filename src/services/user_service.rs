use crate::{
    database::{MongoDB, HANDYMEN, NOTIFICATIONS, OFFERS, SERVICES, SETTINGS, USERS},
    models::{OfferStatus, PublicUser, UpdateUserRequest, User, UserInfo},
    services::session_service,
    utils::{AppError, AppResult},
};
use chrono::Utc;
use mongodb::bson::{doc, Document};

pub async fn find_user(db: &MongoDB, user_id: &str) -> AppResult<User> {
    db.collection::<User>(USERS)
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn get_current_user(db: &MongoDB, user_id: &str) -> AppResult<UserInfo> {
    find_user(db, user_id).await.map(UserInfo::from)
}

pub async fn get_public_user(db: &MongoDB, user_id: &str) -> AppResult<PublicUser> {
    let user = find_user(db, user_id).await?;
    if !user.is_active {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(PublicUser::from(user))
}

pub fn build_user_update(request: &UpdateUserRequest) -> AppResult<Document> {
    let mut set = Document::new();

    if let Some(name) = &request.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidRequest("Name cannot be empty".to_string()));
        }
        set.insert("name", name);
    }
    if let Some(phone) = &request.phone {
        set.insert("phone", phone.trim());
    }
    if let Some(avatar_url) = &request.avatar_url {
        set.insert("avatar_url", avatar_url.trim());
    }

    if set.is_empty() {
        return Err(AppError::InvalidRequest("No fields to update".to_string()));
    }
    set.insert("updated_at", Utc::now().timestamp());
    Ok(set)
}

pub async fn update_current_user(
    db: &MongoDB,
    user_id: &str,
    request: &UpdateUserRequest,
) -> AppResult<UserInfo> {
    let set = build_user_update(request)?;

    let result = db
        .collection::<User>(USERS)
        .update_one(doc! { "user_id": user_id }, doc! { "$set": set })
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    // Mantém o display name do perfil de handyman em sincronia com o nome da conta
    if let Some(name) = &request.name {
        db.collection::<Document>(HANDYMEN)
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$set": { "display_name": name.trim() } },
            )
            .await?;
    }

    get_current_user(db, user_id).await
}

/// Deletes the account and the data it owns. Offers still in flight block deletion.
pub async fn delete_user_account(db: &MongoDB, user_id: &str) -> AppResult<()> {
    log::info!("🗑️ Deleting account for user_id: {}", user_id);

    let in_flight = db
        .collection::<Document>(OFFERS)
        .count_documents(doc! {
            "$or": [ { "client_id": user_id }, { "handyman_id": user_id } ],
            "status": { "$in": [
                OfferStatus::Accepted.as_str(),
                OfferStatus::PaymentPending.as_str(),
                OfferStatus::Paid.as_str(),
            ] },
        })
        .await?;
    if in_flight > 0 {
        return Err(AppError::Conflict(format!(
            "Account has {} offer(s) in progress",
            in_flight
        )));
    }

    let deleted = db
        .collection::<User>(USERS)
        .delete_one(doc! { "user_id": user_id })
        .await?;
    if deleted.deleted_count == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let handymen = db
        .collection::<Document>(HANDYMEN)
        .delete_many(doc! { "user_id": user_id })
        .await?;
    let services = db
        .collection::<Document>(SERVICES)
        .delete_many(doc! { "handyman_id": user_id })
        .await?;
    let notifications = db
        .collection::<Document>(NOTIFICATIONS)
        .delete_many(doc! { "user_id": user_id })
        .await?;
    db.collection::<Document>(SETTINGS)
        .delete_many(doc! { "user_id": user_id })
        .await?;
    let sessions = session_service::end_all_sessions(db, user_id).await?;

    // Offers e reviews ficam: também são histórico da outra parte
    log::info!(
        "✅ Account {} deleted ({} profile, {} services, {} notifications, {} sessions)",
        user_id,
        handymen.deleted_count,
        services.deleted_count,
        notifications.deleted_count,
        sessions
    );
    Ok(())
}
