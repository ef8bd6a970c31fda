use crate::{
    database::{MongoDB, NOTIFICATIONS},
    models::{page_size, Notification, NotificationKind, NotificationListQuery, NotificationResponse},
    realtime::{LiveEvent, NotificationHub},
    utils::{parse_object_id, AppError, AppResult},
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct NotificationListResponse {
    pub success: bool,
    pub notifications: Vec<NotificationResponse>,
    pub total: u64,
    pub unread: u64,
}

/// Persists a notification and relays it to the user's live room.
pub async fn notify(
    db: &MongoDB,
    hub: &NotificationHub,
    user_id: &str,
    kind: NotificationKind,
    title: &str,
    message: &str,
    data: serde_json::Value,
) -> AppResult<NotificationResponse> {
    let mut notification = Notification {
        id: None,
        user_id: user_id.to_string(),
        kind,
        title: title.to_string(),
        message: message.to_string(),
        data,
        read: false,
        created_at: Utc::now().timestamp(),
    };

    let result = db
        .collection::<Notification>(NOTIFICATIONS)
        .insert_one(&notification)
        .await?;
    notification.id = result.inserted_id.as_object_id();

    let response = NotificationResponse::from(notification);
    let delivered = hub.publish(user_id, LiveEvent::Notification(response.clone()));
    log::debug!("🔔 {:?} for {} relayed to {} socket(s)", kind, user_id, delivered);

    Ok(response)
}

/// Fire-and-log variant for side effects of other operations.
pub async fn notify_quietly(
    db: &MongoDB,
    hub: &NotificationHub,
    user_id: &str,
    kind: NotificationKind,
    title: &str,
    message: &str,
    data: serde_json::Value,
) {
    if let Err(e) = notify(db, hub, user_id, kind, title, message, data).await {
        log::warn!("⚠️ Failed to notify {} ({:?}): {}", user_id, kind, e);
    }
}

pub async fn list_notifications(
    db: &MongoDB,
    user_id: &str,
    query: &NotificationListQuery,
) -> AppResult<NotificationListResponse> {
    let collection = db.collection::<Notification>(NOTIFICATIONS);

    let mut filter = doc! { "user_id": user_id };
    if query.unread_only.unwrap_or(false) {
        filter.insert("read", false);
    }

    let notifications: Vec<NotificationResponse> = collection
        .find(filter.clone())
        .sort(doc! { "created_at": -1 })
        .skip(query.offset.unwrap_or(0))
        .limit(page_size(query.limit))
        .await?
        .try_collect::<Vec<_>>()
        .await?
        .into_iter()
        .map(NotificationResponse::from)
        .collect();

    let total = collection.count_documents(filter).await?;
    let unread = collection
        .count_documents(doc! { "user_id": user_id, "read": false })
        .await?;

    Ok(NotificationListResponse {
        success: true,
        notifications,
        total,
        unread,
    })
}

pub async fn mark_read(db: &MongoDB, user_id: &str, notification_id: &str) -> AppResult<()> {
    let id = parse_object_id(notification_id, "notification")?;
    let result = db
        .collection::<Notification>(NOTIFICATIONS)
        .update_one(
            doc! { "_id": id, "user_id": user_id },
            doc! { "$set": { "read": true } },
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(())
}

pub async fn mark_all_read(db: &MongoDB, user_id: &str) -> AppResult<u64> {
    let result = db
        .collection::<Notification>(NOTIFICATIONS)
        .update_many(
            doc! { "user_id": user_id, "read": false },
            doc! { "$set": { "read": true } },
        )
        .await?;
    Ok(result.modified_count)
}

pub async fn delete_notification(db: &MongoDB, user_id: &str, notification_id: &str) -> AppResult<()> {
    let id = parse_object_id(notification_id, "notification")?;
    let result = db
        .collection::<Notification>(NOTIFICATIONS)
        .delete_one(doc! { "_id": id, "user_id": user_id })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(())
}
