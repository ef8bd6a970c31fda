use crate::{
    config::AuthConfig,
    database::{MongoDB, SESSIONS},
    models::Session,
    utils::{AppError, AppResult},
};
use chrono::Utc;
use mongodb::bson::doc;
use uuid::Uuid;

pub async fn create_session(db: &MongoDB, config: &AuthConfig, user_id: &str) -> AppResult<Session> {
    let session = Session::new(
        Uuid::new_v4().to_string(),
        user_id.to_string(),
        Utc::now().timestamp(),
        config.session_ttl_minutes * 60,
    );

    db.collection::<Session>(SESSIONS).insert_one(&session).await?;
    log::debug!("🔑 Session {} opened for user {}", session.session_id, user_id);

    Ok(session)
}

/// Loads the session, rejects it when the idle window has lapsed, and
/// otherwise slides the window forward.
pub async fn touch_session(
    db: &MongoDB,
    config: &AuthConfig,
    session_id: &str,
    user_id: &str,
) -> AppResult<Session> {
    let collection = db.collection::<Session>(SESSIONS);
    let now = Utc::now().timestamp();

    let mut session = collection
        .find_one(doc! { "session_id": session_id })
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session not found".to_string()))?;

    if session.user_id != user_id {
        return Err(AppError::Unauthorized("Session does not match token".to_string()));
    }

    if session.is_expired(now) {
        collection.delete_one(doc! { "session_id": session_id }).await?;
        log::info!("⌛ Session {} expired for user {}", session_id, user_id);
        return Err(AppError::Unauthorized("Session expired".to_string()));
    }

    session.slide(now, config.session_ttl_minutes * 60);

    collection
        .update_one(
            doc! { "session_id": session_id },
            doc! { "$set": {
                "last_seen_at": session.last_seen_at,
                "expires_at": session.expires_at,
            } },
        )
        .await?;

    Ok(session)
}

pub async fn end_session(db: &MongoDB, session_id: &str) -> AppResult<()> {
    db.collection::<Session>(SESSIONS)
        .delete_one(doc! { "session_id": session_id })
        .await?;
    log::debug!("🔒 Session {} closed", session_id);
    Ok(())
}

pub async fn end_all_sessions(db: &MongoDB, user_id: &str) -> AppResult<u64> {
    let result = db
        .collection::<Session>(SESSIONS)
        .delete_many(doc! { "user_id": user_id })
        .await?;
    Ok(result.deleted_count)
}

pub async fn purge_expired(db: &MongoDB) -> AppResult<u64> {
    let result = db
        .collection::<Session>(SESSIONS)
        .delete_many(doc! { "expires_at": { "$lte": Utc::now().timestamp() } })
        .await?;
    Ok(result.deleted_count)
}
