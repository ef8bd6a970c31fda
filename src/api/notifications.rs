use actix_web::{web, HttpResponse};
use futures::stream::{self, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    database::MongoDB,
    models::NotificationListQuery,
    realtime::{LiveEvent, NotificationHub},
    services::{
        auth_service::Claims,
        notification_service::{self, NotificationListResponse},
    },
    utils::AppError,
};

/// Comment frame sent when the room is idle so proxies keep the stream open
const KEEP_ALIVE: Duration = Duration::from_secs(25);

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    params(
        ("unread_only" = Option<bool>, Query, description = "Only unread notifications"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"),
        ("offset" = Option<u64>, Query, description = "Items to skip")
    ),
    responses((status = 200, description = "Notifications with unread count", body = NotificationListResponse)),
    security(("bearer_auth" = []))
)]
pub async fn list(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    query: web::Query<NotificationListQuery>,
) -> Result<HttpResponse, AppError> {
    let response = notification_service::list_notifications(&db, &claims.sub, &query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    notification_service::mark_read(&db, &claims.sub, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    responses((status = 200, description = "All notifications marked as read")),
    security(("bearer_auth" = []))
)]
pub async fn mark_all_read(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let updated = notification_service::mark_all_read(&db, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "updated": updated
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    tag = "Notifications",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    notification_service::delete_notification(&db, &claims.sub, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

/// Turns a room subscription into SSE frames. Lagging receivers skip what
/// they missed; the stream ends when the room is gone.
fn event_frames(
    rx: broadcast::Receiver<LiveEvent>,
) -> impl futures::Stream<Item = Result<web::Bytes, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match tokio::time::timeout(KEEP_ALIVE, rx.recv()).await {
                Err(_) => return Some((Ok(web::Bytes::from_static(b": keep-alive\n\n")), rx)),
                Ok(Ok(event)) => return Some((Ok(web::Bytes::from(event.to_sse_frame())), rx)),
                Ok(Err(RecvError::Lagged(skipped))) => {
                    log::warn!("⚠️ Live stream lagged, {} event(s) skipped", skipped);
                }
                Ok(Err(RecvError::Closed)) => return None,
            }
        }
    })
}

/// Joins the caller's room and relays live events as Server-Sent Events.
/// Browsers' EventSource can pass the token as `?access_token=`.
#[utoipa::path(
    get,
    path = "/api/v1/notifications/stream",
    tag = "Notifications",
    responses((status = 200, description = "text/event-stream of notification events")),
    security(("bearer_auth" = []))
)]
pub async fn stream(hub: web::Data<NotificationHub>, claims: web::ReqData<Claims>) -> HttpResponse {
    let rx = hub.join(&claims.sub);
    log::info!(
        "📡 Live stream opened for {} ({} subscriber(s))",
        claims.sub,
        hub.subscriber_count(&claims.sub)
    );

    let hello = stream::once(async { Ok::<_, Infallible>(web::Bytes::from_static(b": connected\n\n")) });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(hello.chain(event_frames(rx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationKind, NotificationResponse};

    fn sample() -> NotificationResponse {
        NotificationResponse {
            id: "n1".into(),
            kind: NotificationKind::OfferCreated,
            title: "New offer".into(),
            message: "You received a new offer".into(),
            data: serde_json::json!({ "offer_id": "o1" }),
            read: false,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn test_published_events_become_frames() {
        let hub = NotificationHub::new();
        let rx = hub.join("u1");
        let mut frames = Box::pin(event_frames(rx));

        assert_eq!(hub.publish("u1", LiveEvent::Notification(sample())), 1);

        let frame = frames.next().await.unwrap().unwrap();
        let text = std::str::from_utf8(&frame).unwrap();
        assert!(text.starts_with("event: notification\ndata: "));
        assert!(text.contains("\"offer_id\":\"o1\""));
        assert!(text.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn test_stream_ends_when_room_closes() {
        let (tx, rx) = broadcast::channel::<LiveEvent>(4);
        drop(tx);
        let mut frames = Box::pin(event_frames(rx));
        assert!(frames.next().await.is_none());
    }
}
