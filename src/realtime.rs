//! In-process publish/subscribe relay for live notifications.
//!
//! Every user has a room named by their `user_id`. Opening the event stream
//! joins the room; publishing forwards an event to every receiver currently
//! joined. Nothing is queued for users who are offline: notifications are
//! persisted separately and can be listed later.

use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;

use crate::models::NotificationResponse;

/// Events buffered per room before slow subscribers start missing some
const ROOM_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum LiveEvent {
    Notification(NotificationResponse),
}

impl LiveEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LiveEvent::Notification(_) => "notification",
        }
    }

    /// Renders the event as a Server-Sent Events frame.
    pub fn to_sse_frame(&self) -> String {
        let data = match self {
            LiveEvent::Notification(n) => serde_json::to_string(n).unwrap_or_else(|_| "{}".into()),
        };
        format!("event: {}\ndata: {}\n\n", self.name(), data)
    }
}

pub struct NotificationHub {
    rooms: RwLock<HashMap<String, broadcast::Sender<LiveEvent>>>,
    capacity: usize,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::with_capacity(ROOM_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Joins the room of `user_id`, creating it on first use.
    pub fn join(&self, user_id: &str) -> broadcast::Receiver<LiveEvent> {
        if let Ok(rooms) = self.rooms.read() {
            if let Some(sender) = rooms.get(user_id) {
                return sender.subscribe();
            }
        }

        let mut rooms = match self.rooms.write() {
            Ok(rooms) => rooms,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Salas cujos streams fecharam sem nunca receber evento
        let before = rooms.len();
        rooms.retain(|_, sender| sender.receiver_count() > 0);
        if rooms.len() < before {
            log::debug!("🧹 Dropped {} empty notification room(s)", before - rooms.len());
        }
        rooms
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Forwards `event` to the room of `user_id`. Returns how many receivers got it.
    pub fn publish(&self, user_id: &str, event: LiveEvent) -> usize {
        let delivered = match self.rooms.read() {
            Ok(rooms) => match rooms.get(user_id) {
                Some(sender) => sender.send(event).unwrap_or(0),
                None => return 0,
            },
            Err(_) => return 0,
        };

        if delivered == 0 {
            self.drop_room_if_empty(user_id);
        }
        delivered
    }

    fn drop_room_if_empty(&self, user_id: &str) {
        if let Ok(mut rooms) = self.rooms.write() {
            if rooms
                .get(user_id)
                .map(|sender| sender.receiver_count() == 0)
                .unwrap_or(false)
            {
                rooms.remove(user_id);
                log::debug!("🧹 Dropped empty notification room {}", user_id);
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().map(|rooms| rooms.len()).unwrap_or(0)
    }

    pub fn subscriber_count(&self, user_id: &str) -> usize {
        self.rooms
            .read()
            .ok()
            .and_then(|rooms| rooms.get(user_id).map(|s| s.receiver_count()))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;

    fn event(message: &str) -> LiveEvent {
        LiveEvent::Notification(NotificationResponse {
            id: "n1".into(),
            kind: NotificationKind::OfferAccepted,
            title: "Offer accepted".into(),
            message: message.into(),
            data: serde_json::json!({ "offer_id": "o1" }),
            read: false,
            created_at: 0,
        })
    }

    fn message_of(event: LiveEvent) -> String {
        match event {
            LiveEvent::Notification(n) => n.message,
        }
    }

    #[tokio::test]
    async fn test_event_reaches_joined_room() {
        let hub = NotificationHub::new();
        let mut rx = hub.join("alice");

        assert_eq!(hub.publish("alice", event("hello")), 1);
        assert_eq!(message_of(rx.recv().await.unwrap()), "hello");
    }

    #[tokio::test]
    async fn test_event_fans_out_to_every_socket_in_room() {
        let hub = NotificationHub::new();
        let mut phone = hub.join("alice");
        let mut laptop = hub.join("alice");

        assert_eq!(hub.subscriber_count("alice"), 2);
        assert_eq!(hub.publish("alice", event("both")), 2);
        assert_eq!(message_of(phone.recv().await.unwrap()), "both");
        assert_eq!(message_of(laptop.recv().await.unwrap()), "both");
    }

    #[tokio::test]
    async fn test_other_rooms_do_not_receive() {
        let hub = NotificationHub::new();
        let mut bob = hub.join("bob");

        hub.join("alice");
        hub.publish("alice", event("for alice"));

        assert!(matches!(
            bob.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_publish_without_room_delivers_nothing() {
        let hub = NotificationHub::new();
        assert_eq!(hub.publish("nobody", event("lost")), 0);
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn test_room_dropped_after_last_subscriber_leaves() {
        let hub = NotificationHub::new();
        let rx = hub.join("alice");
        assert_eq!(hub.room_count(), 1);

        drop(rx);
        assert_eq!(hub.publish("alice", event("gone")), 0);
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn test_idle_rooms_swept_when_someone_joins() {
        let hub = NotificationHub::new();
        drop(hub.join("alice"));
        drop(hub.join("bob"));
        assert_eq!(hub.room_count(), 1);

        let _carol = hub.join("carol");
        assert_eq!(hub.room_count(), 1);
        assert_eq!(hub.subscriber_count("carol"), 1);
    }

    #[test]
    fn test_sse_frame_format() {
        let frame = event("hi").to_sse_frame();
        assert!(frame.starts_with("event: notification\ndata: {"));
        assert!(frame.ends_with("\n\n"));
        assert!(frame.contains("\"message\":\"hi\""));
        assert!(frame.contains("\"kind\":\"offer_accepted\""));
    }
}
