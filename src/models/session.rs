use serde::{Deserialize, Serialize};

/// Server-side half of a session token. The JWT names it through its `sid` claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub created_at: i64,
    pub last_seen_at: i64,
    pub expires_at: i64,
}

impl Session {
    pub fn new(session_id: String, user_id: String, now: i64, ttl_secs: i64) -> Self {
        Session {
            session_id,
            user_id,
            created_at: now,
            last_seen_at: now,
            expires_at: now + ttl_secs,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Pushes the idle window forward from `now`. Never shortens it.
    pub fn slide(&mut self, now: i64, ttl_secs: i64) {
        self.last_seen_at = now;
        self.expires_at = self.expires_at.max(now + ttl_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_expires_after_ttl() {
        let session = Session::new("s1".into(), "u1".into(), 1_000, 600);
        assert_eq!(session.expires_at, 1_600);
        assert!(!session.is_expired(1_599));
        assert!(session.is_expired(1_600));
    }

    #[test]
    fn test_slide_extends_window_from_last_activity() {
        let mut session = Session::new("s1".into(), "u1".into(), 1_000, 600);
        session.slide(1_500, 600);

        assert_eq!(session.last_seen_at, 1_500);
        assert_eq!(session.expires_at, 2_100);
        assert!(!session.is_expired(2_000));
    }

    #[test]
    fn test_slide_never_shortens() {
        let mut session = Session::new("s1".into(), "u1".into(), 1_000, 600);
        session.slide(1_010, 60);
        assert_eq!(session.expires_at, 1_600);
    }

    #[test]
    fn test_idle_session_lapses() {
        let mut session = Session::new("s1".into(), "u1".into(), 0, 300);
        session.slide(200, 300);
        assert!(session.is_expired(500));
    }
}
