use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;
use std::time::Duration;

pub const USERS: &str = "users";
pub const SESSIONS: &str = "sessions";
pub const HANDYMEN: &str = "handymen";
pub const SERVICES: &str = "services";
pub const OFFERS: &str = "offers";
pub const NOTIFICATIONS: &str = "notifications";
pub const REVIEWS: &str = "reviews";
pub const SETTINGS: &str = "settings";

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(Duration::from_secs(300));
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(database_name(uri));

        // Falha rápido se o servidor estiver inacessível
        db.run_command(doc! { "ping": 1 }).await?;

        let mongodb = Self { client, db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Builds a handle without touching the network. The driver connects lazily,
    /// so this is enough for code paths that reject a request before any query.
    #[cfg(test)]
    pub async fn unconnected(uri: &str) -> Self {
        let client = Client::with_uri_str(uri).await.expect("valid mongodb uri");
        let db = client.database(database_name(uri));
        Self { client, db }
    }

    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let unique = |keys: Document| {
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };
        let plain = |keys: Document| IndexModel::builder().keys(keys).build();

        let indexes: Vec<(&str, IndexModel, &str)> = vec![
            (USERS, unique(doc! { "email": 1 }), "users(email) unique"),
            (USERS, unique(doc! { "user_id": 1 }), "users(user_id) unique"),
            (SESSIONS, unique(doc! { "session_id": 1 }), "sessions(session_id) unique"),
            (SESSIONS, plain(doc! { "expires_at": 1 }), "sessions(expires_at)"),
            (HANDYMEN, unique(doc! { "user_id": 1 }), "handymen(user_id) unique"),
            (HANDYMEN, plain(doc! { "skills": 1, "city": 1 }), "handymen(skills, city)"),
            (SERVICES, plain(doc! { "handyman_id": 1 }), "services(handyman_id)"),
            (SERVICES, plain(doc! { "category": 1, "is_active": 1 }), "services(category, is_active)"),
            (OFFERS, plain(doc! { "client_id": 1, "status": 1 }), "offers(client_id, status)"),
            (OFFERS, plain(doc! { "handyman_id": 1, "status": 1 }), "offers(handyman_id, status)"),
            (OFFERS, plain(doc! { "payment_intent_id": 1 }), "offers(payment_intent_id)"),
            (NOTIFICATIONS, plain(doc! { "user_id": 1, "read": 1 }), "notifications(user_id, read)"),
            (REVIEWS, unique(doc! { "offer_id": 1 }), "reviews(offer_id) unique"),
            (REVIEWS, plain(doc! { "handyman_id": 1, "created_at": -1 }), "reviews(handyman_id, created_at)"),
            (SETTINGS, unique(doc! { "user_id": 1 }), "settings(user_id) unique"),
        ];

        for (collection, index, label) in indexes {
            match self.collection::<Document>(collection).create_index(index).await {
                Ok(_) => log::info!("   ✅ Index ready: {}", label),
                Err(e) => log::warn!("   ⚠️  Index {} not created: {}", label, e),
            }
        }

        log::info!("✅ Database indexes ready");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), mongodb::error::Error> {
        self.db.run_command(doc! { "ping": 1 }).await.map(|_| ())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Database name is the last path segment of the URI, query string stripped.
fn database_name(uri: &str) -> &str {
    let without_scheme = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    without_scheme
        .split_once('/')
        .map(|(_, path)| path.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or("handyman_marketplace")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_name_from_uri() {
        assert_eq!(database_name("mongodb://localhost:27017/marketplace"), "marketplace");
        assert_eq!(
            database_name("mongodb+srv://u:p@cluster.example.net/jobs?retryWrites=true"),
            "jobs"
        );
    }

    #[test]
    fn test_database_name_defaults() {
        assert_eq!(database_name("mongodb://localhost:27017"), "handyman_marketplace");
        assert_eq!(database_name("mongodb://localhost:27017/"), "handyman_marketplace");
        assert_eq!(database_name("mongodb://localhost:27017/?w=majority"), "handyman_marketplace");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/handyman_test".to_string());

        let db = MongoDB::new(&uri).await;
        assert!(db.is_ok());
        assert!(db.unwrap().ping().await.is_ok());
    }
}
