use crate::{
    database::{MongoDB, SETTINGS},
    models::{UpdateSettingsRequest, UserSettings},
    utils::{AppError, AppResult},
};
use chrono::Utc;
use mongodb::bson::doc;

const SUPPORTED_LANGUAGES: &[&str] = &["en", "es", "fr", "de", "pt"];

pub fn validate_settings(update: &UpdateSettingsRequest) -> AppResult<()> {
    if let Some(language) = &update.language {
        let language = language.trim().to_lowercase();
        if !SUPPORTED_LANGUAGES.contains(&language.as_str()) {
            return Err(AppError::InvalidRequest(format!(
                "Unsupported language: {}",
                language
            )));
        }
    }
    if let Some(currency) = &update.currency {
        let currency = currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::InvalidRequest("Currency must be a 3-letter ISO code".to_string()));
        }
    }
    Ok(())
}

/// Stored settings, or the defaults for users who never saved any.
pub async fn get_settings(db: &MongoDB, user_id: &str, default_currency: &str) -> AppResult<UserSettings> {
    let stored = db
        .collection::<UserSettings>(SETTINGS)
        .find_one(doc! { "user_id": user_id })
        .await?;

    Ok(stored.unwrap_or_else(|| UserSettings::defaults(user_id, default_currency)))
}

pub async fn update_settings(
    db: &MongoDB,
    user_id: &str,
    update: UpdateSettingsRequest,
    default_currency: &str,
) -> AppResult<UserSettings> {
    validate_settings(&update)?;

    let mut settings = get_settings(db, user_id, default_currency).await?;
    settings.apply(update);
    settings.updated_at = Utc::now().timestamp();

    db.collection::<UserSettings>(SETTINGS)
        .replace_one(doc! { "user_id": user_id }, &settings)
        .upsert(true)
        .await?;

    log::info!("⚙️ Settings saved for {}", user_id);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_settings() {
        assert!(validate_settings(&UpdateSettingsRequest::default()).is_ok());
        assert!(validate_settings(&UpdateSettingsRequest {
            language: Some("ES".into()),
            currency: Some("eur".into()),
            ..Default::default()
        })
        .is_ok());
        assert!(validate_settings(&UpdateSettingsRequest {
            language: Some("klingon".into()),
            ..Default::default()
        })
        .is_err());
        assert!(validate_settings(&UpdateSettingsRequest {
            currency: Some("euro".into()),
            ..Default::default()
        })
        .is_err());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_settings_upsert_round_trip() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/handyman_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();
        let user_id = uuid::Uuid::new_v4().to_string();

        let defaults = get_settings(&db, &user_id, "usd").await.unwrap();
        assert_eq!(defaults, UserSettings::defaults(&user_id, "usd"));

        let saved = update_settings(
            &db,
            &user_id,
            UpdateSettingsRequest {
                push_notifications: Some(false),
                ..Default::default()
            },
            "usd",
        )
        .await
        .unwrap();
        assert!(!saved.push_notifications);

        let reloaded = get_settings(&db, &user_id, "usd").await.unwrap();
        assert_eq!(reloaded, saved);
    }
}
