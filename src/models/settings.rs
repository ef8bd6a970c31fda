use serde::{Deserialize, Serialize};

/// Per-user preferences. Users who never saved any get `UserSettings::defaults`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserSettings {
    pub user_id: String,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub language: String,
    pub currency: String,
    pub updated_at: i64,
}

impl UserSettings {
    pub fn defaults(user_id: &str, currency: &str) -> Self {
        UserSettings {
            user_id: user_id.to_string(),
            email_notifications: true,
            push_notifications: true,
            language: "en".to_string(),
            currency: currency.to_string(),
            updated_at: 0,
        }
    }

    pub fn apply(&mut self, update: UpdateSettingsRequest) {
        if let Some(v) = update.email_notifications {
            self.email_notifications = v;
        }
        if let Some(v) = update.push_notifications {
            self.push_notifications = v;
        }
        if let Some(v) = update.language {
            self.language = v.trim().to_lowercase();
        }
        if let Some(v) = update.currency {
            self.currency = v.trim().to_lowercase();
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateSettingsRequest {
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub language: Option<String>,
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_touches_given_fields() {
        let mut settings = UserSettings::defaults("u1", "usd");
        settings.apply(UpdateSettingsRequest {
            push_notifications: Some(false),
            currency: Some(" EUR ".to_string()),
            ..Default::default()
        });

        assert!(settings.email_notifications);
        assert!(!settings.push_notifications);
        assert_eq!(settings.language, "en");
        assert_eq!(settings.currency, "eur");
    }
}
