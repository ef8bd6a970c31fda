use std::env;

/// Runtime configuration, read once from the environment (and `.env`) at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
    pub stripe: StripeConfig,
    pub default_currency: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    /// Sliding idle window: every authenticated request pushes expiry this far out.
    pub session_ttl_minutes: i64,
    /// Hard cap on a token's lifetime regardless of activity.
    pub session_max_age_hours: i64,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3002".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                log::warn!("⚠️  JWT_SECRET not set, using an insecure development secret");
                "default-secret-change-me".to_string()
            }
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            database_url,
            cors_origins,
            auth: AuthConfig {
                jwt_secret,
                jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "handyman-service".to_string()),
                jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "handyman-api".to_string()),
                session_ttl_minutes: parse_i64("SESSION_TTL_MINUTES", 60 * 24)?,
                session_max_age_hours: parse_i64("SESSION_MAX_AGE_HOURS", 24 * 30)?,
            },
            stripe: StripeConfig {
                secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
                webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
                api_base: env::var("STRIPE_API_BASE")
                    .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            },
            default_currency: env::var("DEFAULT_CURRENCY")
                .unwrap_or_else(|_| "usd".to_string())
                .to_lowercase(),
        })
    }
}

fn parse_i64(key: &str, default: i64) -> Result<i64, String> {
    match env::var(key) {
        Ok(raw) => {
            let value = raw
                .parse::<i64>()
                .map_err(|e| format!("Invalid {}: {}", key, e))?;
            if value <= 0 {
                return Err(format!("{} must be positive", key));
            }
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl AuthConfig {
    pub fn for_tests() -> Self {
        Self {
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "handyman-service".to_string(),
            jwt_audience: "handyman-api".to_string(),
            session_ttl_minutes: 30,
            session_max_age_hours: 24,
        }
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "mongodb://127.0.0.1:1/handyman_test".to_string(),
            cors_origins: Vec::new(),
            auth: AuthConfig::for_tests(),
            stripe: StripeConfig {
                secret_key: String::new(),
                webhook_secret: "whsec_test".to_string(),
                api_base: "http://127.0.0.1:1".to_string(),
            },
            default_currency: "usd".to_string(),
        }
    }
}
