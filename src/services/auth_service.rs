use crate::{
    config::AuthConfig,
    database::{MongoDB, USERS},
    models::{User, UserInfo, UserType},
    services::session_service,
    utils::{AppError, AppResult},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MIN_PASSWORD_LEN: usize = 8;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub user_type: UserType,
    pub sid: String, // session id
    pub iat: usize,
    pub exp: usize,
    pub aud: String,
    pub iss: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub user_type: UserType,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    /// Unix seconds; pushed forward on every authenticated request
    pub session_expires_at: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VerifyTokenResponse {
    pub success: bool,
    pub valid: bool,
    pub user_id: String,
    pub email: String,
    pub user_type: UserType,
    pub exp: usize,
}

pub fn generate_jwt(config: &AuthConfig, user: &User, session_id: &str) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        user_type: user.user_type,
        sid: session_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(config.session_max_age_hours)).timestamp() as usize,
        aud: config.jwt_audience.clone(),
        iss: config.jwt_issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

/// Checks signature, audience, issuer and the hard `exp` cap. The sliding
/// session window is checked separately against the database.
pub fn verify_token(config: &AuthConfig, token: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[config.jwt_audience.as_str()]);

    let mut issuers = HashSet::new();
    issuers.insert(config.jwt_issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

pub fn validate_registration(request: &RegisterRequest) -> AppResult<()> {
    let email = request.email.trim();
    let valid_email = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
        .unwrap_or(false);
    if !valid_email {
        return Err(AppError::InvalidRequest("A valid email is required".to_string()));
    }

    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("Name is required".to_string()));
    }

    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// User registration
pub async fn register(
    db: &MongoDB,
    config: &AuthConfig,
    request: &RegisterRequest,
) -> AppResult<AuthResponse> {
    validate_registration(request)?;

    let collection = db.collection::<User>(USERS);
    let email = normalize_email(&request.email);

    // The unique index is the real guard; this gives the common case a clear message
    if collection.find_one(doc! { "email": &email }).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let hashed_password = hash(&request.password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let now = Utc::now().timestamp();
    let new_user = User {
        id: None,
        user_id: ObjectId::new().to_hex(),
        email: email.clone(),
        password: hashed_password,
        name: request.name.trim().to_string(),
        phone: request.phone.clone(),
        avatar_url: None,
        user_type: request.user_type,
        is_active: true,
        created_at: now,
        updated_at: now,
        last_login: Some(now),
    };

    collection.insert_one(&new_user).await.map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("Email is already registered".to_string()),
        other => other,
    })?;

    log::info!("✅ User registered: {} ({})", email, new_user.user_type);

    start_session(db, config, new_user).await
}

// User login
pub async fn login(
    db: &MongoDB,
    config: &AuthConfig,
    request: &LoginRequest,
) -> AppResult<AuthResponse> {
    let collection = db.collection::<User>(USERS);
    let email = normalize_email(&request.email);

    let user = collection
        .find_one(doc! { "email": &email })
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }

    collection
        .update_one(
            doc! { "user_id": &user.user_id },
            doc! { "$set": { "last_login": Utc::now().timestamp() } },
        )
        .await?;

    start_session(db, config, user).await
}

async fn start_session(db: &MongoDB, config: &AuthConfig, user: User) -> AppResult<AuthResponse> {
    let session = session_service::create_session(db, config, &user.user_id).await?;
    let token = generate_jwt(config, &user, &session.session_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        session_expires_at: session.expires_at,
        user: UserInfo::from(user),
    })
}

pub async fn logout(db: &MongoDB, claims: &Claims) -> AppResult<()> {
    session_service::end_session(db, &claims.sid).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: None,
            user_id: "65f000000000000000000001".into(),
            email: "ana@example.com".into(),
            password: String::new(),
            name: "Ana".into(),
            phone: None,
            avatar_url: None,
            user_type: UserType::Client,
            is_active: true,
            created_at: 0,
            updated_at: 0,
            last_login: None,
        }
    }

    fn register_request(email: &str, password: &str, name: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            user_type: UserType::Client,
            phone: None,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let config = AuthConfig::for_tests();
        let token = generate_jwt(&config, &user(), "session-1").unwrap();
        let claims = verify_token(&config, &token).unwrap();

        assert_eq!(claims.sub, "65f000000000000000000001");
        assert_eq!(claims.sid, "session-1");
        assert_eq!(claims.user_type, UserType::Client);
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = AuthConfig::for_tests();
        let past = (Utc::now() - Duration::hours(2)).timestamp() as usize;
        let claims = Claims {
            sub: "u1".into(),
            email: "ana@example.com".into(),
            user_type: UserType::Client,
            sid: "s1".into(),
            iat: past - 60,
            exp: past,
            aud: config.jwt_audience.clone(),
            iss: config.jwt_issuer.clone(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        let err = verify_token(&config, &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let config = AuthConfig::for_tests();
        let mut forger = AuthConfig::for_tests();
        forger.jwt_secret = "not-the-secret".into();

        let token = generate_jwt(&forger, &user(), "s1").unwrap();
        assert!(verify_token(&config, &token).is_err());
    }

    #[test]
    fn test_token_for_other_audience_rejected() {
        let config = AuthConfig::for_tests();
        let mut other = AuthConfig::for_tests();
        other.jwt_audience = "someone-else".into();

        let token = generate_jwt(&other, &user(), "s1").unwrap();
        assert!(verify_token(&config, &token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let config = AuthConfig::for_tests();
        assert!(verify_token(&config, "not.a.jwt").is_err());
        assert!(verify_token(&config, "").is_err());
    }

    #[test]
    fn test_registration_validation() {
        assert!(validate_registration(&register_request("ana@example.com", "longenough", "Ana")).is_ok());
        assert!(validate_registration(&register_request("ana.example.com", "longenough", "Ana")).is_err());
        assert!(validate_registration(&register_request("ana@localhost", "longenough", "Ana")).is_err());
        assert!(validate_registration(&register_request("ana@example.com", "short", "Ana")).is_err());
        assert!(validate_registration(&register_request("ana@example.com", "longenough", "  ")).is_err());
    }

    #[test]
    fn test_email_normalized() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_duplicate_email_rejected() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/handyman_test".to_string());
        let db = MongoDB::new(&uri).await.expect("MongoDB available");
        let config = AuthConfig::for_tests();

        let email = format!("dup-{}@example.com", uuid::Uuid::new_v4());
        let first = register(&db, &config, &register_request(&email, "password123", "Ana")).await;
        assert!(first.is_ok());

        let upper = email.to_uppercase();
        let second = register(&db, &config, &register_request(&upper, "password123", "Ana")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }
}
