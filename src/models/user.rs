use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Client,
    Handyman,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Client => "client",
            UserType::Handyman => "handyman",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Public identifier referenced from every other collection
    pub user_id: String,
    pub email: String,
    /// bcrypt hash
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub user_type: UserType,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_login: Option<i64>,
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

/// What the API exposes about a user; never carries the password hash.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub user_type: UserType,
    pub created_at: i64,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.user_id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            avatar_url: user.avatar_url,
            user_type: user.user_type,
            created_at: user.created_at,
        }
    }
}

/// Profile visible to other users
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub user_type: UserType,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.user_id,
            name: user.name,
            avatar_url: user.avatar_url,
            user_type: user.user_type,
        }
    }
}
