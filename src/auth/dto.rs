use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::User;

/// Request body for WeChat login.
#[derive(Debug, Deserialize)]
pub struct WeChatLoginRequest {
    pub code: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct WeChatLoginResponse {
    pub token: String,
    pub user: UserProfile,
    pub is_new_user: bool,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub gender: i16,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname.clone(),
            avatar_url: user.avatar_url.clone(),
            gender: user.gender,
            country: user.country.clone(),
            province: user.province.clone(),
            city: user.city.clone(),
            created_at: user.created_at,
        }
    }
}
