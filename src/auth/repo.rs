use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use super::wechat::WeChatUser;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub open_id: String,
    pub union_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub gender: i16,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub last_login_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, open_id, union_id, nickname, avatar_url, gender, \
     country, province, city, phone, last_login_at, created_at, updated_at";

pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_open_id(db: &PgPool, open_id: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE open_id = $1"
    ))
    .bind(open_id)
    .fetch_optional(db)
    .await
}

pub async fn create_from_wechat(db: &PgPool, wx: &WeChatUser) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (open_id, union_id, nickname, avatar_url, gender, \
             country, province, city, last_login_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now()) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&wx.open_id)
    .bind(&wx.union_id)
    .bind(&wx.nickname)
    .bind(&wx.avatar_url)
    .bind(wx.gender)
    .bind(&wx.country)
    .bind(&wx.province)
    .bind(&wx.city)
    .fetch_one(db)
    .await
}

/// Refresh profile fields from WeChat and bump the login timestamp. Fields the
/// userinfo call did not return keep their stored values.
pub async fn refresh_from_wechat(db: &PgPool, user: &User, wx: &WeChatUser) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET \
             nickname = COALESCE($2, nickname), \
             avatar_url = COALESCE($3, avatar_url), \
             gender = $4, \
             country = COALESCE($5, country), \
             province = COALESCE($6, province), \
             city = COALESCE($7, city), \
             last_login_at = now(), \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(user.id)
    .bind(&wx.nickname)
    .bind(&wx.avatar_url)
    .bind(if wx.gender != 0 { wx.gender } else { user.gender })
    .bind(&wx.country)
    .bind(&wx.province)
    .bind(&wx.city)
    .fetch_one(db)
    .await
}
