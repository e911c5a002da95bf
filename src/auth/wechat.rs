//! WeChat OAuth client: exchanges a login code for an access token, then
//! fetches the user profile. Both calls report failure via `errcode`.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::WeChatConfig;
use crate::error::ApiError;

const TOKEN_URL: &str = "https://api.weixin.qq.com/sns/oauth2/access_token";
const USERINFO_URL: &str = "https://api.weixin.qq.com/sns/userinfo";

/// Profile fields we keep from the WeChat userinfo call.
#[derive(Debug, Clone, Default)]
pub struct WeChatUser {
    pub open_id: String,
    pub union_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub gender: i16,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
}

#[async_trait]
pub trait WeChatClient: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<WeChatUser, ApiError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    openid: Option<String>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    openid: Option<String>,
    unionid: Option<String>,
    nickname: Option<String>,
    headimgurl: Option<String>,
    sex: Option<i16>,
    country: Option<String>,
    province: Option<String>,
    city: Option<String>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

pub struct WeChatOauthClient {
    http: reqwest::Client,
    app_id: String,
    app_secret: String,
}

impl WeChatOauthClient {
    pub fn new(http: reqwest::Client, config: &WeChatConfig) -> Self {
        Self {
            http,
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
        }
    }
}

#[async_trait]
impl WeChatClient for WeChatOauthClient {
    async fn exchange_code(&self, code: &str) -> Result<WeChatUser, ApiError> {
        let token: TokenResponse = self
            .http
            .get(TOKEN_URL)
            .query(&[
                ("appid", self.app_id.as_str()),
                ("secret", self.app_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("wechat token request failed")?
            .json()
            .await
            .context("wechat token response was not valid json")?;

        if let Some(errcode) = token.errcode {
            let msg = token.errmsg.unwrap_or_default();
            return Err(ApiError::authentication(format!(
                "wechat token exchange failed ({errcode}): {msg}"
            )));
        }
        let (access_token, open_id) = match (token.access_token, token.openid) {
            (Some(t), Some(o)) => (t, o),
            _ => return Err(ApiError::authentication("wechat token response incomplete")),
        };

        let info: UserInfoResponse = self
            .http
            .get(USERINFO_URL)
            .query(&[
                ("access_token", access_token.as_str()),
                ("openid", open_id.as_str()),
                ("lang", "zh_CN"),
            ])
            .send()
            .await
            .context("wechat userinfo request failed")?
            .json()
            .await
            .context("wechat userinfo response was not valid json")?;

        if let Some(errcode) = info.errcode {
            let msg = info.errmsg.unwrap_or_default();
            return Err(ApiError::authentication(format!(
                "wechat userinfo failed ({errcode}): {msg}"
            )));
        }

        Ok(WeChatUser {
            open_id: info.openid.unwrap_or(open_id),
            union_id: info.unionid,
            nickname: info.nickname,
            avatar_url: info.headimgurl,
            gender: info.sex.unwrap_or(0),
            country: info.country,
            province: info.province,
            city: info.city,
        })
    }
}

/// Serves pre-registered users keyed by login code; unknown codes fail the
/// same way an invalid WeChat code does.
#[derive(Default)]
pub struct MockWeChatClient {
    users: Mutex<HashMap<String, WeChatUser>>,
}

impl MockWeChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, code: &str, user: WeChatUser) {
        self.users
            .lock()
            .expect("mock wechat map poisoned")
            .insert(code.to_string(), user);
    }
}

#[async_trait]
impl WeChatClient for MockWeChatClient {
    async fn exchange_code(&self, code: &str) -> Result<WeChatUser, ApiError> {
        self.users
            .lock()
            .expect("mock wechat map poisoned")
            .get(code)
            .cloned()
            .ok_or_else(|| ApiError::authentication("invalid wechat code"))
    }
}
