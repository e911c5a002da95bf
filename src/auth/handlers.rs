use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{error::ApiError, response::ApiResponse, state::AppState};

use super::{
    dto::{UserProfile, WeChatLoginRequest, WeChatLoginResponse},
    jwt::{AuthUser, JwtKeys},
    repo,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/wechat/login", post(wechat_login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn wechat_login(
    State(state): State<AppState>,
    Json(payload): Json<WeChatLoginRequest>,
) -> Result<Json<ApiResponse<WeChatLoginResponse>>, ApiError> {
    if payload.code.trim().is_empty() {
        return Err(ApiError::validation("code is required"));
    }

    let wx_user = state.wechat.exchange_code(&payload.code).await?;

    let existing = repo::find_by_open_id(&state.db, &wx_user.open_id).await?;
    let (user, is_new_user) = match existing {
        Some(user) => (
            repo::refresh_from_wechat(&state.db, &user, &wx_user).await?,
            false,
        ),
        None => (repo::create_from_wechat(&state.db, &wx_user).await?, true),
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = user.id, is_new_user, "wechat login");
    Ok(Json(ApiResponse::ok(WeChatLoginResponse {
        token,
        user: UserProfile::from(&user),
        is_new_user,
    })))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<ApiResponse<UserProfile>> {
    Json(ApiResponse::ok(UserProfile::from(&user)))
}
