use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

use super::dto::{
    AroundQuery, DetailQuery, DistrictsQuery, DistrictsResponse, LocationDetail,
    LocationListResponse, SearchQuery,
};
use super::service;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/locations/search", get(search))
        .route("/locations/detail", get(detail))
        .route("/locations/around", get(around))
        .route("/locations/districts", get(districts))
}

#[instrument(skip_all, fields(user_id = user.id, keyword = %query.keyword))]
async fn search(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<LocationListResponse>>, ApiError> {
    let list = service::search(&state, query).await?;
    Ok(Json(ApiResponse::ok((*list).clone())))
}

#[instrument(skip_all, fields(user_id = user.id, poi_id = %query.id))]
async fn detail(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<DetailQuery>,
) -> Result<Json<ApiResponse<LocationDetail>>, ApiError> {
    let detail = service::detail(&state, query).await?;
    Ok(Json(ApiResponse::ok((*detail).clone())))
}

#[instrument(skip_all, fields(user_id = user.id))]
async fn around(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<AroundQuery>,
) -> Result<Json<ApiResponse<LocationListResponse>>, ApiError> {
    let list = service::around(&state, query).await?;
    Ok(Json(ApiResponse::ok((*list).clone())))
}

#[instrument(skip_all, fields(user_id = user.id))]
async fn districts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<DistrictsQuery>,
) -> Result<Json<ApiResponse<DistrictsResponse>>, ApiError> {
    let districts = service::districts(&state, query).await?;
    Ok(Json(ApiResponse::ok(districts)))
}
