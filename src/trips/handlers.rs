use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

use super::dto::{
    TripCancelRequest, TripCancelResponse, TripCreateRequest, TripDayDetailResponse,
    TripDayUpdateRequest, TripDayUpdateResponse, TripFoodsResponse, TripListQuery,
    TripListResponse, TripOverviewResponse, TripResponse,
};
use super::service;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips", post(create_trip).get(list_trips))
        .route("/trips/:trip_id/overview", get(trip_overview))
        .route(
            "/trips/:trip_id/days/:day_index",
            get(trip_day_detail).put(update_trip_day),
        )
        .route("/trips/:trip_id/foods", get(trip_foods))
        .route("/trips/:trip_id/cancel", post(cancel_trip))
}

#[instrument(skip_all, fields(user_id = user.id))]
async fn create_trip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<TripCreateRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, ApiError> {
    let trip = service::create_trip(&state, user.id, payload).await?;
    Ok(Json(ApiResponse::ok(trip)))
}

#[instrument(skip_all, fields(user_id = user.id))]
async fn list_trips(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<TripListQuery>,
) -> Result<Json<ApiResponse<TripListResponse>>, ApiError> {
    let list = service::list_trips(&state, user.id, query).await?;
    Ok(Json(ApiResponse::ok(list)))
}

#[instrument(skip_all, fields(user_id = user.id, trip_id))]
async fn trip_overview(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<ApiResponse<TripOverviewResponse>>, ApiError> {
    let overview = service::get_trip_overview(&state, user.id, trip_id).await?;
    Ok(Json(ApiResponse::ok(overview)))
}

#[instrument(skip_all, fields(user_id = user.id, trip_id, day_index))]
async fn trip_day_detail(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((trip_id, day_index)): Path<(i64, i32)>,
) -> Result<Json<ApiResponse<TripDayDetailResponse>>, ApiError> {
    let detail = service::get_trip_day_detail(&state, user.id, trip_id, day_index).await?;
    Ok(Json(ApiResponse::ok((*detail).clone())))
}

#[instrument(skip_all, fields(user_id = user.id, trip_id, day_index))]
async fn update_trip_day(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((trip_id, day_index)): Path<(i64, i32)>,
    Json(payload): Json<TripDayUpdateRequest>,
) -> Result<Json<ApiResponse<TripDayUpdateResponse>>, ApiError> {
    let updated = service::update_trip_day(&state, user.id, trip_id, day_index, payload).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

#[instrument(skip_all, fields(user_id = user.id, trip_id))]
async fn trip_foods(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<ApiResponse<TripFoodsResponse>>, ApiError> {
    let foods = service::get_trip_foods(&state, user.id, trip_id).await?;
    Ok(Json(ApiResponse::ok((*foods).clone())))
}

#[instrument(skip_all, fields(user_id = user.id, trip_id))]
async fn cancel_trip(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(trip_id): Path<i64>,
    payload: Option<Json<TripCancelRequest>>,
) -> Result<Json<ApiResponse<TripCancelResponse>>, ApiError> {
    let request = payload.map(|Json(p)| p).unwrap_or_default();
    let cancelled = service::cancel_trip(&state, user.id, trip_id, request).await?;
    Ok(Json(ApiResponse::ok(cancelled)))
}
