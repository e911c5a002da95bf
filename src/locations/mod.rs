use crate::state::AppState;
use axum::Router;

pub mod amap;
pub mod dto;
pub mod handlers;
pub mod mock;
pub mod service;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
