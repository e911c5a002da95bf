use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::response::ApiResponse;

/// Error taxonomy for every endpoint. Evaluation order in services is always
/// existence -> permission -> payload validation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Permission(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Business code carried in the response envelope.
    pub fn code(&self) -> i32 {
        match self {
            Self::Validation(_) => 40001,
            Self::Authentication(_) => 40101,
            Self::Permission(_) => 40301,
            Self::NotFound(_) => 40401,
            Self::Internal(_) => 50001,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Permission(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Unclassified failures are logged in full and surfaced redacted.
        let message = match &self {
            Self::Internal(e) => {
                error!(error = %e, "unhandled internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ApiResponse::error(self.code(), message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_status_families() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::validation("x").code(), 40001);
        assert_eq!(
            ApiError::authentication("x").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::permission("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::permission("x").code(), 40301);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::not_found("x").code(), 40401);
        let internal = ApiError::Internal(anyhow::anyhow!("boom"));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.code(), 50001);
    }
}
