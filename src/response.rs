use serde::Serialize;

/// Uniform response envelope. `code` 0 means success; business codes map to
/// HTTP status families (see `error::ApiError`).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            message: "success".into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_uses_code_zero() {
        let resp = ApiResponse::ok(42);
        assert_eq!(resp.code, 0);
        assert_eq!(resp.message, "success");
        assert_eq!(resp.data, Some(42));
    }

    #[test]
    fn error_envelope_carries_no_data() {
        let resp = ApiResponse::error(40001, "bad status filter");
        assert_eq!(resp.code, 40001);
        assert!(resp.data.is_none());
    }
}
