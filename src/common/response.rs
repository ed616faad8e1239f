// src/common/response.rs

use axum::Json;
use serde::Serialize;

/// Envelope de sucesso que o SPA espera: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiSuccess<T>> {
    Json(ApiSuccess { success: true, data, message: None })
}

pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiSuccess<T>> {
    Json(ApiSuccess { success: true, data, message: Some(message.into()) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let Json(body) = ok_with_message(3, "hecho");
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value, serde_json::json!({"success": true, "data": 3, "message": "hecho"}));

        let Json(body) = ok(vec![1, 2]);
        let value = serde_json::to_value(body).unwrap();
        assert!(value.get("message").is_none());
    }
}
