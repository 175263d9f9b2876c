//! The JSON response envelope shared by every endpoint.
//!
//! Success responses are `{success: true, message, data?}`; error responses
//! are `{success: false, message}` and are produced by `AppError`.

use serde::Serialize;

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response carrying a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A successful response with no payload.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// A failure envelope; used by the error handler.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_includes_data() {
        let resp = ApiResponse::ok("created", vec![1, 2, 3]);
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "created");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn error_envelope_omits_data() {
        let resp = ApiResponse::error("Out of Stock: 3 left");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
    }
}
