//! The uniform response envelope. Every endpoint renders this shape,
//! success or failure.

use serde::{Deserialize, Serialize};

/// A validation failure tied to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrorBody {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// HTTP status code, repeated in the body.
    pub code: u16,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldErrorBody>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::with_status(200, data, "OK")
    }

    pub fn created(data: T) -> Self {
        Self::with_status(201, data, "Created")
    }

    pub fn with_status(code: u16, data: T, message: impl Into<String>) -> Self {
        Self {
            code,
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: 200,
            success: true,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            success: false,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldErrorBody>) -> Self {
        if !errors.is_empty() {
            self.errors = Some(errors);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let body = ApiResponse::error(422, "Validation failed").with_errors(vec![FieldErrorBody {
            field: "title".to_string(),
            message: "Title is required".to_string(),
        }]);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], 422);
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["field"], "title");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_empty_errors_are_omitted() {
        let body = ApiResponse::error(401, "Unauthorized").with_errors(Vec::new());
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("errors").is_none());
    }
}
