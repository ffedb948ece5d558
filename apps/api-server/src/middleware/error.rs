//! Error handling - every failure renders the uniform response envelope.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

use forum_core::{DomainError, FieldError};
use forum_shared::{ApiResponse, FieldErrorBody};

/// Seconds a client should wait before retrying a transient failure.
const RETRY_AFTER_SECS: u64 = 1;

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// Malformed request body or query string.
    BadRequest(String),
    Unauthorized,
    Conflict {
        message: String,
        errors: Vec<FieldError>,
    },
    Validation(Vec<FieldError>),
    /// Store conflict or outage; the client may retry.
    Unavailable(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
            AppError::Validation(errors) => write!(f, "Validation errors: {:?}", errors),
            AppError::Unavailable(msg) => write!(f, "Unavailable: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

fn to_body(errors: &[FieldError]) -> Vec<FieldErrorBody> {
    errors
        .iter()
        .map(|e| FieldErrorBody {
            field: e.field.clone(),
            message: e.message.clone(),
        })
        .collect()
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.status_code().as_u16();

        let body = match self {
            AppError::NotFound(detail) => ApiResponse::error(code, detail.clone()),
            AppError::BadRequest(detail) => ApiResponse::error(code, detail.clone()),
            AppError::Unauthorized => ApiResponse::error(code, "Not authenticated"),
            AppError::Conflict { message, errors } => {
                ApiResponse::error(code, message.clone()).with_errors(to_body(errors))
            }
            AppError::Validation(errors) => {
                ApiResponse::error(code, "Validation failed").with_errors(to_body(errors))
            }
            AppError::Unavailable(detail) => {
                tracing::warn!(%detail, "Transient failure");
                ApiResponse::error(code, "Service temporarily unavailable, please retry")
            }
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!(%detail, "Internal error");
                ApiResponse::error(code, "Internal server error")
            }
        };

        let mut response = HttpResponse::build(self.status_code());
        if matches!(self, AppError::Unavailable(_)) {
            response.insert_header(("Retry-After", RETRY_AFTER_SECS.to_string()));
        }
        response.json(body)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("No {} with id {}", entity_type, id))
            }
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::Duplicate { message, errors } => AppError::Conflict { message, errors },
            DomainError::Unauthorized => AppError::Unauthorized,
            DomainError::Transient(msg) => AppError::Unavailable(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_transient_is_503_with_retry_after() {
        let err = AppError::from(DomainError::Transient("40001".to_string()));
        let response = err.error_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "1");
    }

    #[actix_web::test]
    async fn test_validation_lists_fields() {
        let err = AppError::from(DomainError::invalid("value", "Vote must be 1 or -1"));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], 422);
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["field"], "value");
    }
}
