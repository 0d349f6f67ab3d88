// HTTP API Error Types
use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::DatabaseError;
use crate::submission::SubmissionError;
use crate::tree::TreeError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity, carrying the rule code that was broken
    UnprocessableEntity {
        message: String,
        code: &'static str,
        field_errors: Option<HashMap<String, String>>,
    },

    // 429 Too Many Requests
    TooManyRequests { message: String, retry_after_secs: u64 },

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::UnprocessableEntity { .. } => 422,
            ApiError::TooManyRequests { .. } => 429,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::UnprocessableEntity { message, .. } => message,
            ApiError::TooManyRequests { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::UnprocessableEntity { code, .. } => code,
            ApiError::TooManyRequests { .. } => "TOO_MANY_REQUESTS",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });

        match self {
            ApiError::UnprocessableEntity {
                field_errors: Some(field_errors),
                ..
            } => {
                response["field_errors"] = json!(field_errors);
            }
            ApiError::TooManyRequests { retry_after_secs, .. } => {
                response["retry_after"] = json!(retry_after_secs);
            }
            _ => {}
        }

        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>, code: &'static str, field: Option<&str>) -> Self {
        let message = message.into();
        let field_errors = field.map(|f| HashMap::from([(f.to_string(), message.clone())]));
        ApiError::UnprocessableEntity {
            message,
            code,
            field_errors,
        }
    }

    pub fn too_many_requests(message: impl Into<String>, retry_after_secs: u64) -> Self {
        ApiError::TooManyRequests {
            message: message.into(),
            retry_after_secs,
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        if err.is_connection_error() {
            tracing::error!("Database unavailable: {}", err);
            return ApiError::service_unavailable("Database temporarily unavailable");
        }
        match err {
            DatabaseError::ConstraintViolation(msg) => {
                // A concurrent writer got there first; the client may retry
                tracing::warn!("Constraint violation: {}", msg);
                ApiError::conflict("The resource was modified concurrently, please retry")
            }
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database misconfigured: {}", err);
                ApiError::service_unavailable("Database is not configured")
            }
            DatabaseError::QueryError(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database query error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<TreeError> for ApiError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::NotFound { .. } => ApiError::not_found(err.to_string()),
            TreeError::Storage(db) => db.into(),
            rule => ApiError::unprocessable_entity(rule.to_string(), rule.code(), rule.field()),
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::RateLimited { retry_after_secs } => {
                ApiError::too_many_requests(err.to_string(), retry_after_secs)
            }
            SubmissionError::Spam { .. } => ApiError::unprocessable_entity(err.to_string(), "SPAM", None),
            SubmissionError::TooShort { .. } => {
                ApiError::unprocessable_entity(err.to_string(), "TOO_SHORT", Some("body"))
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.to_json())).into_response();
        if let ApiError::TooManyRequests { retry_after_secs, .. } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKind;
    use uuid::Uuid;

    #[test]
    fn tree_rule_errors_are_422_with_field() {
        let id = Uuid::new_v4();
        let err: ApiError = TreeError::SelfParent {
            kind: EntityKind::Category,
            id,
        }
        .into();
        assert_eq!(err.status_code(), 422);
        let body = err.to_json();
        assert_eq!(body["code"], "SELF_PARENT");
        assert!(body["field_errors"]["parent_id"].is_string());
    }

    #[test]
    fn not_found_is_404() {
        let err: ApiError = TreeError::NotFound {
            kind: EntityKind::Page,
            id: Uuid::new_v4(),
        }
        .into();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn storage_errors_hide_details() {
        let err: ApiError = TreeError::Storage(DatabaseError::QueryError("syntax error at or near".into())).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("syntax"));

        let err: ApiError = DatabaseError::ConstraintViolation("dup".into()).into();
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let err: ApiError = SubmissionError::RateLimited { retry_after_secs: 42 }.into();
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.to_json()["retry_after"], 42);
        let response = err.into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
