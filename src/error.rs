// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::backend::{AuthError, BackendError};
use crate::forms::auth::INCORRECT_CREDENTIALS;
use crate::forms::product::{FormError, NAME_NOT_UNIQUE};
use crate::forms::{FieldErrors, FormField};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity (form rules rejected the input)
    UnprocessableEntity {
        message: String,
        field_errors: HashMap<String, String>,
    },

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
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::UnprocessableEntity { .. } => 422,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::UnprocessableEntity { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::UnprocessableEntity { message, field_errors } => {
                json!({
                    "success": false,
                    "error": true,
                    "message": message,
                    "code": "UNPROCESSABLE_ENTITY",
                    "field_errors": field_errors
                })
            }
            _ => {
                json!({
                    "success": false,
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::UnprocessableEntity { .. } => "UNPROCESSABLE_ENTITY",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        ApiError::UnprocessableEntity {
            message: message.into(),
            field_errors,
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl<F: FormField> From<FieldErrors<F>> for ApiError {
    fn from(errors: FieldErrors<F>) -> Self {
        ApiError::unprocessable_entity("Validation failed", errors.to_map())
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Invalid(errors) => errors.into(),
            FormError::ReadOnlyField(_) | FormError::RoleUnresolved => ApiError::forbidden(err.to_string()),
            FormError::NotEditable(_) => ApiError::conflict(err.to_string()),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::UniqueViolation(_) => ApiError::conflict(NAME_NOT_UNIQUE),
            BackendError::NotFound(what) => ApiError::not_found(format!("Not found: {}", what)),
            BackendError::Invalid(msg) => ApiError::bad_request(msg),
            BackendError::Database(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Backend database error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            BackendError::Hashing(e) => {
                tracing::error!("Password hashing error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized(INCORRECT_CREDENTIALS),
            AuthError::InvalidToken | AuthError::NotSignedIn => ApiError::unauthorized(err.to_string()),
            AuthError::Session(e) => {
                tracing::error!("Session issuance failed: {}", e);
                ApiError::internal_server_error("Could not create a session")
            }
            AuthError::Backend(e) => e.into(),
        }
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
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::product::{ProductForm, PRICE_NON_NEGATIVE};
    use crate::types::Role;

    #[test]
    fn form_errors_become_422_with_field_errors() {
        let mut form = ProductForm::create(Role::Admin);
        form.set_name("Milk").unwrap();
        form.set_price_input("-1").unwrap();
        let err: ApiError = form.begin_submit().unwrap_err().into();

        assert_eq!(err.status_code(), 422);
        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["field_errors"]["price"], PRICE_NON_NEGATIVE);
    }

    #[test]
    fn unique_violation_is_conflict() {
        let err: ApiError = BackendError::UniqueViolation("products_name_key".to_string()).into();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), NAME_NOT_UNIQUE);
    }

    #[test]
    fn bad_credentials_are_generic() {
        let err: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_json()["code"], "UNAUTHORIZED");
    }

    #[test]
    fn database_details_stay_internal() {
        let err: ApiError = BackendError::Database("relation products does not exist".to_string()).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("relation"));
    }
}
