use thiserror::Error;

use crate::auth::JwtError;
use crate::database::DatabaseError;

/// Failures of product, role and audit operations
#[derive(Debug, Error)]
pub enum BackendError {
    /// Unique constraint on the product name was violated
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected because it would break a storage invariant
    #[error("Invalid data: {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl BackendError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, BackendError::UniqueViolation(_))
    }
}

impl From<DatabaseError> for BackendError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation(constraint) => BackendError::UniqueViolation(constraint),
            DatabaseError::NotFound(msg) => BackendError::NotFound(msg),
            other => BackendError::Database(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

/// Sign-in and token failures. Messages never reveal whether an account exists.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Session error: {0}")]
    Session(#[from] JwtError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result of a failed password reset request, mirroring an HTTP status
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} (status {status})")]
pub struct ResetError {
    pub status: u16,
    pub message: String,
}

impl ResetError {
    pub fn no_such_user() -> Self {
        Self {
            status: 404,
            message: "User not found".to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: message.into(),
        }
    }
}
