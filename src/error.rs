//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Missing/unknown API keys vs. inactive keys
/// - **Resource Errors**: Requested entities not found
/// - **Precondition Errors**: Destructive operations without confirmation
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    /// Connectivity-class failures map to 503; everything else to 500.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// API key is missing from the request or matches no stored record.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Missing or unknown API key")]
    Unauthorized,

    /// API key exists but has been deactivated.
    ///
    /// Returns HTTP 403 Forbidden. Kept distinct from [`AppError::Unauthorized`]
    /// so a revoked integration can tell it needs a new key rather than
    /// retrying the one it has.
    #[error("API key is inactive")]
    Forbidden,

    /// Requested entity does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    /// The String names what was missing (resource, user, API key id).
    #[error("{0} not found")]
    NotFound(String),

    /// The request would violate a uniqueness rule.
    ///
    /// Returns HTTP 409 Conflict. Raised when linking a Discord id that is
    /// already claimed by another user on the same platform.
    #[error("{0}")]
    Conflict(String),

    /// A destructive operation was attempted without explicit confirmation.
    ///
    /// Returns HTTP 412 Precondition Failed. Raised by `db-reset` and
    /// `db-import --wipe` when the confirmation flag is absent.
    #[error("Refusing destructive operation without confirmation: {0}")]
    PreconditionFailed(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// True when the underlying sqlx error means "could not reach the store"
/// rather than "the store rejected the query".
fn is_connectivity_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
    )
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `Unauthorized` → 401 Unauthorized
/// - `Forbidden` → 403 Forbidden
/// - `NotFound` → 404 Not Found
/// - `Conflict` → 409 Conflict
/// - `PreconditionFailed` → 412 Precondition Failed
/// - `InvalidRequest` → 400 Bad Request
/// - `Database` (connectivity) → 503 Service Unavailable
/// - `Database` (other) → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "key_inactive", self.to_string()),
            AppError::NotFound(ref what) => {
                (StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
            }
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::PreconditionFailed(_) => (
                StatusCode::PRECONDITION_FAILED,
                "precondition_failed",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Database(ref e) if is_connectivity_error(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "Database is unavailable. Please try again later.".to_string(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        // Return the response with status code and JSON body
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_distinguishable() {
        let unknown = AppError::Unauthorized.into_response();
        let inactive = AppError::Forbidden.into_response();

        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(inactive.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            AppError::NotFound("resource".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::PreconditionFailed("pass --yes-i-am-sure".into())
                .into_response()
                .status(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            AppError::InvalidRequest("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("discord id already in use".into())
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn connectivity_errors_map_to_service_unavailable() {
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert_eq!(
            AppError::Database(io).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut)
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        // Query-level errors stay internal
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
