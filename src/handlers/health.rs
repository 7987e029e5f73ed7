//! Health check endpoint for service monitoring.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{db::DbPool, services::lifecycle_service};

/// Health check response.
///
/// Returns service status and database connectivity.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: &'static str,

    /// Database connection status
    pub database: &'static str,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Checks
///
/// - Database connectivity (executes a trivial query)
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "ok",
///   "database": "connected",
///   "timestamp": "2025-06-01T10:00:00Z"
/// }
/// ```
///
/// # Response (503 Service Unavailable)
///
/// An unreachable store is a structured degraded status, not an opaque
/// error; monitoring keeps getting a parseable body either way.
pub async fn health_check(State(pool): State<DbPool>) -> (StatusCode, Json<HealthResponse>) {
    match lifecycle_service::probe(&pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "connected",
                timestamp: Utc::now(),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed to reach database");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    database: "unreachable",
                    timestamp: Utc::now(),
                }),
            )
        }
    }
}
