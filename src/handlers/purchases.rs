//! Purchase recording HTTP handler.
//!
//! `/verify` is strictly read-only; this is the write path that establishes
//! the ownership rows it reads.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    db::DbPool, error::AppError, middleware::auth::AuthContext,
    services::verify_service,
};

/// Request body for recording a purchase.
///
/// # JSON Example
///
/// ```json
/// {
///   "platform": "polymart",
///   "resource_slug": "my-plugin",
///   "external_user_id": "84721",
///   "username": "steve"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RecordPurchaseRequest {
    pub platform: String,
    pub resource_slug: String,
    pub external_user_id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Record a confirmed purchase.
///
/// # Endpoint
///
/// `POST /purchases`
///
/// # Response
///
/// - **201 Created**: purchase recorded (user created on first sight)
/// - **409 Conflict**: this user was already verified for this resource on
///   this platform; body carries `"duplicate": true`
/// - **400**: unknown platform or empty identifiers
/// - **404**: unknown resource slug
pub async fn record_purchase(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<RecordPurchaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.platform.trim().is_empty()
        || request.resource_slug.trim().is_empty()
        || request.external_user_id.trim().is_empty()
    {
        return Err(AppError::InvalidRequest(
            "platform, resource_slug and external_user_id must be non-empty".to_string(),
        ));
    }

    let recorded = verify_service::record_purchase(
        &pool,
        request.platform.trim(),
        request.resource_slug.trim(),
        request.external_user_id.trim(),
        request.username,
    )
    .await?;

    tracing::info!(
        api_key_id = %auth.api_key_id,
        user_id = %recorded.user_id,
        resource_id = %recorded.resource_id,
        duplicate = recorded.duplicate,
        "purchase recorded"
    );

    let status = if recorded.duplicate {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(recorded)))
}
