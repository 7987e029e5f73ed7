//! Ownership verification endpoint.
//!
//! `GET /verify` and `POST /verify` answer the same question with the same
//! parameters; GET takes them from the query string, POST from a JSON body.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    db::DbPool, error::AppError, middleware::auth::AuthContext,
    services::verify_service,
};

/// Verification parameters.
///
/// # Fields
///
/// - `resource`: canonical slug or a platform listing id (e.g. "p123")
/// - `user`: the user's external id on the marketplace
/// - `platform`: optional scope; without it, identifiers match on any platform
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub resource: String,
    pub user: String,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Verification result.
///
/// `owned` is false both when no purchase links the pair and when either
/// identifier is unknown; callers cannot probe which identifiers exist.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub owned: bool,
}

/// `GET /verify?resource=...&user=...[&platform=...]`
pub async fn verify_get(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<VerifyResponse>, AppError> {
    run_verify(&pool, &auth, params).await
}

/// `POST /verify` with a JSON body carrying the same parameters.
pub async fn verify_post(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(params): Json<VerifyParams>,
) -> Result<Json<VerifyResponse>, AppError> {
    run_verify(&pool, &auth, params).await
}

async fn run_verify(
    pool: &DbPool,
    auth: &AuthContext,
    params: VerifyParams,
) -> Result<Json<VerifyResponse>, AppError> {
    let resource = params.resource.trim();
    let user = params.user.trim();

    if resource.is_empty() || user.is_empty() {
        return Err(AppError::InvalidRequest(
            "resource and user identifiers must be non-empty".to_string(),
        ));
    }

    let owned =
        verify_service::verify_ownership(pool, resource, user, params.platform.as_deref()).await?;

    tracing::debug!(
        api_key_id = %auth.api_key_id,
        resource,
        user,
        owned,
        "verification lookup"
    );

    Ok(Json(VerifyResponse { owned }))
}
