//! User browsing and identity HTTP handlers.
//!
//! This module implements the user-related API endpoints:
//! - GET /users - Paginated user listing
//! - GET /users/{platform}/{external_user_id} - User detail with owned resources
//! - DELETE /users/{platform}/{external_user_id} - Delete a user and their purchases
//! - POST /users/{platform}/{external_user_id}/discord - Link a Discord account
//! - DELETE /users/{platform}/{external_user_id}/discord - Remove the link
//! - GET /users/{platform}/discord/{discord_id} - Look a user up by Discord id

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    db::DbPool,
    error::AppError,
    handlers::Pagination,
    models::{
        resource::OwnedResource,
        user::{
            DiscordLinkResponse, User, UserDeletedResponse, UserDetailResponse, UserSummary,
        },
    },
    services::user_service,
};

/// List users.
///
/// # Endpoint
///
/// `GET /users?page=1&per_page=50`
///
/// # Authentication
///
/// Requires valid API key.
///
/// # Response
///
/// Array of user summaries with the platform name joined in, ordered by
/// primary key for deterministic pages.
pub async fn list_users(
    State(pool): State<DbPool>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let (limit, offset) = pagination.limit_offset();

    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, p.name AS platform, u.external_user_id, u.username, u.created_at
        FROM users u
        JOIN platforms p ON p.id = u.platform_id
        ORDER BY u.id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    Ok(Json(users))
}

/// Get a user by platform name and external id, with their owned resources.
///
/// # Endpoint
///
/// `GET /users/{platform}/{external_user_id}`
///
/// # Response
///
/// - **Success (200 OK)**:
///
/// ```json
/// {
///   "id": "7c0e...",
///   "external_user_id": "84721",
///   "username": "steve",
///   "discord_id": null,
///   "resources": [
///     { "slug": "my-plugin", "verified_at": "2025-06-01T10:00:00Z" }
///   ]
/// }
/// ```
///
/// - **Error (404)**: unknown platform or no such user on it
pub async fn get_user(
    State(pool): State<DbPool>,
    Path((platform, external_user_id)): Path<(String, String)>,
) -> Result<Json<UserDetailResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.platform_id, u.external_user_id, u.username, u.discord_id, u.created_at
        FROM users u
        JOIN platforms p ON p.id = u.platform_id
        WHERE p.name = $1 AND u.external_user_id = $2
        "#,
    )
    .bind(&platform)
    .bind(&external_user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("user {external_user_id} on {platform}")))?;

    detail_response(&pool, user).await
}

/// Look a user up by their linked Discord id.
///
/// # Endpoint
///
/// `GET /users/{platform}/discord/{discord_id}`
///
/// # Response
///
/// Same shape as the regular detail endpoint; 404 when no user on the
/// platform has linked that Discord account.
pub async fn get_user_by_discord(
    State(pool): State<DbPool>,
    Path((platform, discord_id)): Path<(String, String)>,
) -> Result<Json<UserDetailResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.platform_id, u.external_user_id, u.username, u.discord_id, u.created_at
        FROM users u
        JOIN platforms p ON p.id = u.platform_id
        WHERE p.name = $1 AND u.discord_id = $2
        "#,
    )
    .bind(&platform)
    .bind(&discord_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("user with discord id {discord_id} on {platform}")))?;

    detail_response(&pool, user).await
}

/// Shared tail of the detail endpoints: attach owned resources.
async fn detail_response(
    pool: &DbPool,
    user: User,
) -> Result<Json<UserDetailResponse>, AppError> {
    let resources = sqlx::query_as::<_, OwnedResource>(
        r#"
        SELECT r.slug, pu.verified_at
        FROM purchases pu
        JOIN resources r ON r.id = pu.resource_id
        WHERE pu.user_id = $1
        ORDER BY pu.verified_at
        "#,
    )
    .bind(user.id)
    .fetch_all(pool)
    .await?;

    Ok(Json(UserDetailResponse {
        id: user.id,
        external_user_id: user.external_user_id,
        username: user.username,
        discord_id: user.discord_id,
        resources,
    }))
}

/// Request body for linking a Discord account.
#[derive(Debug, Deserialize)]
pub struct SetDiscordRequest {
    pub discord_id: String,
}

/// Link a Discord account to a user.
///
/// # Endpoint
///
/// `POST /users/{platform}/{external_user_id}/discord`
///
/// # Response
///
/// - **Success (200 OK)**: `{"updated": true, "user_id": ..., "discord_id": ...}`
/// - **Error (400)**: empty discord_id
/// - **Error (404)**: unknown platform or user
/// - **Error (409)**: Discord id already linked to another user on this platform
pub async fn set_discord(
    State(pool): State<DbPool>,
    Path((platform, external_user_id)): Path<(String, String)>,
    Json(request): Json<SetDiscordRequest>,
) -> Result<Json<DiscordLinkResponse>, AppError> {
    let discord_id = request.discord_id.trim();
    if discord_id.is_empty() {
        return Err(AppError::InvalidRequest(
            "discord_id must be non-empty".to_string(),
        ));
    }

    let updated =
        user_service::set_discord(&pool, &platform, &external_user_id, discord_id).await?;

    Ok(Json(updated))
}

/// Remove a user's Discord link.
///
/// # Endpoint
///
/// `DELETE /users/{platform}/{external_user_id}/discord`
///
/// Idempotent: succeeds even when no link was set.
pub async fn unset_discord(
    State(pool): State<DbPool>,
    Path((platform, external_user_id)): Path<(String, String)>,
) -> Result<Json<DiscordLinkResponse>, AppError> {
    let updated = user_service::unset_discord(&pool, &platform, &external_user_id).await?;
    Ok(Json(updated))
}

/// Permanently delete a user and their purchase history.
///
/// # Endpoint
///
/// `DELETE /users/{platform}/{external_user_id}`
///
/// # Response
///
/// - **Success (200 OK)**: `{"deleted": true, "user_id": ...}`
/// - **Error (404)**: unknown platform or user
pub async fn delete_user(
    State(pool): State<DbPool>,
    Path((platform, external_user_id)): Path<(String, String)>,
) -> Result<Json<UserDeletedResponse>, AppError> {
    let deleted = user_service::delete_user(&pool, &platform, &external_user_id).await?;
    Ok(Json(deleted))
}
