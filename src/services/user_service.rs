//! User identity management: Discord linking and user deletion.
//!
//! A user may link exactly one Discord account per platform identity, and a
//! Discord id may back at most one user per platform. Linking is how API
//! consumers (typically a support bot) resolve a buyer from chat without
//! asking for their marketplace account id every time.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::user::{DiscordLinkResponse, UserDeletedResponse},
};

/// Resolve `(platform name, external user id)` to an internal user id
/// within an open transaction.
async fn resolve_user(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    platform: &str,
    external_user_id: &str,
) -> Result<(i32, Uuid), AppError> {
    let platform_id: i32 = sqlx::query_scalar("SELECT id FROM platforms WHERE name = $1")
        .bind(platform)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("platform {platform}")))?;

    let user_id: Uuid = sqlx::query_scalar(
        "SELECT id FROM users WHERE platform_id = $1 AND external_user_id = $2",
    )
    .bind(platform_id)
    .bind(external_user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("user {external_user_id} on {platform}")))?;

    Ok((platform_id, user_id))
}

/// Link a Discord account to a user.
///
/// # Errors
///
/// - `NotFound`: unknown platform or user
/// - `Conflict`: another user on the same platform already claims this
///   Discord id
pub async fn set_discord(
    pool: &DbPool,
    platform: &str,
    external_user_id: &str,
    discord_id: &str,
) -> Result<DiscordLinkResponse, AppError> {
    let mut tx = pool.begin().await?;

    let (platform_id, user_id) = resolve_user(&mut tx, platform, external_user_id).await?;

    // Enforce uniqueness of discord_id per platform before writing, so the
    // caller gets a 409 instead of a bare constraint violation
    let taken: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM users WHERE platform_id = $1 AND discord_id = $2 AND id != $3",
    )
    .bind(platform_id)
    .bind(discord_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    if taken.is_some() {
        return Err(AppError::Conflict(
            "discord id already in use for this platform".to_string(),
        ));
    }

    sqlx::query("UPDATE users SET discord_id = $1 WHERE id = $2")
        .bind(discord_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(DiscordLinkResponse {
        updated: true,
        user_id,
        discord_id: Some(discord_id.to_string()),
    })
}

/// Remove a user's Discord link. Idempotent: unlinking a user with no link
/// succeeds.
pub async fn unset_discord(
    pool: &DbPool,
    platform: &str,
    external_user_id: &str,
) -> Result<DiscordLinkResponse, AppError> {
    let mut tx = pool.begin().await?;

    let (_, user_id) = resolve_user(&mut tx, platform, external_user_id).await?;

    sqlx::query("UPDATE users SET discord_id = NULL WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(DiscordLinkResponse {
        updated: true,
        user_id,
        discord_id: None,
    })
}

/// Permanently delete a user and their purchase history.
///
/// Purchases reference the user, so they go first, inside the same
/// transaction.
pub async fn delete_user(
    pool: &DbPool,
    platform: &str,
    external_user_id: &str,
) -> Result<UserDeletedResponse, AppError> {
    let mut tx = pool.begin().await?;

    let (_, user_id) = resolve_user(&mut tx, platform, external_user_id).await?;

    sqlx::query("DELETE FROM purchases WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(UserDeletedResponse {
        deleted: true,
        user_id,
    })
}
