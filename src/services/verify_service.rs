//! Ownership verification and purchase recording.
//!
//! This service answers the one question the API exists for: does this user
//! own this resource? It also owns the write path that establishes
//! ownership, so the resolution rules live in a single place.
//!
//! # Resolution rules
//!
//! A resource identifier matches either the canonical `slug` or, failing
//! that, a platform link's `external_resource_id` (scoped to a platform
//! when one is given). A user identifier matches `external_user_id`,
//! again optionally platform-scoped.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::purchase::PurchaseRecordedResponse,
};

/// Check whether the user identified by `user_ident` owns the resource
/// identified by `resource_ident`.
///
/// Read-only and deterministic. "Resource unknown", "user unknown", and
/// "both known but no purchase" are the same observable outcome: `false`.
/// Only database failures are errors.
pub async fn verify_ownership(
    pool: &DbPool,
    resource_ident: &str,
    user_ident: &str,
    platform: Option<&str>,
) -> Result<bool, AppError> {
    let resource_ids = resolve_resource(pool, resource_ident, platform).await?;
    if resource_ids.is_empty() {
        return Ok(false);
    }

    // One indexed EXISTS probe. Joining users here (rather than resolving
    // the user first) keeps "user unknown" and "no purchase" on the same
    // code path.
    let owned: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM purchases pu
            JOIN users u ON u.id = pu.user_id
            JOIN platforms p ON p.id = u.platform_id
            WHERE pu.resource_id = ANY($1)
              AND u.external_user_id = $2
              AND ($3::text IS NULL OR p.name = $3)
        )
        "#,
    )
    .bind(&resource_ids)
    .bind(user_ident)
    .bind(platform)
    .fetch_one(pool)
    .await?;

    Ok(owned)
}

/// Resolve a resource identifier to internal ids.
///
/// Tries the canonical slug first, then platform links. Without a platform
/// scope the same external id may be registered on several platforms for
/// different resources; all matches are returned so the ownership check can
/// consider every candidate rather than an arbitrary one.
async fn resolve_resource(
    pool: &DbPool,
    resource_ident: &str,
    platform: Option<&str>,
) -> Result<Vec<Uuid>, AppError> {
    let by_slug: Option<Uuid> = sqlx::query_scalar("SELECT id FROM resources WHERE slug = $1")
        .bind(resource_ident)
        .fetch_optional(pool)
        .await?;

    if let Some(id) = by_slug {
        return Ok(vec![id]);
    }

    let by_link: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT l.resource_id
        FROM resource_links l
        JOIN platforms p ON p.id = l.platform_id
        WHERE l.external_resource_id = $1
          AND ($2::text IS NULL OR p.name = $2)
        "#,
    )
    .bind(resource_ident)
    .bind(platform)
    .fetch_all(pool)
    .await?;

    Ok(by_link)
}

/// Record a confirmed purchase: user `external_user_id` on `platform` owns
/// the resource with slug `resource_slug`.
///
/// # Process
///
/// 1. Resolve the platform (400 if unknown)
/// 2. Upsert the user (created on first observed purchase)
/// 3. Resolve the resource by slug (404 if unknown)
/// 4. Insert the purchase, unless one already exists
///
/// All inside one database transaction.
///
/// # Returns
///
/// The recorded purchase, with `duplicate: true` when the
/// (platform, user, resource) row already existed.
pub async fn record_purchase(
    pool: &DbPool,
    platform: &str,
    resource_slug: &str,
    external_user_id: &str,
    username: Option<String>,
) -> Result<PurchaseRecordedResponse, AppError> {
    let mut tx = pool.begin().await?;

    let platform_id: i32 = sqlx::query_scalar("SELECT id FROM platforms WHERE name = $1")
        .bind(platform)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::InvalidRequest(format!("unknown platform: {platform}")))?;

    // Upsert the user identity. A purchase may be the first time we see this
    // account; if we already know it, keep the freshest username.
    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (platform_id, external_user_id, username)
        VALUES ($1, $2, $3)
        ON CONFLICT (platform_id, external_user_id)
        DO UPDATE SET username = COALESCE(EXCLUDED.username, users.username)
        RETURNING id
        "#,
    )
    .bind(platform_id)
    .bind(external_user_id)
    .bind(&username)
    .fetch_one(&mut *tx)
    .await?;

    let resource_id: Uuid = sqlx::query_scalar("SELECT id FROM resources WHERE slug = $1")
        .bind(resource_slug)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("resource {resource_slug}")))?;

    // A user is verified at most once per resource per platform
    let existing: Option<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id FROM purchases
        WHERE platform_id = $1 AND user_id = $2 AND resource_id = $3
        "#,
    )
    .bind(platform_id)
    .bind(user_id)
    .bind(resource_id)
    .fetch_optional(&mut *tx)
    .await?;

    if existing.is_some() {
        tx.commit().await?;
        return Ok(PurchaseRecordedResponse {
            recorded: true,
            duplicate: true,
            user_id,
            resource_id,
        });
    }

    sqlx::query(
        r#"
        INSERT INTO purchases (user_id, resource_id, platform_id)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(resource_id)
    .bind(platform_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(PurchaseRecordedResponse {
        recorded: true,
        duplicate: false,
        user_id,
        resource_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    async fn seed_resource(pool: &PgPool, slug: &str) -> Uuid {
        sqlx::query_scalar("INSERT INTO resources (slug, name) VALUES ($1, $1) RETURNING id")
            .bind(slug)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn link(pool: &PgPool, resource_id: Uuid, platform: &str, external_id: &str) {
        sqlx::query(
            r#"
            INSERT INTO resource_links (resource_id, platform_id, external_resource_id)
            SELECT $1, id, $3 FROM platforms WHERE name = $2
            "#,
        )
        .bind(resource_id)
        .bind(platform)
        .bind(external_id)
        .execute(pool)
        .await
        .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn purchase_then_verify(pool: PgPool) {
        seed_resource(&pool, "my-plugin").await;

        let recorded = record_purchase(&pool, "spigot", "my-plugin", "84721", None)
            .await
            .unwrap();
        assert!(!recorded.duplicate);

        assert!(verify_ownership(&pool, "my-plugin", "84721", None).await.unwrap());
        assert!(verify_ownership(&pool, "my-plugin", "84721", Some("spigot")).await.unwrap());
        // Wrong platform scope, unknown user, unknown resource: all false
        assert!(!verify_ownership(&pool, "my-plugin", "84721", Some("polymart")).await.unwrap());
        assert!(!verify_ownership(&pool, "my-plugin", "99999", None).await.unwrap());
        assert!(!verify_ownership(&pool, "no-such", "84721", None).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn shared_external_id_checks_every_candidate(pool: PgPool) {
        // The same numeric id points at different resources on two
        // platforms. An unscoped lookup must consider both, not whichever
        // link happens to sort first.
        let spigot_res = seed_resource(&pool, "spigot-plugin").await;
        let polymart_res = seed_resource(&pool, "polymart-plugin").await;
        link(&pool, spigot_res, "spigot", "12345").await;
        link(&pool, polymart_res, "polymart", "12345").await;

        // The purchase lives on the polymart-linked resource only
        record_purchase(&pool, "polymart", "polymart-plugin", "84721", None)
            .await
            .unwrap();

        assert!(verify_ownership(&pool, "12345", "84721", None).await.unwrap());
        assert!(verify_ownership(&pool, "12345", "84721", Some("polymart")).await.unwrap());
        assert!(!verify_ownership(&pool, "12345", "84721", Some("spigot")).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_purchase_is_flagged(pool: PgPool) {
        seed_resource(&pool, "my-plugin").await;

        let first = record_purchase(&pool, "spigot", "my-plugin", "84721", Some("steve".into()))
            .await
            .unwrap();
        let second = record_purchase(&pool, "spigot", "my-plugin", "84721", None)
            .await
            .unwrap();

        assert!(!first.duplicate);
        assert!(second.duplicate);
        assert_eq!(first.user_id, second.user_id);

        let purchases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(purchases, 1);
    }
}
