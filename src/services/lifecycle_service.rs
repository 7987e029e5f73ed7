//! Database lifecycle operations: reset, export, import, connectivity probe.
//!
//! Export produces a single JSON document keyed by table name, rows ordered
//! by primary key. API keys are exported as summaries only: the plaintext
//! was never stored and the hash is deliberately omitted, so a restored
//! database requires freshly issued keys.

use serde::{Deserialize, Serialize};

use crate::{
    db::{self, DbPool},
    error::AppError,
    models::{
        api_key::ApiKeySummary, platform::Platform, purchase::Purchase,
        resource::{Resource, ResourceLink}, user::User,
    },
};

/// The on-disk export format: one key per table, rows in primary-key order.
///
/// `api_keys` carries identity and metadata only. Field defaults let older
/// exports (or hand-trimmed files) omit whole sections on import.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExportDocument {
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub resource_links: Vec<ResourceLink>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    #[serde(default)]
    pub api_keys: Vec<ApiKeySummary>,
}

/// Per-table row counts reported by `db-import`.
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub platforms: u64,
    pub resources: u64,
    pub resource_links: u64,
    pub users: u64,
    pub purchases: u64,

    /// API key rows present in the document but not imported (their hashes
    /// are not exportable, so the records cannot be reconstructed)
    pub api_keys_skipped: usize,
}

/// Serialize every table into an [`ExportDocument`].
pub async fn export(pool: &DbPool) -> Result<ExportDocument, AppError> {
    let platforms = sqlx::query_as::<_, Platform>("SELECT id, name FROM platforms ORDER BY id")
        .fetch_all(pool)
        .await?;

    let resources =
        sqlx::query_as::<_, Resource>("SELECT id, slug, name FROM resources ORDER BY id")
            .fetch_all(pool)
            .await?;

    let resource_links = sqlx::query_as::<_, ResourceLink>(
        r#"
        SELECT resource_id, platform_id, external_resource_id
        FROM resource_links
        ORDER BY resource_id, platform_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, platform_id, external_user_id, username, discord_id, created_at
        FROM users
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let purchases = sqlx::query_as::<_, Purchase>(
        "SELECT id, user_id, resource_id, platform_id, verified_at FROM purchases ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let api_keys = sqlx::query_as::<_, ApiKeySummary>(
        "SELECT id, name, is_active, created_at, last_used_at FROM api_keys ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(ExportDocument {
        platforms,
        resources,
        resource_links,
        users,
        purchases,
        api_keys,
    })
}

/// Upsert every row of an [`ExportDocument`] by primary key, in dependency
/// order, inside one transaction.
///
/// Existing rows with a matching primary key are overwritten; new rows are
/// inserted. The `api_keys` section is counted but skipped (see module docs).
pub async fn import(pool: &DbPool, doc: ExportDocument) -> Result<ImportSummary, AppError> {
    let mut summary = ImportSummary {
        api_keys_skipped: doc.api_keys.len(),
        ..Default::default()
    };

    let mut tx = pool.begin().await?;

    for p in &doc.platforms {
        sqlx::query(
            r#"
            INSERT INTO platforms (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(p.id)
        .bind(&p.name)
        .execute(&mut *tx)
        .await?;
        summary.platforms += 1;
    }

    // Platforms carry explicit serial ids; realign the sequence so later
    // inserts don't collide with imported rows.
    if !doc.platforms.is_empty() {
        sqlx::query(
            r#"
            SELECT setval(
                pg_get_serial_sequence('platforms', 'id'),
                (SELECT COALESCE(MAX(id), 1) FROM platforms)
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;
    }

    for r in &doc.resources {
        sqlx::query(
            r#"
            INSERT INTO resources (id, slug, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET slug = EXCLUDED.slug, name = EXCLUDED.name
            "#,
        )
        .bind(r.id)
        .bind(&r.slug)
        .bind(&r.name)
        .execute(&mut *tx)
        .await?;
        summary.resources += 1;
    }

    for l in &doc.resource_links {
        sqlx::query(
            r#"
            INSERT INTO resource_links (resource_id, platform_id, external_resource_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (resource_id, platform_id)
            DO UPDATE SET external_resource_id = EXCLUDED.external_resource_id
            "#,
        )
        .bind(l.resource_id)
        .bind(l.platform_id)
        .bind(&l.external_resource_id)
        .execute(&mut *tx)
        .await?;
        summary.resource_links += 1;
    }

    for u in &doc.users {
        sqlx::query(
            r#"
            INSERT INTO users (id, platform_id, external_user_id, username, discord_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                platform_id = EXCLUDED.platform_id,
                external_user_id = EXCLUDED.external_user_id,
                username = EXCLUDED.username,
                discord_id = EXCLUDED.discord_id,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(u.id)
        .bind(u.platform_id)
        .bind(&u.external_user_id)
        .bind(&u.username)
        .bind(&u.discord_id)
        .bind(u.created_at)
        .execute(&mut *tx)
        .await?;
        summary.users += 1;
    }

    for p in &doc.purchases {
        sqlx::query(
            r#"
            INSERT INTO purchases (id, user_id, resource_id, platform_id, verified_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                resource_id = EXCLUDED.resource_id,
                platform_id = EXCLUDED.platform_id,
                verified_at = EXCLUDED.verified_at
            "#,
        )
        .bind(p.id)
        .bind(p.user_id)
        .bind(p.resource_id)
        .bind(p.platform_id)
        .bind(p.verified_at)
        .execute(&mut *tx)
        .await?;
        summary.purchases += 1;
    }

    tx.commit().await?;

    Ok(summary)
}

/// Drop and recreate the whole schema.
///
/// The confirmation check lives at the CLI boundary; by the time this runs
/// the operator has already said `--yes-i-am-sure`.
pub async fn reset(pool: &DbPool) -> Result<(), AppError> {
    db::drop_all(pool).await?;
    db::run_migrations(pool)
        .await
        .map_err(|e| AppError::Database(e.into()))?;
    Ok(())
}

/// Connectivity probe: a trivial query against the store.
pub async fn probe(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_document_round_trips() {
        let raw = r#"{
            "platforms": [{"id": 1, "name": "polymart"}],
            "resources": [{"id": "2d6d5a44-9f44-4d38-bd55-3d35ec2c30b3", "slug": "my-plugin", "name": "My Plugin"}],
            "resource_links": [{"resource_id": "2d6d5a44-9f44-4d38-bd55-3d35ec2c30b3", "platform_id": 1, "external_resource_id": "p123"}],
            "users": [{"id": "7c0e8d9c-1111-4222-8333-444455556666", "platform_id": 1, "external_user_id": "84721", "username": "steve", "created_at": "2025-06-01T10:00:00Z"}],
            "purchases": [{"id": "9a0e8d9c-1111-4222-8333-444455556666", "user_id": "7c0e8d9c-1111-4222-8333-444455556666", "resource_id": "2d6d5a44-9f44-4d38-bd55-3d35ec2c30b3", "platform_id": 1, "verified_at": "2025-06-02T10:00:00Z"}]
        }"#;

        let doc: ExportDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.platforms.len(), 1);
        assert_eq!(doc.resources[0].slug, "my-plugin");
        assert_eq!(doc.resource_links[0].external_resource_id, "p123");
        assert_eq!(doc.users[0].username.as_deref(), Some("steve"));
        // api_keys section absent entirely: tolerated
        assert!(doc.api_keys.is_empty());

        let serialized = serde_json::to_value(&doc).unwrap();
        assert_eq!(serialized["platforms"][0]["name"], "polymart");
        assert_eq!(serialized["users"][0]["external_user_id"], "84721");
    }

    #[test]
    fn empty_document_parses() {
        let doc: ExportDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.platforms.is_empty());
        assert!(doc.purchases.is_empty());
    }

    async fn table_counts(pool: &sqlx::PgPool) -> (i64, i64, i64, i64, i64, i64) {
        let count = |table: &str| {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            let pool = pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(&sql)
                    .fetch_one(&pool)
                    .await
                    .unwrap()
            }
        };
        (
            count("platforms").await,
            count("resources").await,
            count("resource_links").await,
            count("users").await,
            count("purchases").await,
            count("api_keys").await,
        )
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn export_wipe_import_restores_all_rows_except_api_keys(pool: sqlx::PgPool) {
        // Seed one row in every table beyond the migration-seeded platforms
        let resource_id: uuid::Uuid = sqlx::query_scalar(
            "INSERT INTO resources (slug, name) VALUES ('my-plugin', 'My Plugin') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        sqlx::query(
            r#"
            INSERT INTO resource_links (resource_id, platform_id, external_resource_id)
            SELECT $1, id, 'p123' FROM platforms WHERE name = 'polymart'
            "#,
        )
        .bind(resource_id)
        .execute(&pool)
        .await
        .unwrap();

        let user_id: uuid::Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (platform_id, external_user_id, username, discord_id)
            SELECT id, '84721', 'steve', 'd-123' FROM platforms WHERE name = 'polymart'
            RETURNING id
            "#,
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        sqlx::query(
            r#"
            INSERT INTO purchases (user_id, resource_id, platform_id)
            SELECT $1, $2, id FROM platforms WHERE name = 'polymart'
            "#,
        )
        .bind(user_id)
        .bind(resource_id)
        .execute(&pool)
        .await
        .unwrap();

        crate::services::api_key_service::create_key(&pool, Some("ci".to_string()), 48)
            .await
            .unwrap();

        let before = table_counts(&pool).await;
        assert_eq!(before.5, 1, "seeded one api key");

        let doc = export(&pool).await.unwrap();
        assert_eq!(doc.api_keys.len(), 1);
        assert_eq!(doc.users[0].discord_id.as_deref(), Some("d-123"));

        // Wipe, then restore from the document
        reset(&pool).await.unwrap();
        let summary = import(&pool, doc).await.unwrap();
        assert_eq!(summary.api_keys_skipped, 1);

        let after = table_counts(&pool).await;
        assert_eq!(after.0, before.0, "platforms");
        assert_eq!(after.1, before.1, "resources");
        assert_eq!(after.2, before.2, "resource_links");
        assert_eq!(after.3, before.3, "users");
        assert_eq!(after.4, before.4, "purchases");
        // Key hashes are never exported, so keys do not survive the wipe
        assert_eq!(after.5, 0, "api_keys");

        let restored: Option<String> =
            sqlx::query_scalar("SELECT discord_id FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(restored.as_deref(), Some("d-123"));
    }
}
