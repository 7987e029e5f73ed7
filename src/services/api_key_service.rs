//! API key service - generation, hashing, and lifecycle management.
//!
//! Keys are random `sk_`-prefixed tokens. Only the SHA-256 hash of a key is
//! stored; the plaintext exists in memory exactly once, inside the
//! [`CreatedKey`] returned to the caller at creation time.

use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{db::DbPool, error::AppError, models::api_key::ApiKeySummary};

/// Minimum accepted secret length. Anything shorter is trivially brute-forceable.
const MIN_KEY_LENGTH: usize = 8;

/// A freshly created API key.
///
/// The `plaintext` field is the only place the secret ever appears; it is
/// printed once by the CLI and then gone.
#[derive(Debug)]
pub struct CreatedKey {
    pub id: Uuid,
    pub name: String,
    pub plaintext: String,
}

/// Generate a random alphanumeric token of the given length.
///
/// Uses the thread-local rng, which is a CSPRNG.
pub fn random_token(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generate a new API key secret: `sk_` followed by `length` random
/// alphanumeric characters.
///
/// # Errors
///
/// `InvalidRequest` if `length` is below [`MIN_KEY_LENGTH`].
pub fn generate_api_key(length: usize) -> Result<String, AppError> {
    if length < MIN_KEY_LENGTH {
        return Err(AppError::InvalidRequest(format!(
            "key length must be >= {MIN_KEY_LENGTH}"
        )));
    }

    Ok(format!("sk_{}", random_token(length)))
}

/// Hash an API key with SHA-256, returning 64 lowercase hex characters.
///
/// The same function is used at creation time and at authentication time,
/// so lookups are a single indexed equality match.
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Create a new API key and persist its hash plus metadata.
///
/// Returns the plaintext exactly once. After this call the secret cannot be
/// recovered from the database.
pub async fn create_key(
    pool: &DbPool,
    name: Option<String>,
    length: usize,
) -> Result<CreatedKey, AppError> {
    let plaintext = generate_api_key(length)?;
    let key_hash = hash_api_key(&plaintext);
    let name = name.unwrap_or_else(|| "generated".to_string());

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO api_keys (name, key_hash, is_active)
        VALUES ($1, $2, true)
        RETURNING id
        "#,
    )
    .bind(&name)
    .bind(&key_hash)
    .fetch_one(pool)
    .await?;

    Ok(CreatedKey {
        id,
        name,
        plaintext,
    })
}

/// Create the first API key, but only if none exists yet.
///
/// Returns `None` when a key is already present. This is the explicit
/// bootstrap path; the server never creates keys on boot.
pub async fn init_key(pool: &DbPool, length: usize) -> Result<Option<CreatedKey>, AppError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys")
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        return Ok(None);
    }

    let created = create_key(pool, Some("default".to_string()), length).await?;
    Ok(Some(created))
}

/// List all API keys as summaries (no hashes, no plaintext).
pub async fn list_keys(pool: &DbPool) -> Result<Vec<ApiKeySummary>, AppError> {
    let keys = sqlx::query_as::<_, ApiKeySummary>(
        r#"
        SELECT id, name, is_active, created_at, last_used_at
        FROM api_keys
        ORDER BY created_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(keys)
}

/// Flip the active flag on a key. Idempotent: setting an already-active key
/// to active succeeds.
///
/// # Errors
///
/// `NotFound` if no key with the given id exists.
pub async fn set_active(pool: &DbPool, id: Uuid, active: bool) -> Result<(), AppError> {
    let updated = sqlx::query("UPDATE api_keys SET is_active = $1 WHERE id = $2")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(AppError::NotFound(format!("API key {id}")));
    }

    Ok(())
}

/// Permanently delete a key.
///
/// # Errors
///
/// `NotFound` if no key with the given id exists.
pub async fn delete_key(pool: &DbPool, id: Uuid) -> Result<(), AppError> {
    let deleted = sqlx::query("DELETE FROM api_keys WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound(format!("API key {id}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_has_prefix_and_length() {
        let key = generate_api_key(48).unwrap();
        assert!(key.starts_with("sk_"));
        assert_eq!(key.len(), "sk_".len() + 48);
        assert!(key["sk_".len()..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn short_length_is_rejected() {
        assert!(generate_api_key(7).is_err());
        assert!(generate_api_key(8).is_ok());
    }

    #[test]
    fn generated_keys_are_unique() {
        // Probabilistic, but at 48 alphanumeric chars a collision here would
        // mean the rng is broken.
        let a = generate_api_key(48).unwrap();
        let b = generate_api_key(48).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_deterministic_hex() {
        let key = "sk_testtesttest";
        let h1 = hash_api_key(key);
        let h2 = hash_api_key(key);

        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
        // Hash must not expose the plaintext
        assert!(!h1.contains("test"));
    }

    #[test]
    fn different_keys_hash_differently() {
        assert_ne!(hash_api_key("sk_aaaaaaaa"), hash_api_key("sk_aaaaaaab"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn lifecycle_on_fresh_store_reports_not_found(pool: sqlx::PgPool) {
        // Unknown ids against a freshly migrated, empty key table must come
        // back as NotFound, not as a raw database error.
        let ghost = Uuid::new_v4();

        assert!(matches!(
            set_active(&pool, ghost, true).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            set_active(&pool, ghost, false).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            delete_key(&pool, ghost).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_list_deactivate(pool: sqlx::PgPool) {
        let created = create_key(&pool, Some("ci".to_string()), 48).await.unwrap();
        assert!(created.plaintext.starts_with("sk_"));

        let keys = list_keys(&pool).await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, "ci");
        assert!(keys[0].is_active);

        set_active(&pool, created.id, false).await.unwrap();
        let keys = list_keys(&pool).await.unwrap();
        assert!(!keys[0].is_active);

        // init-key refuses once any key exists
        assert!(init_key(&pool, 48).await.unwrap().is_none());
    }
}
