//! API Key model for authentication.
//!
//! API keys are used to authenticate clients making requests to the API.
//! They are stored in the database as SHA-256 hashes; the plaintext is
//! surfaced exactly once, at creation time, and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `key_hash`: SHA-256 hash of the actual API key
/// - `name`: Human-readable label chosen at creation
/// - `is_active`: Whether the key is currently valid
/// - `created_at`: When the key was created
/// - `last_used_at`: Last successful authentication, if any
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    /// Unique identifier for this API key
    pub id: Uuid,

    /// Human-readable label for this key
    pub name: String,

    /// SHA-256 hash of the actual API key (64 hex characters)
    ///
    /// When a request comes in with "Bearer sk_abc...", we:
    /// 1. Hash the token with SHA-256
    /// 2. Look up this hash in the database
    /// 3. If found and active, authenticate the request
    pub key_hash: String,

    /// Whether this API key is currently active
    ///
    /// Inactive keys are rejected during authentication with 403. This
    /// provides a way to revoke access without deleting the record.
    pub is_active: bool,

    /// Timestamp when this API key was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last successful authentication with this key
    pub last_used_at: Option<DateTime<Utc>>,
}

/// API key identity and metadata, without the hash.
///
/// This is the only shape in which key records leave the data store: it is
/// what `list` prints and what `db-export` writes. The hash is not a field
/// here, so it cannot leak by accident.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ApiKeySummary {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<ApiKey> for ApiKeySummary {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            name: key.name,
            is_active: key.is_active,
            created_at: key.created_at,
            last_used_at: key.last_used_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_never_contains_hash() {
        let key = ApiKey {
            id: Uuid::new_v4(),
            name: "ci".to_string(),
            key_hash: "deadbeef".repeat(8),
            is_active: true,
            created_at: Utc::now(),
            last_used_at: None,
        };

        let summary: ApiKeySummary = key.clone().into();
        let json = serde_json::to_string(&summary).unwrap();

        assert!(!json.contains(&key.key_hash));
        assert!(json.contains(&key.id.to_string()));
    }
}
