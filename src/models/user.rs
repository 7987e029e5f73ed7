//! User data models and API response types.
//!
//! A user is an end-user identity keyed by a platform-specific external id
//! (e.g. a Polymart account id). Users are created on first observed
//! purchase or by `db-import`; the read API never creates them. A user may
//! additionally link a Discord account, which callers use to resolve buyers
//! from chat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::resource::OwnedResource;

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. `(platform_id, external_user_id)` is unique:
/// the same marketplace account cannot be registered twice, but the same
/// person can appear once per platform. `(platform_id, discord_id)` is
/// unique when `discord_id` is set.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct User {
    /// Internal unique identifier
    pub id: Uuid,

    /// Platform this identity belongs to
    pub platform_id: i32,

    /// The user's id on that platform
    pub external_user_id: String,

    /// Display name captured at purchase time, if any
    pub username: Option<String>,

    /// Linked Discord account id, if any; set and cleared via the API
    pub discord_id: Option<String>,

    /// When this identity was first observed
    pub created_at: DateTime<Utc>,
}

/// One row of the `GET /users` listing.
///
/// Joins in the platform name so clients don't need to resolve ids.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub platform: String,
    pub external_user_id: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Response body for the user detail endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "external_user_id": "84721",
///   "username": "steve",
///   "discord_id": "198273645019283746",
///   "resources": [
///     { "slug": "my-plugin", "verified_at": "2025-06-01T10:00:00Z" }
///   ]
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub id: Uuid,
    pub external_user_id: String,
    pub username: Option<String>,
    pub discord_id: Option<String>,

    /// Resources this user has verified purchases for
    pub resources: Vec<OwnedResource>,
}

/// Response body for the Discord link/unlink endpoints.
#[derive(Debug, Serialize)]
pub struct DiscordLinkResponse {
    pub updated: bool,
    pub user_id: Uuid,

    /// The link after the operation: the new id, or `null` after unlink
    pub discord_id: Option<String>,
}

/// Response body for `DELETE /users/{platform}/{external_user_id}`.
#[derive(Debug, Serialize)]
pub struct UserDeletedResponse {
    pub deleted: bool,
    pub user_id: Uuid,
}
