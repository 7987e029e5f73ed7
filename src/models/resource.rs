//! Resource data models and API response types.
//!
//! This module defines:
//! - `Resource`: a purchasable product tracked across platforms
//! - `ResourceLink`: the resource's external identifier on one platform
//! - Response types for the listing and detail endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a resource record from the database.
///
/// # Database Table
///
/// Maps to the `resources` table. The `slug` is the canonical identifier
/// used in URLs and the plugin catalog; the UUID `id` is internal.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Resource {
    /// Internal unique identifier
    pub id: Uuid,

    /// Canonical human-readable identifier, unique across all resources
    pub slug: String,

    /// Display name
    pub name: String,
}

/// Associates a resource with its identifier on a specific platform.
///
/// # Database Table
///
/// Maps to the `resource_links` table with a composite primary key of
/// `(resource_id, platform_id)`. The `external_resource_id` is whatever
/// the marketplace uses to identify the listing (often numeric).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ResourceLink {
    pub resource_id: Uuid,
    pub platform_id: i32,
    pub external_resource_id: String,
}

/// One platform link as surfaced by the resource detail endpoint.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ResourceLinkInfo {
    /// Platform name, e.g. "spigot"
    pub platform: String,

    /// The resource's listing id on that platform
    pub external_resource_id: String,
}

/// Response body for `GET /resources/{slug}`.
///
/// # JSON Example
///
/// ```json
/// {
///   "slug": "my-plugin",
///   "name": "My Plugin",
///   "links": [
///     { "platform": "polymart", "external_resource_id": "p123" }
///   ]
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ResourceDetailResponse {
    pub slug: String,
    pub name: String,
    pub links: Vec<ResourceLinkInfo>,
}

/// A resource owned by a user, as surfaced by the user detail endpoint.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OwnedResource {
    pub slug: String,

    /// When the purchase was verified
    pub verified_at: DateTime<Utc>,
}
