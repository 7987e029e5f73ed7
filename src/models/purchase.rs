//! Purchase model.
//!
//! A purchase is the record that a user owns a resource, established on a
//! specific platform. It is the single source of truth for `/verify`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a purchase record from the database.
///
/// # Database Table
///
/// Maps to the `purchases` table. `(platform_id, user_id, resource_id)` is
/// unique: a user is verified at most once per resource per platform.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Purchase {
    /// Unique identifier for this purchase
    pub id: Uuid,

    /// The owning user
    pub user_id: Uuid,

    /// The owned resource
    pub resource_id: Uuid,

    /// Platform the ownership was confirmed on
    pub platform_id: i32,

    /// When ownership was confirmed
    pub verified_at: DateTime<Utc>,
}

/// Response body for `POST /purchases`.
#[derive(Debug, Serialize)]
pub struct PurchaseRecordedResponse {
    pub recorded: bool,

    /// True when the (platform, user, resource) purchase already existed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,

    pub user_id: Uuid,
    pub resource_id: Uuid,
}
