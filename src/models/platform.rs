//! Platform model.
//!
//! A platform is a third-party marketplace (Spigot, Polymart, BuiltByBit)
//! where resources are sold. Platforms are reference data seeded by
//! migration and are never mutated at runtime.

use serde::{Deserialize, Serialize};

/// Represents a platform record from the database.
///
/// # Database Table
///
/// Maps to the `platforms` table:
/// - `id`: Small serial primary key
/// - `name`: Unique platform name, e.g. "polymart"
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Platform {
    pub id: i32,
    pub name: String,
}
