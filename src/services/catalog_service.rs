//! Plugin catalog loading and refresh.
//!
//! The catalog (`data/plugins.json`) is the operator-maintained list of
//! resources and their per-platform listing ids. Two shapes are accepted:
//!
//! - a list: `[{"id": "my-plugin", "name": "My Plugin", "shops": {...}}, ...]`
//! - a map keyed by slug: `{"my-plugin": {"name": "My Plugin", "shops": {...}}, ...}`
//!
//! Shop keys use marketplace site names; `"spigotmc"` is normalized to the
//! `spigot` platform. `resource_id` values may be JSON numbers or strings.

use std::path::Path;

use serde_json::Value;

use crate::{db::DbPool, error::AppError};

/// One parsed catalog entry: a resource and its platform links.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub slug: String,
    pub name: String,
    pub links: Vec<CatalogLink>,
}

/// A resource's listing on one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogLink {
    /// Normalized platform name (as stored in the `platforms` table)
    pub platform: String,
    pub external_resource_id: String,
}

/// Counts reported by a catalog refresh.
#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub resources_created: u64,
    pub links_created: u64,
}

/// Map a catalog shop key to a platform name.
fn normalize_platform(shop_key: &str) -> &str {
    match shop_key {
        "spigotmc" => "spigot",
        other => other,
    }
}

/// Load and parse a catalog file. A missing file is an empty catalog, not
/// an error; a malformed one is.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>, AppError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AppError::InvalidRequest(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };

    parse_catalog(&raw)
}

/// Parse catalog JSON in either the list or the map shape.
pub fn parse_catalog(raw: &str) -> Result<Vec<CatalogEntry>, AppError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| AppError::InvalidRequest(format!("malformed catalog JSON: {e}")))?;

    match value {
        Value::Array(items) => {
            let mut entries = Vec::with_capacity(items.len());
            for item in items {
                let Value::Object(ref obj) = item else {
                    continue;
                };
                let slug = obj
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AppError::InvalidRequest(
                            "each catalog entry must include an 'id' field".to_string(),
                        )
                    })?
                    .to_string();
                entries.push(parse_entry(slug, obj)?);
            }
            Ok(entries)
        }
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(slug, item)| match item {
                Value::Object(ref obj) => Some(parse_entry(slug, obj)),
                _ => None,
            })
            .collect(),
        _ => Err(AppError::InvalidRequest(
            "unsupported catalog format: expected list or map".to_string(),
        )),
    }
}

fn parse_entry(
    slug: String,
    obj: &serde_json::Map<String, Value>,
) -> Result<CatalogEntry, AppError> {
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(&slug)
        .to_string();

    let mut links = Vec::new();
    if let Some(Value::Object(shops)) = obj.get("shops") {
        for (shop_key, meta) in shops {
            // Listing ids appear as both numbers and strings in the wild
            let external = match meta.get("resource_id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            if let Some(external_resource_id) = external {
                links.push(CatalogLink {
                    platform: normalize_platform(shop_key).to_string(),
                    external_resource_id,
                });
            }
        }
    }
    // Deterministic order regardless of JSON map iteration
    links.sort_by(|a, b| a.platform.cmp(&b.platform));

    Ok(CatalogEntry { slug, name, links })
}

/// Non-destructive upsert of resources and links from a parsed catalog.
///
/// Only inserts what is missing; existing rows are preserved, so this is
/// safe to run while the server is up. Links naming platforms not present
/// in the database are skipped.
pub async fn refresh(pool: &DbPool, entries: &[CatalogEntry]) -> Result<RefreshSummary, AppError> {
    let mut summary = RefreshSummary::default();
    let mut tx = pool.begin().await?;

    for entry in entries {
        let existing: Option<uuid::Uuid> =
            sqlx::query_scalar("SELECT id FROM resources WHERE slug = $1")
                .bind(&entry.slug)
                .fetch_optional(&mut *tx)
                .await?;

        let resource_id = match existing {
            Some(id) => id,
            None => {
                let id: uuid::Uuid = sqlx::query_scalar(
                    "INSERT INTO resources (slug, name) VALUES ($1, $2) RETURNING id",
                )
                .bind(&entry.slug)
                .bind(&entry.name)
                .fetch_one(&mut *tx)
                .await?;
                summary.resources_created += 1;
                id
            }
        };

        for link in &entry.links {
            let platform_id: Option<i32> =
                sqlx::query_scalar("SELECT id FROM platforms WHERE name = $1")
                    .bind(&link.platform)
                    .fetch_optional(&mut *tx)
                    .await?;

            let Some(platform_id) = platform_id else {
                tracing::warn!(
                    platform = %link.platform,
                    slug = %entry.slug,
                    "skipping catalog link for unknown platform"
                );
                continue;
            };

            let inserted = sqlx::query(
                r#"
                INSERT INTO resource_links (resource_id, platform_id, external_resource_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (resource_id, platform_id) DO NOTHING
                "#,
            )
            .bind(resource_id)
            .bind(platform_id)
            .bind(&link.external_resource_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            summary.links_created += inserted;
        }
    }

    tx.commit().await?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_list_shape() {
        let raw = r#"[
            {"id": "my-plugin", "name": "My Plugin",
             "shops": {"spigotmc": {"resource_id": 12345}, "polymart": {"resource_id": "p123"}}},
            {"id": "other", "name": "Other"}
        ]"#;

        let entries = parse_catalog(raw).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.slug, "my-plugin");
        assert_eq!(
            first.links,
            vec![
                CatalogLink {
                    platform: "polymart".to_string(),
                    external_resource_id: "p123".to_string(),
                },
                CatalogLink {
                    platform: "spigot".to_string(),
                    external_resource_id: "12345".to_string(),
                },
            ]
        );
        assert!(entries[1].links.is_empty());
    }

    #[test]
    fn parses_map_shape() {
        let raw = r#"{
            "my-plugin": {"name": "My Plugin", "shops": {"polymart": {"resource_id": "p123"}}}
        }"#;

        let entries = parse_catalog(raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].slug, "my-plugin");
        assert_eq!(entries[0].name, "My Plugin");
    }

    #[test]
    fn entry_without_name_falls_back_to_slug() {
        let entries = parse_catalog(r#"{"bare": {}}"#).unwrap();
        assert_eq!(entries[0].name, "bare");
    }

    #[test]
    fn list_entry_without_id_is_an_error() {
        assert!(parse_catalog(r#"[{"name": "no id"}]"#).is_err());
    }

    #[test]
    fn unsupported_root_is_an_error() {
        assert!(parse_catalog("123").is_err());
        assert!(parse_catalog("not json at all").is_err());
    }

    #[test]
    fn missing_file_is_empty_catalog() {
        let path = PathBuf::from("/nonexistent/definitely/plugins.json");
        assert!(load_catalog(&path).unwrap().is_empty());
    }
}
