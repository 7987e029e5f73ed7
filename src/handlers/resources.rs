//! Resource browsing HTTP handlers.
//!
//! This module implements the resource-related API endpoints:
//! - GET /resources - Paginated resource listing
//! - GET /resources/{slug} - Resource detail with platform links

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    db::DbPool,
    error::AppError,
    handlers::Pagination,
    models::resource::{Resource, ResourceDetailResponse, ResourceLinkInfo},
};

/// List resources.
///
/// # Endpoint
///
/// `GET /resources?page=1&per_page=50`
///
/// # Authentication
///
/// Requires valid API key.
///
/// # Response
///
/// Array of resource summaries, ordered by primary key so pages are
/// deterministic:
///
/// ```json
/// [
///   { "id": "2d6d...", "slug": "my-plugin", "name": "My Plugin" }
/// ]
/// ```
pub async fn list_resources(
    State(pool): State<DbPool>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<Resource>>, AppError> {
    let (limit, offset) = pagination.limit_offset();

    let resources = sqlx::query_as::<_, Resource>(
        r#"
        SELECT id, slug, name
        FROM resources
        ORDER BY id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    Ok(Json(resources))
}

/// Get a single resource by slug, including its platform links.
///
/// # Endpoint
///
/// `GET /resources/{slug}`
///
/// # Response
///
/// - **Success (200 OK)**: resource detail with links
/// - **Error (404)**: no resource with that slug
pub async fn get_resource(
    State(pool): State<DbPool>,
    Path(slug): Path<String>,
) -> Result<Json<ResourceDetailResponse>, AppError> {
    let resource = sqlx::query_as::<_, Resource>(
        "SELECT id, slug, name FROM resources WHERE slug = $1",
    )
    .bind(&slug)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("resource {slug}")))?;

    let links = sqlx::query_as::<_, ResourceLinkInfo>(
        r#"
        SELECT p.name AS platform, l.external_resource_id
        FROM resource_links l
        JOIN platforms p ON p.id = l.platform_id
        WHERE l.resource_id = $1
        ORDER BY p.name
        "#,
    )
    .bind(resource.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(ResourceDetailResponse {
        slug: resource.slug,
        name: resource.name,
        links,
    }))
}
