//! API key authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the API key from the Authorization header
//! 2. Hash it and look it up in the database
//! 3. Inject authentication context into the request
//! 4. Reject requests with unknown keys (401) or inactive keys (403)

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    db::DbPool, error::AppError, models::api_key::ApiKey,
    services::api_key_service,
};

/// Authentication context attached to authenticated requests.
///
/// This struct is inserted into the request's extension map and can be
/// extracted by route handlers to know who made the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated API key
    pub api_key_id: Uuid,

    /// Label of the key making the request (for logs, never for decisions)
    pub key_name: String,
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
fn extract_bearer(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ")
}

/// API key authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <key>` header from request
/// 2. Hash the `<key>` using SHA-256
/// 3. Query database for a record with a matching hash
/// 4. Unknown hash: 401. Known but inactive: 403. Active: proceed,
///    injecting [`AuthContext`] and bumping `last_used_at`
///
/// The unknown/inactive distinction is deliberate: a revoked integration
/// learns it must obtain a new key, while a caller probing random tokens
/// gets the same 401 regardless of whether anything is stored.
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = extract_bearer(
        request
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok()),
    )
    .ok_or(AppError::Unauthorized)?;

    // Same hash function as key creation, so this is one indexed lookup
    let key_hash = api_key_service::hash_api_key(api_key);

    let record = sqlx::query_as::<_, ApiKey>(
        r#"
        SELECT id, name, key_hash, is_active, created_at, last_used_at
        FROM api_keys
        WHERE key_hash = $1
        "#,
    )
    .bind(&key_hash)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if !record.is_active {
        return Err(AppError::Forbidden);
    }

    // Best effort audit trail; an error here must not fail the request
    if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
        .bind(record.id)
        .execute(&pool)
        .await
    {
        tracing::warn!(api_key_id = %record.id, error = %e, "failed to update last_used_at");
    }

    let auth_context = AuthContext {
        api_key_id: record.id,
        key_name: record.name,
    };

    // Route handlers can extract this using Extension<AuthContext>
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(Some("Bearer sk_abc123")), Some("sk_abc123"));
        assert_eq!(extract_bearer(Some("bearer sk_abc123")), None);
        assert_eq!(extract_bearer(Some("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer(Some("sk_abc123")), None);
        assert_eq!(extract_bearer(None), None);
    }

    #[test]
    fn empty_token_is_still_a_token() {
        // "Bearer " with nothing after it extracts an empty string; it will
        // hash to a value no stored key matches, so auth fails with 401.
        assert_eq!(extract_bearer(Some("Bearer ")), Some(""));
    }

    mod live {
        use axum::{
            Router,
            body::Body,
            http::{Request as HttpRequest, StatusCode},
            middleware as axum_middleware,
            routing::get,
        };
        use sqlx::PgPool;
        use tower::ServiceExt;

        use crate::services::api_key_service;

        fn protected_app(pool: PgPool) -> Router {
            Router::new()
                .route("/ping", get(|| async { "pong" }))
                .route_layer(axum_middleware::from_fn_with_state(
                    pool.clone(),
                    super::super::auth_middleware,
                ))
                .with_state(pool)
        }

        async fn request(app: &Router, auth: Option<&str>) -> StatusCode {
            let mut builder = HttpRequest::builder().uri("/ping");
            if let Some(value) = auth {
                builder = builder.header("Authorization", value);
            }
            let response = app
                .clone()
                .oneshot(builder.body(Body::empty()).unwrap())
                .await
                .unwrap();
            response.status()
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn active_key_authorizes_inactive_key_is_forbidden(pool: PgPool) {
            let created = api_key_service::create_key(&pool, Some("ci".to_string()), 48)
                .await
                .unwrap();
            let app = protected_app(pool.clone());
            let bearer = format!("Bearer {}", created.plaintext);

            assert_eq!(request(&app, Some(&bearer)).await, StatusCode::OK);

            // Deactivation takes effect on the next request, no restart needed
            api_key_service::set_active(&pool, created.id, false)
                .await
                .unwrap();
            assert_eq!(request(&app, Some(&bearer)).await, StatusCode::FORBIDDEN);

            api_key_service::set_active(&pool, created.id, true)
                .await
                .unwrap();
            assert_eq!(request(&app, Some(&bearer)).await, StatusCode::OK);

            // The audit trail is bumped on successful auth
            let last_used: Option<chrono::DateTime<chrono::Utc>> =
                sqlx::query_scalar("SELECT last_used_at FROM api_keys WHERE id = $1")
                    .bind(created.id)
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            assert!(last_used.is_some());
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn missing_or_unknown_key_is_unauthorized(pool: PgPool) {
            let app = protected_app(pool);

            assert_eq!(request(&app, None).await, StatusCode::UNAUTHORIZED);
            assert_eq!(
                request(&app, Some("Bearer sk_nosuchkeynosuchkey")).await,
                StatusCode::UNAUTHORIZED
            );
            assert_eq!(
                request(&app, Some("Basic dXNlcjpwYXNz")).await,
                StatusCode::UNAUTHORIZED
            );
        }
    }
}
