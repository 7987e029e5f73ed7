//! API key management commands.
//!
//! Thin printing layer over [`crate::services::api_key_service`]. Output
//! goes to stdout for the operator; errors propagate and become nonzero
//! exit codes.

use uuid::Uuid;

use crate::{db::DbPool, error::AppError, services::api_key_service};

/// `create`: generate and store a new key, printing the plaintext once.
pub async fn create(pool: &DbPool, name: Option<String>, length: usize) -> Result<(), AppError> {
    let created = api_key_service::create_key(pool, name, length).await?;

    println!("Created API key");
    println!("id: {}", created.id);
    println!("name: {}", created.name);
    println!("key: {}", created.plaintext);
    println!("Store the key now; it cannot be shown again.");

    Ok(())
}

/// `init-key`: bootstrap the first key, refusing when one already exists.
pub async fn init_key(pool: &DbPool) -> Result<(), AppError> {
    match api_key_service::init_key(pool, 48).await? {
        Some(created) => {
            println!("Initial API key created");
            println!("id: {}", created.id);
            println!("key: {}", created.plaintext);
        }
        None => {
            println!("An API key already exists. Use 'list' to view ids or 'create' to add more.");
        }
    }

    Ok(())
}

/// `list`: print key summaries, as a table-ish text dump or JSON.
pub async fn list(pool: &DbPool, json: bool) -> Result<(), AppError> {
    let keys = api_key_service::list_keys(pool).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&keys)
                .map_err(|e| AppError::InvalidRequest(e.to_string()))?
        );
        return Ok(());
    }

    if keys.is_empty() {
        println!("No API keys. Create one with 'init-key' or 'create'.");
        return Ok(());
    }

    for key in keys {
        let last_used = key
            .last_used_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "- id={} name={} active={} created_at={} last_used_at={}",
            key.id,
            key.name,
            key.is_active,
            key.created_at.to_rfc3339(),
            last_used
        );
    }

    Ok(())
}

/// `activate`: re-enable a key.
pub async fn activate(pool: &DbPool, id: Uuid) -> Result<(), AppError> {
    api_key_service::set_active(pool, id, true).await?;
    println!("Activated {id}");
    Ok(())
}

/// `deactivate`: revoke a key without deleting its record.
pub async fn deactivate(pool: &DbPool, id: Uuid) -> Result<(), AppError> {
    api_key_service::set_active(pool, id, false).await?;
    println!("Deactivated {id}");
    Ok(())
}

/// `delete`: remove a key permanently.
pub async fn delete(pool: &DbPool, id: Uuid) -> Result<(), AppError> {
    api_key_service::delete_key(pool, id).await?;
    println!("Deleted {id}");
    Ok(())
}
