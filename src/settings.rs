//! Singleton settings documents.
//!
//! One row per concern (`ipaymu`, `pakasir`, `tokopay`, `manual_qris`,
//! `email_template`), fetched lazily on each request with no cache.

use serde::de::DeserializeOwned;
use sqlx::PgPool;

use crate::error::AppResult;

pub async fn get<T: DeserializeOwned>(db: &PgPool, key: &str) -> AppResult<Option<T>> {
    let row: Option<(serde_json::Value,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(db)
            .await?;
    match row {
        Some((value,)) => match serde_json::from_value(value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) => {
                // A malformed override falls through to the env tier rather
                // than failing the request.
                tracing::warn!(key, "ignoring malformed settings document: {err}");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

pub async fn put(db: &PgPool, key: &str, value: &serde_json::Value) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO settings (key, value, updated_at) VALUES ($1, $2, NOW())
         ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()",
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;
    Ok(())
}
