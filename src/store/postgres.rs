use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{BoundedAppend, KeyTtl, KeyValueStore, StoreError};

// Expiry is evaluated against the database clock so that every instance
// sharing the table agrees on which keys are live.
const LIVE: &str = "(expires_at IS NULL OR expires_at > now())";

/// PostgreSQL implementation of KeyValueStore
///
/// All keys live in one `kv_entries` table. Plain values use the `value`
/// column, lists use the `items` array. Each trait method is a single SQL
/// statement, so per-key atomicity comes from Postgres row locking.
pub struct PostgresKeyValueStore {
    pool: PgPool,
}

impl PostgresKeyValueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the backing table if it does not exist yet
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT,
                items TEXT[],
                expires_at TIMESTAMPTZ
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS kv_entries_expires_at ON kv_entries (expires_at)")
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        info!("Key-value table ready");
        Ok(())
    }

    /// Removes rows whose expiry has passed; reads already ignore them
    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected())
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    warn!(error = %e, "Key-value query failed");
    StoreError::Backend(e.to_string())
}

fn seconds(ttl: Duration) -> f64 {
    ttl.as_secs_f64()
}

#[async_trait]
impl KeyValueStore for PostgresKeyValueStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT value, items IS NOT NULL AS is_list FROM kv_entries WHERE key = $1 AND {LIVE}"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        if row.try_get::<bool, _>("is_list").map_err(backend)? {
            return Err(StoreError::WrongType(key.to_string()));
        }
        row.try_get::<Option<String>, _>("value").map_err(backend)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO kv_entries (key, value, items, expires_at)
             VALUES ($1, $2, NULL, now() + $3::DOUBLE PRECISION * interval '1 second')
             ON CONFLICT (key) DO UPDATE
             SET value = EXCLUDED.value, items = NULL, expires_at = EXCLUDED.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(ttl.map(seconds))
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn replace(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE kv_entries SET value = $2
             WHERE key = $1 AND {LIVE}
             RETURNING items IS NOT NULL AS is_list"
        ))
        .bind(key)
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Ok(false),
            Some(row) if row.try_get::<bool, _>("is_list").map_err(backend)? => {
                Err(StoreError::WrongType(key.to_string()))
            }
            Some(_) => Ok(true),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        let rows = sqlx::query(&format!(
            "DELETE FROM kv_entries WHERE key = ANY($1) RETURNING {LIVE} AS was_live"
        ))
        .bind(keys)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut removed = 0;
        for row in rows {
            if row.try_get::<bool, _>("was_live").map_err(backend)? {
                removed += 1;
            }
        }
        debug!(requested = keys.len(), removed, "Deleted keys from database");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT EXTRACT(EPOCH FROM (expires_at - now()))::DOUBLE PRECISION AS remaining
             FROM kv_entries WHERE key = $1 AND {LIVE}"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(KeyTtl::Missing);
        };
        Ok(match row.try_get::<Option<f64>, _>("remaining").map_err(backend)? {
            None => KeyTtl::Persistent,
            Some(secs) => KeyTtl::Expires(Duration::from_secs_f64(secs.max(0.0))),
        })
    }

    #[instrument(skip(self))]
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!(
            "UPDATE kv_entries SET expires_at = now() + $2::DOUBLE PRECISION * interval '1 second'
             WHERE key = $1 AND {LIVE}"
        ))
        .bind(key)
        .bind(seconds(ttl))
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn list_create(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        // Room creation is the natural moment to drop rows of long-dead rooms
        let purged = self.purge_expired().await?;
        if purged > 0 {
            debug!(purged, "Purged expired keys");
        }

        sqlx::query(
            "INSERT INTO kv_entries (key, value, items, expires_at)
             VALUES ($1, NULL, '{}'::TEXT[], now() + $2::DOUBLE PRECISION * interval '1 second')
             ON CONFLICT (key) DO UPDATE
             SET value = NULL, items = '{}'::TEXT[], expires_at = EXCLUDED.expires_at",
        )
        .bind(key)
        .bind(seconds(ttl))
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn list_append(&self, key: &str, value: &str) -> Result<Option<usize>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE kv_entries SET items = array_append(items, $2)
             WHERE key = $1 AND items IS NOT NULL AND {LIVE}
             RETURNING cardinality(items) AS len"
        ))
        .bind(key)
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            Some(row) => Ok(Some(row.try_get::<i32, _>("len").map_err(backend)? as usize)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, value))]
    async fn list_append_bounded(
        &self,
        key: &str,
        value: &str,
        max_len: usize,
    ) -> Result<BoundedAppend, StoreError> {
        // The UPDATE re-checks its WHERE clause after waiting on a concurrent
        // writer's row lock, so the capacity check and the append are one step.
        // The outer SELECT only classifies a rejection as Full or Missing.
        let row = sqlx::query(&format!(
            "WITH appended AS (
                UPDATE kv_entries SET items = array_append(items, $2)
                WHERE key = $1 AND items IS NOT NULL AND {LIVE}
                  AND cardinality(items) < $3::INT
                RETURNING cardinality(items) AS len
             )
             SELECT (SELECT len FROM appended) AS appended_len,
                    EXISTS (
                        SELECT 1 FROM kv_entries
                        WHERE key = $1 AND items IS NOT NULL AND {LIVE}
                    ) AS present"
        ))
        .bind(key)
        .bind(value)
        .bind(max_len as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        let appended_len = row.try_get::<Option<i32>, _>("appended_len").map_err(backend)?;
        let present = row.try_get::<bool, _>("present").map_err(backend)?;

        Ok(match (appended_len, present) {
            (Some(len), _) => BoundedAppend::Appended(len as usize),
            (None, true) => BoundedAppend::Full,
            (None, false) => BoundedAppend::Missing,
        })
    }

    #[instrument(skip(self))]
    async fn list_range(&self, key: &str) -> Result<Option<Vec<String>>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT items FROM kv_entries WHERE key = $1 AND {LIVE}"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        match row.try_get::<Option<Vec<String>>, _>("items").map_err(backend)? {
            Some(items) => Ok(Some(items)),
            None => Err(StoreError::WrongType(key.to_string())),
        }
    }
}
