//! Postgres-backed store.
//!
//! Each record type gets its own table:
//!
//! ```sql
//! CREATE TABLE <collection> (id BIGSERIAL PRIMARY KEY, body JSONB NOT NULL)
//! ```
//!
//! The key column is authoritative; the id inside `body` is overwritten on
//! load.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use super::{Record, Store, StoreError};

#[derive(Debug, Clone)]
pub struct PostgresStore<E> {
    pool: PgPool,
    _record: PhantomData<fn() -> E>,
}

impl<E: Record> PostgresStore<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    /// Creates the backing table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (id BIGSERIAL PRIMARY KEY, body JSONB NOT NULL)",
            E::COLLECTION
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    fn decode(row: &sqlx::postgres::PgRow) -> Result<E, StoreError> {
        let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("decode", e))?;
        let Json(mut record): Json<E> = row.try_get("body").map_err(|e| StoreError::Serialization {
            collection: E::COLLECTION,
            message: e.to_string(),
        })?;
        record.set_id(E::Id::from(id));
        Ok(record)
    }
}

#[async_trait]
impl<E: Record> Store<E> for PostgresStore<E> {
    #[instrument(skip(self), fields(collection = E::COLLECTION), err)]
    async fn get(&self, id: E::Id) -> Result<Option<E>, StoreError> {
        let key: i64 = id.into();
        let sql = format!("SELECT id, body FROM {} WHERE id = $1", E::COLLECTION);
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;
        row.as_ref().map(Self::decode).transpose()
    }

    #[instrument(skip(self, record), fields(collection = E::COLLECTION), err)]
    async fn insert(&self, mut record: E) -> Result<E, StoreError> {
        let sql = format!("INSERT INTO {} (body) VALUES ($1) RETURNING id", E::COLLECTION);
        let row = sqlx::query(&sql)
            .bind(Json(&record))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;
        let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("insert", e))?;
        record.set_id(E::Id::from(id));
        Ok(record)
    }

    #[instrument(skip(self, record), fields(collection = E::COLLECTION), err)]
    async fn update(&self, record: E) -> Result<E, StoreError> {
        let id: i64 = record.id().ok_or(StoreError::MissingId(E::COLLECTION))?.into();
        let sql = format!("UPDATE {} SET body = $2 WHERE id = $1", E::COLLECTION);
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(Json(&record))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Missing {
                collection: E::COLLECTION,
                id,
            });
        }
        Ok(record)
    }

    #[instrument(skip(self), fields(collection = E::COLLECTION), err)]
    async fn delete(&self, id: E::Id) -> Result<bool, StoreError> {
        let key: i64 = id.into();
        let sql = format!("DELETE FROM {} WHERE id = $1", E::COLLECTION);
        let result = sqlx::query(&sql)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(collection = E::COLLECTION), err)]
    async fn list(&self) -> Result<Vec<E>, StoreError> {
        let sql = format!("SELECT id, body FROM {} ORDER BY id ASC", E::COLLECTION);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;
        rows.iter().map(Self::decode).collect()
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {}", E::COLLECTION);
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear", e))?;
        Ok(())
    }
}

/// Map SQLx errors into [`StoreError`].
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::backend(
            operation,
            format!(
                "database error (code {}): {}",
                db_err.code().as_deref().unwrap_or("none"),
                db_err.message()
            ),
        ),
        sqlx::Error::PoolClosed => StoreError::backend(operation, "connection pool closed"),
        other => StoreError::backend(operation, other.to_string()),
    }
}
