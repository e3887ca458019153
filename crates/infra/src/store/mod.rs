//! Record storage.
//!
//! One [`Store`] per record type. Keys are assigned on insert from a
//! per-collection sequence; records are otherwise opaque JSON-able values.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use ebm_core::Entity;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Anything a [`Store`] can hold.
pub trait Record: Entity + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Record for T where T: Entity + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} {id} does not exist")]
    Missing { collection: &'static str, id: i64 },

    #[error("{0} record has no id")]
    MissingId(&'static str),

    #[error("serialization error in {collection}: {message}")]
    Serialization {
        collection: &'static str,
        message: String,
    },

    #[error("storage backend error in {operation}: {message}")]
    Backend { operation: String, message: String },
}

impl StoreError {
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Async repository of one record type.
#[async_trait]
pub trait Store<E: Record>: Send + Sync {
    async fn get(&self, id: E::Id) -> Result<Option<E>, StoreError>;

    /// Inserts a new record and returns it with its assigned id. Any id
    /// already on the record is ignored.
    async fn insert(&self, record: E) -> Result<E, StoreError>;

    /// Replaces an existing record; fails with [`StoreError::Missing`] when
    /// there is nothing to replace.
    async fn update(&self, record: E) -> Result<E, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: E::Id) -> Result<bool, StoreError>;

    /// All records in key order.
    async fn list(&self) -> Result<Vec<E>, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}
