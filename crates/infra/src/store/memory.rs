use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{Record, Store, StoreError};

#[derive(Debug)]
struct Table<E> {
    next_id: i64,
    rows: BTreeMap<i64, E>,
}

/// In-memory store for tests/dev.
#[derive(Debug)]
pub struct InMemoryStore<E> {
    inner: RwLock<Table<E>>,
}

impl<E> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Table {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }
}

impl<E> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(operation: &str) -> StoreError {
    StoreError::backend(operation, "lock poisoned")
}

#[async_trait]
impl<E: Record> Store<E> for InMemoryStore<E> {
    async fn get(&self, id: E::Id) -> Result<Option<E>, StoreError> {
        let key: i64 = id.into();
        let table = self.inner.read().map_err(|_| poisoned("get"))?;
        Ok(table.rows.get(&key).cloned())
    }

    async fn insert(&self, mut record: E) -> Result<E, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned("insert"))?;
        let id = table.next_id;
        table.next_id += 1;
        record.set_id(E::Id::from(id));
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, record: E) -> Result<E, StoreError> {
        let id: i64 = record.id().ok_or(StoreError::MissingId(E::COLLECTION))?.into();
        let mut table = self.inner.write().map_err(|_| poisoned("update"))?;
        match table.rows.get_mut(&id) {
            Some(row) => {
                *row = record.clone();
                Ok(record)
            }
            None => Err(StoreError::Missing {
                collection: E::COLLECTION,
                id,
            }),
        }
    }

    async fn delete(&self, id: E::Id) -> Result<bool, StoreError> {
        let key: i64 = id.into();
        let mut table = self.inner.write().map_err(|_| poisoned("delete"))?;
        Ok(table.rows.remove(&key).is_some())
    }

    async fn list(&self) -> Result<Vec<E>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned("list"))?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned("clear"))?;
        table.rows.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebm_people::State;

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryStore::<State>::new();
        let a = store.insert(State::new("GO", "Goiás")).await.unwrap();
        let b = store.insert(State::new("SP", "São Paulo")).await.unwrap();
        assert_eq!(a.id.unwrap().get(), 1);
        assert_eq!(b.id.unwrap().get(), 2);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_requires_existing_row() {
        let store = InMemoryStore::<State>::new();
        let mut s = store.insert(State::new("GO", "Goiás")).await.unwrap();
        s.name = "Goias".into();
        store.update(s.clone()).await.unwrap();
        assert_eq!(store.get(s.id.unwrap()).await.unwrap().unwrap().name, "Goias");

        assert!(store.delete(s.id.unwrap()).await.unwrap());
        assert!(!store.delete(s.id.unwrap()).await.unwrap());
        assert!(matches!(store.update(s).await, Err(StoreError::Missing { .. })));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_clear() {
        let store = InMemoryStore::<State>::new();
        store.insert(State::new("GO", "Goiás")).await.unwrap();
        store.clear().await.unwrap();
        let s = store.insert(State::new("MT", "Mato Grosso")).await.unwrap();
        assert_eq!(s.id.unwrap().get(), 2);
        assert_eq!(store.list().await.unwrap(), vec![s]);
    }
}
