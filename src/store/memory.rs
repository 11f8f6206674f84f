use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{HumanStore, Result, StoreError};
use crate::model::Human;

/// In-process store with the same observable semantics as
/// [`PgHumanStore`](super::PgHumanStore): ids start at 1 and are never
/// reused, and an id that does not parse as an `i32` matches nothing.
#[derive(Default)]
pub struct MemoryHumanStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    last_id: i32,
    rows: BTreeMap<i32, Human>,
}

impl MemoryHumanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Postgres accepts surrounding whitespace and a leading sign on integer input.
fn parse_id(id: &str) -> Option<i32> {
    id.trim().parse().ok()
}

#[async_trait]
impl HumanStore for MemoryHumanStore {
    async fn list(&self) -> Result<Vec<Human>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Human> {
        let id = parse_id(id).ok_or(StoreError::NotFound)?;
        self.inner.read().await.rows.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn create(&self, first_name: &str, last_name: &str) -> Result<Human> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let human = Human {
            id: inner.last_id,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
        };
        inner.rows.insert(human.id, human.clone());
        Ok(human)
    }

    async fn update(&self, id: &str, first_name: &str, last_name: &str) -> Result<()> {
        let Some(id) = parse_id(id) else { return Ok(()) };
        if let Some(row) = self.inner.write().await.rows.get_mut(&id) {
            row.first_name = first_name.to_owned();
            row.last_name = last_name.to_owned();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = parse_id(id).ok_or(StoreError::NotFound)?;
        self.inner.write().await.rows.remove(&id).map(drop).ok_or(StoreError::NotFound)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_sequential_and_not_reused() {
        let store = MemoryHumanStore::new();
        let a = store.create("A", "A").await.unwrap();
        store.delete(&a.id.to_string()).await.unwrap();
        let b = store.create("B", "B").await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn non_numeric_id_matches_nothing() {
        let store = MemoryHumanStore::new();
        store.create("A", "A").await.unwrap();

        assert!(matches!(store.get("1; DROP TABLE humans").await, Err(StoreError::NotFound)));
        store.update("abc", "B", "B").await.unwrap();
        assert_eq!(store.get(" 1 ").await.unwrap().first_name, "A");
    }
}
