use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Store, StoreError};

/// In-memory artifact store, for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
    self
      .entries
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .get(key)
      .cloned()
      .ok_or_else(|| StoreError::NotFound(key.to_string()))
  }

  async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError> {
    self
      .entries
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .insert(key.to_string(), data);
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), StoreError> {
    self
      .entries
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .remove(key)
      .map(|_| ())
      .ok_or_else(|| StoreError::NotFound(key.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn put_get_delete() {
    let store = MemoryStore::new();
    store.put("k", vec![1, 2, 3]).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), vec![1, 2, 3]);
    store.delete("k").await.unwrap();
    assert!(matches!(store.get("k").await, Err(StoreError::NotFound(_))));
  }
}
