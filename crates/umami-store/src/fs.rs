use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::{Store, StoreError};

/// Filesystem-based artifact store.
///
/// Each artifact lives at `{base_path}/{key}`; parent directories are created
/// on write.
pub struct FsStore {
  base_path: PathBuf,
}

impl FsStore {
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  fn key_to_path(&self, key: &str) -> PathBuf {
    self.base_path.join(key)
  }
}

fn map_not_found(key: &str, e: std::io::Error) -> StoreError {
  if e.kind() == std::io::ErrorKind::NotFound {
    StoreError::NotFound(key.to_string())
  } else {
    StoreError::Io(e)
  }
}

#[async_trait]
impl Store for FsStore {
  async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
    fs::read(self.key_to_path(key))
      .await
      .map_err(|e| map_not_found(key, e))
  }

  async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError> {
    let path = self.key_to_path(key);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await?;
    }
    fs::write(path, data).await?;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), StoreError> {
    fs::remove_file(self.key_to_path(key))
      .await
      .map_err(|e| map_not_found(key, e))
  }
}
