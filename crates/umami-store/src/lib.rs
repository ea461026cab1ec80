//! Umami Store
//!
//! Artifact storage for pipeline tasks. Artifacts are binary blobs (images,
//! rendered files) that tasks exchange by key, outside the execution's data
//! context; the engine only ever threads the keys around.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("artifact '{0}' not found")]
  NotFound(String),

  #[error("io error")]
  Io(#[from] std::io::Error),
}

/// Artifact storage backend.
///
/// Implementations own where the bytes live (filesystem, object storage,
/// memory). Callers are responsible for key naming; keys may contain `/`
/// separators.
#[async_trait]
pub trait Store: Send + Sync {
  /// Retrieve an artifact by key.
  async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

  /// Store an artifact, replacing any previous value under the key.
  async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), StoreError>;

  /// Delete an artifact by key.
  async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
