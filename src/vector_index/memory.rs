//! In-memory index storage.
//!
//! Useful for testing and for running without a data directory.

use super::{IndexStorage, VectorIndex};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory index storage.
pub struct MemoryIndexStorage {
    index: RwLock<Option<VectorIndex>>,
}

impl MemoryIndexStorage {
    /// Create an empty in-memory storage.
    pub fn new() -> Self {
        Self {
            index: RwLock::new(None),
        }
    }
}

impl Default for MemoryIndexStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexStorage for MemoryIndexStorage {
    async fn replace(&self, index: &VectorIndex) -> Result<()> {
        let mut slot = self
            .index
            .write()
            .map_err(|e| SvarError::VectorStore(format!("Failed to acquire lock: {}", e)))?;
        *slot = Some(index.clone());
        Ok(())
    }

    async fn load(&self) -> Result<VectorIndex> {
        let slot = self
            .index
            .read()
            .map_err(|e| SvarError::VectorStore(format!("Failed to acquire lock: {}", e)))?;
        slot.clone()
            .ok_or_else(|| SvarError::IndexNotFound(self.location()))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::tests::sample_index;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryIndexStorage::new();
        assert!(matches!(storage.load().await, Err(SvarError::IndexNotFound(_))));

        let index = sample_index();
        storage.replace(&index).await.unwrap();

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded.metadata().id, index.metadata().id);
        assert_eq!(loaded.len(), 3);
    }
}
