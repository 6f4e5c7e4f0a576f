//! In-memory storage backend.

use std::collections::HashMap;

use super::Storage;
use crate::Result;

/// Storage backed by a `HashMap`. Nothing outlives the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage with `value` already stored under `key`.
    #[must_use]
    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut items = HashMap::new();
        items.insert(key.into(), value.into());
        Self { items }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);

        storage.set_item("k", "v1").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.len(), 1);

        storage.remove_item("k").unwrap();
        storage.remove_item("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn with_item_prefills() {
        let storage = MemoryStorage::with_item("k", "v");
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
    }
}
