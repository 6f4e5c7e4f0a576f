//! Store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "accounts-book:list";

/// Directory name under the platform data directory.
const APP_DIR: &str = "accounts-book";

/// Where and under which key the account list is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the storage files.
    pub data_dir: PathBuf,
    /// Key of the slot holding the account list.
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl StoreConfig {
    /// Use a different data directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Use a different storage key.
    #[must_use]
    pub fn with_storage_key(mut self, storage_key: impl Into<String>) -> Self {
        self.storage_key = storage_key.into();
        self
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the storage key is blank.
    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(Error::Config("storage key must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_app_dir_and_key() {
        let config = StoreConfig::default();
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert!(config.data_dir.ends_with(APP_DIR));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builders_override() {
        let config = StoreConfig::default()
            .with_data_dir("/tmp/books")
            .with_storage_key("other");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/books"));
        assert_eq!(config.storage_key, "other");
    }

    #[test]
    fn blank_key_is_rejected() {
        let config = StoreConfig::default().with_storage_key("  ");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"storage_key":"custom"}"#).unwrap();
        assert_eq!(config.storage_key, "custom");
        assert_eq!(config.data_dir, StoreConfig::default().data_dir);
    }
}
