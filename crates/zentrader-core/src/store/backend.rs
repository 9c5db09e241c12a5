//! Key-value storage backends
//!
//! `JsonFileStore` persists settings as a single JSON object in the user's
//! data directory, written atomically via a temp file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use directories::ProjectDirs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Trait for persistent key-value backends
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value by key, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value under a key
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// JSON file storage backend (config.json in the app data directory)
pub struct JsonFileStore {
    store_file: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Create a store at the default per-user location
    pub fn new() -> Result<Self> {
        let dir = Self::default_dir()?;
        std::fs::create_dir_all(&dir)?;
        Self::with_path(dir.join("config.json"))
    }

    /// Create a store at an explicit file path (used in tests)
    pub fn with_path(store_file: PathBuf) -> Result<Self> {
        let entries = Self::load_from_file(&store_file)?;
        debug!("Settings store loaded from {:?}", store_file);

        Ok(Self {
            store_file,
            entries: RwLock::new(entries),
        })
    }

    fn default_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "zentrader", "ZenTrader")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                CoreError::StorageError("Could not determine data directory".to_string())
            })
    }

    fn load_from_file(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            debug!("No settings file found, starting empty");
            return Ok(BTreeMap::new());
        }

        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the whole map atomically; the caller holds the write lock
    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(entries)?;

        let temp_path = self.store_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.store_file).await?;

        debug!("Saved settings to {:?}", self.store_file);
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }
}
