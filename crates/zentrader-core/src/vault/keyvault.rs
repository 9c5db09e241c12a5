//! Vault key lifecycle
//!
//! One 256-bit key per installation, created on first use and persisted in
//! the OS secret store. The process keeps a single cached copy; if the store
//! is unreachable the vault degrades to an ephemeral key that lives only for
//! this run.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{KeyringStore, SecretStore};
use crate::crypto::VaultKey;
use crate::error::Result;

/// Account name the vault key is stored under
const ACCOUNT_NAME: &str = "encryption_key";

/// Where the active vault key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Key is persisted in the OS secret store
    Persistent,
    /// OS store was unavailable; key exists only for this process run and
    /// credentials encrypted under it will not survive a restart
    Ephemeral,
}

/// Obtains and caches the device-local encryption key
pub struct KeyVault {
    store: Arc<dyn SecretStore>,
    cached: OnceCell<(VaultKey, KeyStatus)>,
}

impl KeyVault {
    /// Create a vault backed by an injected secret store
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            cached: OnceCell::new(),
        }
    }

    /// Create a vault backed by the system keychain
    pub fn system() -> Self {
        Self::new(Arc::new(KeyringStore::new()))
    }

    /// Get the vault key, creating and persisting one on first use
    ///
    /// Idempotent and safe to call concurrently: the initializer runs once,
    /// so racing callers observe the same key and at most one persistence
    /// write ever happens. If the OS store is unreachable this falls back to
    /// an ephemeral key instead of failing the caller.
    pub async fn get_or_create_key(&self) -> VaultKey {
        let (key, _) = self
            .cached
            .get_or_init(|| async {
                match self.load_or_create().await {
                    Ok(key) => (key, KeyStatus::Persistent),
                    Err(e) => {
                        warn!("Vault key unavailable, using ephemeral key: {}", e);
                        (VaultKey::generate(), KeyStatus::Ephemeral)
                    }
                }
            })
            .await;
        key.clone()
    }

    /// Eager warm-up, intended to run once at process startup
    ///
    /// Populates the cache so later callers never block on the OS store.
    /// A degraded (ephemeral) outcome is logged, never propagated.
    pub async fn initialize(&self) {
        let _ = self.get_or_create_key().await;
        match self.status() {
            Some(KeyStatus::Persistent) => debug!("Vault key initialized"),
            Some(KeyStatus::Ephemeral) => {
                warn!("Vault key is ephemeral; saved credentials will not survive a restart")
            }
            None => {}
        }
    }

    /// Status of the cached key, `None` before first resolution
    pub fn status(&self) -> Option<KeyStatus> {
        self.cached.get().map(|(_, status)| *status)
    }

    /// Whether the vault is running on a non-persistent key
    pub fn is_ephemeral(&self) -> bool {
        self.status() == Some(KeyStatus::Ephemeral)
    }

    async fn load_or_create(&self) -> Result<VaultKey> {
        if let Some(stored) = self.store.get(ACCOUNT_NAME).await? {
            return VaultKey::from_hex(&stored).ok_or_else(|| {
                crate::error::CoreError::KeychainError(
                    "Stored vault key is not a valid 256-bit hex value".to_string(),
                )
            });
        }

        let key = VaultKey::generate();
        self.store.set(ACCOUNT_NAME, &key.to_hex()).await?;
        debug!("Generated and persisted new vault key");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::MemorySecretStore;

    #[tokio::test]
    async fn test_creates_and_persists_key_on_first_use() {
        let store = Arc::new(MemorySecretStore::new());
        let vault = KeyVault::new(store.clone());

        let key = vault.get_or_create_key().await;

        assert_eq!(store.write_count(), 1);
        assert_eq!(vault.status(), Some(KeyStatus::Persistent));

        let stored = store.get("encryption_key").await.unwrap().unwrap();
        assert_eq!(stored, key.to_hex());
    }

    #[tokio::test]
    async fn test_reuses_existing_key() {
        let store = Arc::new(MemorySecretStore::new());

        let first = KeyVault::new(store.clone()).get_or_create_key().await;
        let second = KeyVault::new(store.clone()).get_or_create_key().await;

        assert_eq!(first.as_bytes(), second.as_bytes());
        // Only the first vault wrote
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_cached_for_process_lifetime() {
        let store = Arc::new(MemorySecretStore::new());
        let vault = KeyVault::new(store.clone());

        let first = vault.get_or_create_key().await;

        // Store outage after the cache is warm must not matter
        store.set_unavailable(true);
        let second = vault.get_or_create_key().await;

        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(vault.status(), Some(KeyStatus::Persistent));
    }

    #[tokio::test]
    async fn test_ephemeral_fallback_when_store_unavailable() {
        let store = Arc::new(MemorySecretStore::new());
        store.set_unavailable(true);

        let vault = KeyVault::new(store.clone());
        let key = vault.get_or_create_key().await;

        assert!(vault.is_ephemeral());
        assert_eq!(key.as_bytes().len(), 32);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_stored_key_degrades_to_ephemeral() {
        let store = Arc::new(MemorySecretStore::new());
        store.set("encryption_key", "not-a-hex-key").await.unwrap();

        let vault = KeyVault::new(store.clone());
        let _ = vault.get_or_create_key().await;

        assert!(vault.is_ephemeral());
        // The corrupt value was not overwritten
        assert_eq!(
            store.get("encryption_key").await.unwrap(),
            Some("not-a-hex-key".to_string())
        );
    }

    #[tokio::test]
    async fn test_concurrent_first_use_persists_exactly_one_key() {
        let store = Arc::new(MemorySecretStore::new());
        let vault = Arc::new(KeyVault::new(store.clone()));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let vault = vault.clone();
            handles.push(tokio::spawn(
                async move { vault.get_or_create_key().await },
            ));
        }

        let mut keys = Vec::new();
        for handle in handles {
            keys.push(handle.await.unwrap());
        }

        assert_eq!(store.write_count(), 1);
        for key in &keys {
            assert_eq!(key.as_bytes(), keys[0].as_bytes());
        }
    }

    #[tokio::test]
    async fn test_initialize_is_swallowed_on_failure() {
        let store = Arc::new(MemorySecretStore::new());
        store.set_unavailable(true);

        let vault = KeyVault::new(store);
        // Must not panic or propagate
        vault.initialize().await;

        assert!(vault.is_ephemeral());
    }
}
