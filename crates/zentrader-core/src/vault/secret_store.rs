//! OS secret store backends
//!
//! Production builds use the system keychain:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use keyring::Entry;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Service name used for keychain entries
const SERVICE_NAME: &str = "ZenTrader";

/// Trait for OS secret store backends
///
/// Values are the hex-encoded at-rest form of the vault key. Injected into
/// [`KeyVault`](super::KeyVault) so tests can substitute a fake store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Retrieve a secret by account name, `None` if absent
    async fn get(&self, account: &str) -> Result<Option<String>>;

    /// Store a secret under an account name
    async fn set(&self, account: &str, value: &str) -> Result<()>;
}

/// System keychain backend
pub struct KeyringStore {
    service: &'static str,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME,
        }
    }

    fn entry(&self, account: &str) -> Result<Entry> {
        Entry::new(self.service, account).map_err(|e| CoreError::KeychainError(e.to_string()))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn get(&self, account: &str) -> Result<Option<String>> {
        let entry = self.entry(account)?;

        match entry.get_password() {
            Ok(value) => {
                debug!("Retrieved secret from keychain: {}", account);
                Ok(Some(value))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("Secret not found in keychain: {}", account);
                Ok(None)
            }
            Err(e) => Err(CoreError::KeychainError(e.to_string())),
        }
    }

    async fn set(&self, account: &str, value: &str) -> Result<()> {
        let entry = self.entry(account)?;

        entry
            .set_password(value)
            .map_err(|e| CoreError::KeychainError(e.to_string()))?;

        debug!("Stored secret in keychain: {}", account);
        Ok(())
    }
}

/// In-memory secret store for tests and headless environments
///
/// Nothing survives the process; `set_unavailable` simulates an unreachable
/// keychain and `write_count` exposes how many persistence writes occurred.
#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, String>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, as if the OS store were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `set` calls that reached the store
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoreError::VaultUnavailable(
                "memory secret store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, account: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.entries.lock().unwrap().get(account).cloned())
    }

    async fn set(&self, account: &str, value: &str) -> Result<()> {
        self.check_available()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(account.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySecretStore::new();

        assert!(store.get("encryption_key").await.unwrap().is_none());

        store.set("encryption_key", "aabbcc").await.unwrap();
        assert_eq!(
            store.get("encryption_key").await.unwrap(),
            Some("aabbcc".to_string())
        );
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_unavailable() {
        let store = MemorySecretStore::new();
        store.set_unavailable(true);

        assert!(matches!(
            store.get("encryption_key").await,
            Err(CoreError::VaultUnavailable(_))
        ));
        assert!(store.set("encryption_key", "x").await.is_err());
        assert_eq!(store.write_count(), 0);
    }
}
