//! Credential storage with transparent encryption
//!
//! `apiKey` and `apiSecret` are encrypted at rest under the vault key; every
//! other key passes through unchanged. Reads auto-detect values written by
//! older versions before encryption existed (no `:` separator) and return
//! them as-is.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::crypto::SecretCodec;
use crate::error::Result;
use crate::store::KeyValueStore;
use crate::vault::KeyVault;

/// Well-known setting names
pub mod keys {
    pub const API_KEY: &str = "apiKey";
    pub const API_SECRET: &str = "apiSecret";
    pub const IS_DEMO: &str = "isDemo";
}

/// Keys whose values are encrypted at rest
const SENSITIVE_KEYS: &[&str] = &[keys::API_KEY, keys::API_SECRET];

/// Exchange environment the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Demo,
    Mainnet,
}

impl Environment {
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            Environment::Demo => "https://api-demo.bybit.com",
            Environment::Mainnet => "https://api.bybit.com",
        }
    }
}

/// Decrypted credential set, read on every client construction
///
/// Field-wise equality doubles as the client cache fingerprint: two records
/// are equal iff key, secret and environment are all identical.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub api_key: String,
    pub api_secret: String,
    pub environment: Environment,
}

impl CredentialRecord {
    /// Whether both halves of the key pair are present
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("environment", &self.environment)
            .finish()
    }
}

/// Typed get/set over the settings store, encrypting designated keys
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    vault: Arc<KeyVault>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, vault: Arc<KeyVault>) -> Self {
        Self { backend, vault }
    }

    fn is_sensitive(key: &str) -> bool {
        SENSITIVE_KEYS.contains(&key)
    }

    /// Get a setting, decrypting sensitive values transparently
    ///
    /// A sensitive value that fails to decrypt degrades to an empty string:
    /// a corrupted credential means "not configured", never a crash.
    pub async fn get(&self, key: &str) -> Result<String> {
        let raw = self.backend.get(key).await?.unwrap_or_default();

        if !Self::is_sensitive(key) || raw.is_empty() {
            return Ok(raw);
        }

        if !raw.contains(':') {
            warn!("{} is stored as plaintext; re-save in Settings to encrypt it", key);
            return Ok(raw);
        }

        let codec = SecretCodec::new(self.vault.get_or_create_key().await);
        match codec.decrypt(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Failed to decrypt {}: {}", key, e);
                Ok(String::new())
            }
        }
    }

    /// Set a setting, encrypting sensitive values before persisting
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        if Self::is_sensitive(key) && !value.is_empty() {
            let codec = SecretCodec::new(self.vault.get_or_create_key().await);
            let encrypted = codec.encrypt(value)?;
            return self.backend.set(key, &encrypted).await;
        }

        self.backend.set(key, value).await
    }

    /// Read the current decrypted credential set
    ///
    /// Only the exact string `"true"` selects the demo environment; anything
    /// else (including an unset value) means live trading.
    pub async fn credentials(&self) -> Result<CredentialRecord> {
        let api_key = self.get(keys::API_KEY).await?;
        let api_secret = self.get(keys::API_SECRET).await?;
        let environment = if self.get(keys::IS_DEMO).await? == "true" {
            Environment::Demo
        } else {
            Environment::Mainnet
        };

        Ok(CredentialRecord {
            api_key,
            api_secret,
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use crate::vault::MemorySecretStore;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> (CredentialStore, Arc<JsonFileStore>) {
        let backend =
            Arc::new(JsonFileStore::with_path(temp_dir.path().join("config.json")).unwrap());
        let vault = Arc::new(KeyVault::new(Arc::new(MemorySecretStore::new())));
        (CredentialStore::new(backend.clone(), vault), backend)
    }

    #[tokio::test]
    async fn test_sensitive_value_encrypted_at_rest() {
        let temp_dir = TempDir::new().unwrap();
        let (store, backend) = test_store(&temp_dir);

        store.set("apiSecret", "super-secret").await.unwrap();

        let raw = backend.get("apiSecret").await.unwrap().unwrap();
        assert_ne!(raw, "super-secret");
        assert!(raw.contains(':'));

        assert_eq!(store.get("apiSecret").await.unwrap(), "super-secret");
    }

    #[tokio::test]
    async fn test_non_sensitive_value_passes_through() {
        let temp_dir = TempDir::new().unwrap();
        let (store, backend) = test_store(&temp_dir);

        store.set("intervalTime", "5000").await.unwrap();

        let raw = backend.get("intervalTime").await.unwrap().unwrap();
        assert_eq!(raw, "5000");
        assert_eq!(store.get("intervalTime").await.unwrap(), "5000");
    }

    #[tokio::test]
    async fn test_legacy_plaintext_read() {
        let temp_dir = TempDir::new().unwrap();
        let (store, backend) = test_store(&temp_dir);

        // Value written by a version that predates encryption
        backend.set("apiKey", "legacy-plain-key").await.unwrap();

        assert_eq!(store.get("apiKey").await.unwrap(), "legacy-plain-key");
    }

    #[tokio::test]
    async fn test_corrupted_ciphertext_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let (store, backend) = test_store(&temp_dir);

        backend
            .set("apiSecret", "0f1e2d3c4b5a69788796a5b4c3d2e1f0:deadbeefdeadbeefdeadbeefdeadbeef")
            .await
            .unwrap();

        assert_eq!(store.get("apiSecret").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_missing_key_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _backend) = test_store(&temp_dir);

        assert_eq!(store.get("apiKey").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_credentials_record() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _backend) = test_store(&temp_dir);

        store.set("apiKey", "K").await.unwrap();
        store.set("apiSecret", "S").await.unwrap();
        store.set("isDemo", "true").await.unwrap();

        let record = store.credentials().await.unwrap();
        assert_eq!(record.api_key, "K");
        assert_eq!(record.api_secret, "S");
        assert_eq!(record.environment, Environment::Demo);
        assert!(record.is_configured());
    }

    #[tokio::test]
    async fn test_environment_defaults_to_mainnet() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _backend) = test_store(&temp_dir);

        let record = store.credentials().await.unwrap();
        assert_eq!(record.environment, Environment::Mainnet);
        assert!(!record.is_configured());
    }

    #[tokio::test]
    async fn test_record_debug_redacts_secret() {
        let record = CredentialRecord {
            api_key: "K".to_string(),
            api_secret: "S3CRET".to_string(),
            environment: Environment::Demo,
        };

        let debug = format!("{:?}", record);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("S3CRET"));
    }
}
