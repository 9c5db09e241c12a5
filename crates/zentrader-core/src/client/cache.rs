//! Invalidation-aware client cache
//!
//! One client instance per credential fingerprint. Settings changes take
//! effect on the next request without rebuilding the client (and
//! re-exercising decryption) on every call.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::ExchangeClient;
use crate::error::Result;
use crate::store::{CredentialRecord, CredentialStore};

struct CachedClient {
    fingerprint: CredentialRecord,
    client: Arc<ExchangeClient>,
}

/// Lazily constructed, fingerprint-invalidated client singleton
///
/// The cache entry is replaced as a single reference swap under the write
/// lock; callers never observe a half-updated entry.
pub struct ClientCache {
    store: Arc<CredentialStore>,
    slot: RwLock<Option<CachedClient>>,
}

impl ClientCache {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self {
            store,
            slot: RwLock::new(None),
        }
    }

    /// Get the client for the current credentials
    ///
    /// Recomputes the fingerprint from the store on every call; a cached
    /// client is reused only while key, secret and environment are all
    /// unchanged. Any change invalidates the cache before the next request.
    pub async fn get(&self) -> Result<Arc<ExchangeClient>> {
        let current = self.store.credentials().await?;

        {
            let slot = self.slot.read().await;
            if let Some(cached) = slot.as_ref() {
                if cached.fingerprint == current {
                    return Ok(cached.client.clone());
                }
            }
        }

        let mut slot = self.slot.write().await;
        // Another caller may have rebuilt while we waited for the lock
        if let Some(cached) = slot.as_ref() {
            if cached.fingerprint == current {
                return Ok(cached.client.clone());
            }
        }

        debug!("Credential fingerprint changed, constructing new exchange client");
        let client = Arc::new(ExchangeClient::new(&current));
        *slot = Some(CachedClient {
            fingerprint: current,
            client: client.clone(),
        });

        Ok(client)
    }
}
