//! # zentrader-core
//!
//! Credential vault and signed request layer for the ZenTrader desktop
//! client:
//! - AES-256-CBC encryption of API credentials under a keychain-persisted key
//! - Transparent migration handling for legacy plaintext values
//! - Canonical HMAC-SHA256 request signing for the Bybit v5 REST API
//! - A fingerprint-invalidated authenticated client cache
//!
//! The UI and IPC layers talk to this crate through two entry points:
//! [`CredentialStore`] (`get`/`set` for settings) and [`ClientCache::get`]
//! (the authenticated client for request handlers).

pub mod client;
pub mod crypto;
pub mod error;
pub mod signer;
pub mod store;
pub mod vault;

pub use client::{ClientCache, ExchangeClient, OrderRequest};
pub use crypto::{SecretCodec, VaultKey};
pub use error::{CoreError, Result};
pub use store::{keys, CredentialRecord, CredentialStore, Environment, JsonFileStore, KeyValueStore};
pub use vault::{KeyStatus, KeyVault, KeyringStore, SecretStore};
