//! Persistent settings and credential storage
//!
//! A plain key-value store holds all app settings; the credential layer on
//! top routes the sensitive keys through the vault-backed codec.

mod backend;
mod credentials;

pub use backend::{JsonFileStore, KeyValueStore};
pub use credentials::{keys, CredentialRecord, CredentialStore, Environment};
