//! Device-local vault key management
//!
//! The vault key encrypts everything the credential store persists. It lives
//! in the OS-native secret store and is cached in memory for the process
//! lifetime.

mod keyvault;
mod secret_store;

pub use keyvault::{KeyStatus, KeyVault};
pub use secret_store::{KeyringStore, MemorySecretStore, SecretStore};
