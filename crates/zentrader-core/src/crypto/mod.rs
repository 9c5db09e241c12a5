//! Cryptographic primitives for secure credential storage
//!
//! This module provides:
//! - AES-256-CBC secret encryption in the `ivHex:cipherHex` wire format
//! - Secure memory handling with zeroize

mod codec;
mod secure_memory;

pub use codec::{EncryptedSecret, SecretCodec, IV_LEN};
pub use secure_memory::{VaultKey, KEY_LEN};
