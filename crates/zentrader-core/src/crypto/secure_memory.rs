//! Secure memory handling with automatic zeroization

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Vault key length in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Symmetric key used to encrypt stored secrets - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    key: [u8; KEY_LEN],
}

impl VaultKey {
    /// Create a vault key from raw bytes
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Generate a fresh random 256-bit key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Create from a slice (must be exactly 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != KEY_LEN {
            return None;
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(slice);
        Some(Self { key })
    }

    /// Parse the hex-encoded at-rest form used by the OS secret store
    pub fn from_hex(encoded: &str) -> Option<Self> {
        let bytes = hex::decode(encoded).ok()?;
        Self::from_slice(&bytes)
    }

    /// Hex-encode for persistence in the OS secret store
    pub fn to_hex(&self) -> String {
        hex::encode(self.key)
    }
}

impl Clone for VaultKey {
    fn clone(&self) -> Self {
        Self { key: self.key }
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice() {
        let bytes = [42u8; 32];
        let key = VaultKey::from_slice(&bytes).unwrap();
        assert_eq!(key.as_bytes(), &bytes);
    }

    #[test]
    fn test_from_invalid_slice() {
        let bytes = [42u8; 16];
        assert!(VaultKey::from_slice(&bytes).is_none());
    }

    #[test]
    fn test_hex_roundtrip() {
        let key = VaultKey::generate();
        let encoded = key.to_hex();
        assert_eq!(encoded.len(), 64);

        let parsed = VaultKey::from_hex(&encoded).unwrap();
        assert_eq!(parsed.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_from_invalid_hex() {
        assert!(VaultKey::from_hex("not hex").is_none());
        assert!(VaultKey::from_hex("abcd").is_none());
    }

    #[test]
    fn test_generate_is_random() {
        let a = VaultKey::generate();
        let b = VaultKey::generate();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_debug_redacted() {
        let key = VaultKey::new([0u8; 32]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("0"));
    }
}
