//! AES-256-CBC secret encryption
//!
//! Encryption format: `{iv_hex}:{ciphertext_hex}`
//! - IV: 16 bytes, freshly generated per encryption call
//! - Ciphertext: AES-256-CBC with PKCS#7 padding
//!
//! Stored values that do not contain the `:` separator are legacy plaintext
//! written by versions that predate encryption; `decrypt` returns them
//! unchanged so old installs keep working after an upgrade.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use super::VaultKey;
use crate::error::{CoreError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Initialization vector length in bytes
pub const IV_LEN: usize = 16;

/// Encrypted secret with its IV
#[derive(Debug, Clone)]
pub struct EncryptedSecret {
    /// Initialization vector (16 bytes for CBC)
    pub iv: [u8; IV_LEN],
    /// Encrypted ciphertext
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Display for EncryptedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", hex::encode(self.iv), hex::encode(&self.ciphertext))
    }
}

impl EncryptedSecret {
    /// Parse from the format: `{iv_hex}:{ciphertext_hex}`
    ///
    /// Splits on the first `:` only, matching the stored-data format.
    pub fn from_string(s: &str) -> Result<Self> {
        let (iv_part, cipher_part) = s.split_once(':').ok_or_else(|| {
            CoreError::DecryptionError("Invalid encrypted value: expected iv:ciphertext".to_string())
        })?;

        let iv_bytes = hex::decode(iv_part)
            .map_err(|e| CoreError::DecryptionError(format!("Invalid IV hex: {}", e)))?;
        let ciphertext = hex::decode(cipher_part)
            .map_err(|e| CoreError::DecryptionError(format!("Invalid ciphertext hex: {}", e)))?;

        if iv_bytes.len() != IV_LEN {
            return Err(CoreError::DecryptionError(format!(
                "Invalid IV length: expected {}, got {}",
                IV_LEN,
                iv_bytes.len()
            )));
        }
        if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
            return Err(CoreError::DecryptionError(format!(
                "Truncated ciphertext: {} bytes is not a whole number of blocks",
                ciphertext.len()
            )));
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&iv_bytes);

        Ok(Self { iv, ciphertext })
    }
}

/// Encrypts and decrypts secret strings under a resolved vault key
pub struct SecretCodec {
    key: VaultKey,
}

impl SecretCodec {
    /// Create a codec bound to a vault key
    pub fn new(key: VaultKey) -> Self {
        Self { key }
    }

    /// Encrypt a plaintext string into the `iv:ciphertext` format
    ///
    /// A new random IV is generated on every call, so repeated encryptions of
    /// the same plaintext produce different output.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        // The all-zero IV is reserved as invalid
        while iv == [0u8; IV_LEN] {
            rand::thread_rng().fill_bytes(&mut iv);
        }

        let ciphertext = Aes256CbcEnc::new(self.key.as_bytes().into(), (&iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        Ok(EncryptedSecret { iv, ciphertext }.to_string())
    }

    /// Decrypt a stored value
    ///
    /// Values without a `:` separator are legacy plaintext and are returned
    /// unchanged. Anything else must parse and decrypt cleanly or this
    /// returns a `DecryptionError`.
    pub fn decrypt(&self, value: &str) -> Result<String> {
        if !value.contains(':') {
            return Ok(value.to_string());
        }

        let encrypted = EncryptedSecret::from_string(value)?;

        let plaintext = Aes256CbcDec::new(self.key.as_bytes().into(), (&encrypted.iv).into())
            .decrypt_padded_vec_mut::<Pkcs7>(&encrypted.ciphertext)
            .map_err(|_| {
                CoreError::DecryptionError("Bad padding: wrong key or corrupted ciphertext".to_string())
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| CoreError::DecryptionError(format!("Invalid UTF-8: {}", e)))
    }
}
