//! Secret-at-rest encryption for credential fields
//!
//! Secrets are sealed with AES-256-GCM under a key derived from the configured
//! passphrase using PBKDF2-HMAC-SHA256. Each call draws a fresh 96-bit nonce, so
//! encrypting the same plaintext twice yields different ciphertexts. The stored
//! text form is base64 of `nonce || ciphertext || tag`.
//!
//! Rotating the passphrase invalidates every previously stored ciphertext.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::Engine;
use sha2::Sha256;
use thiserror::Error;

const KEY_SALT: &[u8] = b"netinv-secret-field-key-v1";
const KEY_ITERATIONS: u32 = 100_000;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Errors from sealing or opening a secret
///
/// Messages never carry plaintext, ciphertext or key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("secret passphrase is empty")]
    EmptyPassphrase,

    #[error("failed to encrypt secret")]
    Encryption,

    #[error("failed to decrypt secret")]
    Decryption,
}

/// Symmetric cipher for single secret strings
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretCipher { .. }")
    }
}

impl SecretCipher {
    /// Derive the cipher key from a passphrase.
    pub fn new(passphrase: &str) -> Result<Self, CipherError> {
        if passphrase.is_empty() {
            return Err(CipherError::EmptyPassphrase);
        }

        let mut key = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), KEY_SALT, KEY_ITERATIONS, &mut key);
        let cipher = Aes256Gcm::new(&key.into());
        key.fill(0);

        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + sealed.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&sealed);
        Ok(base64::engine::general_purpose::STANDARD.encode(combined))
    }

    /// Reverse [`SecretCipher::encrypt`].
    ///
    /// Malformed, truncated or tampered input and a key mismatch all fail with
    /// [`CipherError::Decryption`].
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let combined = base64::engine::general_purpose::STANDARD
            .decode(ciphertext.trim())
            .map_err(|_| CipherError::Decryption)?;

        if combined.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Decryption);
        }

        let (nonce_bytes, sealed) = combined.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| CipherError::Decryption)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::Decryption)
    }
}
