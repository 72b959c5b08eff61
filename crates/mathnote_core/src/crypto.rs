//! At-rest encryption for persisted blobs.
//!
//! # Responsibility
//! - Seal and open blobs with AES-256-GCM.
//! - Bind each ciphertext to the logical key it is stored under.
//!
//! # Invariants
//! - Sealed layout is `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! - A fresh random nonce is drawn for every seal.
//! - Key material is supplied by the caller (device keystore); this module
//!   never persists it.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Required key length in bytes.
pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    InvalidKeyLength(usize),
    /// Sealed payload is shorter than nonce plus tag.
    Truncated(usize),
    SealFailed,
    /// Authentication failed: wrong key, wrong logical key, or tampered data.
    OpenFailed,
}

impl Display for CryptoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKeyLength(len) => {
                write!(f, "encryption key must be {KEY_LEN} bytes, got {len}")
            }
            Self::Truncated(len) => write!(f, "sealed payload too short ({len} bytes)"),
            Self::SealFailed => write!(f, "failed to encrypt payload"),
            Self::OpenFailed => write!(f, "failed to decrypt payload"),
        }
    }
}

impl Error for CryptoError {}

/// AES-256-GCM cipher bound to one caller-supplied key.
#[derive(Clone)]
pub struct NoteCipher {
    cipher: Aes256Gcm,
}

impl NoteCipher {
    /// Builds a cipher from raw key bytes.
    ///
    /// # Errors
    /// - `InvalidKeyLength` unless `key` is exactly `KEY_LEN` bytes.
    pub fn from_key(key: &[u8]) -> Result<Self, CryptoError> {
        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
        Ok(Self { cipher })
    }

    /// Generates a random key for first-run provisioning.
    pub fn generate_key() -> [u8; KEY_LEN] {
        let generated = Aes256Gcm::generate_key(OsRng);
        let mut key = [0_u8; KEY_LEN];
        key.copy_from_slice(generated.as_slice());
        key
    }

    /// Encrypts `plaintext`, authenticating `context` as associated data.
    pub fn seal(&self, context: &str, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: context.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::SealFailed)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypts a payload produced by `seal` with the same `context`.
    pub fn open(&self, context: &str, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Truncated(sealed.len()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: context.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::OpenFailed)
    }
}

impl Debug for NoteCipher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoteCipher(<key redacted>)")
    }
}
