//! Encrypting decorator over any `BlobRepository`.
//!
//! # Invariants
//! - Inner repositories only ever see sealed bytes.
//! - Each blob is authenticated against its own key name, so payloads cannot
//!   be swapped between keys undetected.
//! - Decryption failure surfaces as `RepoError::Crypto`, which callers map to
//!   a corrupt-store condition.

use crate::crypto::NoteCipher;
use crate::repo::blob_repo::{BlobRepository, RepoResult};

/// `BlobRepository` that seals values with `NoteCipher` before delegating.
#[derive(Debug)]
pub struct EncryptedBlobRepository<R: BlobRepository> {
    inner: R,
    cipher: NoteCipher,
}

impl<R: BlobRepository> EncryptedBlobRepository<R> {
    pub fn new(inner: R, cipher: NoteCipher) -> Self {
        Self { inner, cipher }
    }

    /// Direct access to the sealed backend, mainly for diagnostics.
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: BlobRepository> BlobRepository for EncryptedBlobRepository<R> {
    fn get(&self, key: &str) -> RepoResult<Option<Vec<u8>>> {
        match self.inner.get(key)? {
            Some(sealed) => Ok(Some(self.cipher.open(key, &sealed)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> RepoResult<()> {
        let sealed = self.cipher.seal(key, value)?;
        self.inner.put(key, &sealed)
    }
}
