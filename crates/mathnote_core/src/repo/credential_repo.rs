//! Reference-credential storage contracts and implementations.
//!
//! # Responsibility
//! - Hold the single reference credential the login gate compares against.
//! - Keep serialization of that credential inside the repository layer.
//!
//! # Invariants
//! - At most one reference credential exists; `set_reference` replaces it.
//! - The blob-backed implementation stores JSON under `CREDENTIAL_KEY`;
//!   pair it with `EncryptedBlobRepository` so the secret is sealed at rest.

use crate::model::credential::Credential;
use crate::repo::blob_repo::{BlobRepository, RepoError, RepoResult};
use std::sync::{Mutex, PoisonError};

/// Logical blob key holding the reference credential.
pub const CREDENTIAL_KEY: &str = "credential";

/// Secure store for the reference credential.
pub trait CredentialRepository {
    /// Returns the reference credential, or `None` when not provisioned.
    fn get_reference(&self) -> RepoResult<Option<Credential>>;
    /// Provisions or replaces the reference credential.
    fn set_reference(&self, credential: &Credential) -> RepoResult<()>;
}

/// Credential repository persisted through a `BlobRepository`.
pub struct BlobCredentialRepository<R: BlobRepository> {
    blobs: R,
}

impl<R: BlobRepository> BlobCredentialRepository<R> {
    pub fn new(blobs: R) -> Self {
        Self { blobs }
    }
}

impl<R: BlobRepository> CredentialRepository for BlobCredentialRepository<R> {
    fn get_reference(&self) -> RepoResult<Option<Credential>> {
        let Some(bytes) = self.blobs.get(CREDENTIAL_KEY)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| RepoError::InvalidData(format!("credential payload: {err}")))
    }

    fn set_reference(&self, credential: &Credential) -> RepoResult<()> {
        let bytes = serde_json::to_vec(credential)
            .map_err(|err| RepoError::InvalidData(format!("credential payload: {err}")))?;
        self.blobs.put(CREDENTIAL_KEY, &bytes)
    }
}

/// Process-local credential repository.
#[derive(Debug, Default)]
pub struct MemoryCredentialRepository {
    reference: Mutex<Option<Credential>>,
}

impl MemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(credential: Credential) -> Self {
        Self {
            reference: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialRepository for MemoryCredentialRepository {
    fn get_reference(&self) -> RepoResult<Option<Credential>> {
        Ok(self
            .reference
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set_reference(&self, credential: &Credential) -> RepoResult<()> {
        *self.reference.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
        Ok(())
    }
}
