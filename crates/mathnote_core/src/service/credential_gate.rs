//! Login credential gate.
//!
//! # Responsibility
//! - Compare a candidate credential against the stored reference.
//!
//! # Invariants
//! - Fails closed: any retrieval error or a missing reference yields `false`.
//! - The boolean result never reveals which field mismatched.
//! - Identity and secret values are never logged.

use crate::model::credential::Credential;
use crate::repo::credential_repo::CredentialRepository;
use log::{error, info, warn};
use std::time::Instant;

/// Boolean login check over a `CredentialRepository`.
pub struct CredentialGate<R: CredentialRepository> {
    repo: R,
}

impl<R: CredentialRepository> CredentialGate<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns `true` only when both fields exactly match the reference.
    pub fn verify(&self, candidate: &Credential) -> bool {
        let started_at = Instant::now();
        match self.repo.get_reference() {
            Ok(Some(reference)) => {
                let granted = reference.matches(candidate);
                info!(
                    "event=auth_verify module=auth status={} duration_ms={}",
                    if granted { "ok" } else { "denied" },
                    started_at.elapsed().as_millis()
                );
                granted
            }
            Ok(None) => {
                warn!(
                    "event=auth_verify module=auth status=denied reason=no_reference duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                false
            }
            Err(err) => {
                error!(
                    "event=auth_verify module=auth status=error error_code=credential_read_failed duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CredentialGate;
    use crate::model::credential::Credential;
    use crate::repo::blob_repo::{RepoError, RepoResult};
    use crate::repo::credential_repo::{CredentialRepository, MemoryCredentialRepository};

    struct FailingRepo;

    impl CredentialRepository for FailingRepo {
        fn get_reference(&self) -> RepoResult<Option<Credential>> {
            Err(RepoError::Backend("keystore locked".to_string()))
        }

        fn set_reference(&self, _credential: &Credential) -> RepoResult<()> {
            Err(RepoError::Backend("keystore locked".to_string()))
        }
    }

    #[test]
    fn verify_fails_closed_on_retrieval_error() {
        let gate = CredentialGate::new(FailingRepo);
        assert!(!gate.verify(&Credential::new("ada", "pw")));
    }

    #[test]
    fn verify_fails_closed_without_reference() {
        let gate = CredentialGate::new(MemoryCredentialRepository::new());
        assert!(!gate.verify(&Credential::new("", "")));
    }

    #[test]
    fn verify_accepts_exact_match_only() {
        let gate = CredentialGate::new(MemoryCredentialRepository::with_reference(
            Credential::new("ada", "pw"),
        ));
        assert!(gate.verify(&Credential::new("ada", "pw")));
        assert!(!gate.verify(&Credential::new("ada", "pw ")));
        assert!(!gate.verify(&Credential::new("bob", "pw")));
    }
}
