//! Core domain logic for MathNote.
//! This crate is the single source of truth for business invariants.

pub mod crypto;
pub mod db;
pub mod expr;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use crypto::{CryptoError, NoteCipher, KEY_LEN};
pub use expr::{
    evaluate, evaluate_str, parse, tokenize, EvalError, ExprError, LexError, ParseError,
    ParseErrorKind,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::credential::Credential;
pub use model::note::{add_note, Note, NoteCollection, NoteField, NoteValidationError};
pub use repo::blob_repo::{
    BlobRepository, MemoryBlobRepository, RepoError, RepoResult, SqliteBlobRepository,
};
pub use repo::credential_repo::{
    BlobCredentialRepository, CredentialRepository, MemoryCredentialRepository, CREDENTIAL_KEY,
};
pub use repo::encrypted_blob_repo::EncryptedBlobRepository;
pub use service::credential_gate::CredentialGate;
pub use service::note_store::{NoteStore, StoreError, StoreResult, StoreState, NOTES_KEY};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
