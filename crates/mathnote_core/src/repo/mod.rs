//! Repository layer: persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the key/value blob contract used by the note store.
//! - Layer encryption and credential storage on top of that contract.
//! - Isolate SQLite details from service orchestration.
//!
//! # Invariants
//! - `put` replaces the whole value for a key atomically.
//! - `get` of a never-written key is `Ok(None)`, not an error.

pub mod blob_repo;
pub mod credential_repo;
pub mod encrypted_blob_repo;
