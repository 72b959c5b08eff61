//! Note store lifecycle service.
//!
//! # Responsibility
//! - Load the persisted note collection on `init` and save it on `shutdown`.
//! - Hold the working collection between those points and validate appends.
//! - Map repository failures onto the store error taxonomy.
//!
//! # Invariants
//! - State machine: `Uninitialized -> Loaded -> {Loaded, Saving -> Loaded}`.
//! - At most one save writes to the backend at a time; later saves wait.
//! - A corrupt payload is discarded as a whole and reported, never crashes.
//! - A backend read failure leaves the store `Uninitialized`, so a later save
//!   cannot overwrite data that was merely unreachable.
//! - Note titles and text are never written to logs.

use crate::expr::ExprError;
use crate::model::note::{Note, NoteCollection, NoteValidationError};
use crate::repo::blob_repo::{BlobRepository, RepoError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Logical blob key holding the serialized note collection.
pub const NOTES_KEY: &str = "notes";

pub type StoreResult<T> = Result<T, StoreError>;

/// Lifecycle state of a `NoteStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Loaded,
    Saving,
}

/// Note store error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Operation requires `init` to have completed.
    NotLoaded,
    /// Persisted payload could not be decrypted or decoded.
    Corrupt(String),
    /// Backend could not be read.
    ReadFailed(String),
    /// Backend rejected the write; the previous payload is still in place.
    WriteFailed(String),
    Validation(NoteValidationError),
}

impl StoreError {
    /// Stable machine-readable code for UI mapping and log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotLoaded => "store_not_loaded",
            Self::Corrupt(_) => "store_corrupt",
            Self::ReadFailed(_) => "store_read_failed",
            Self::WriteFailed(_) => "store_write_failed",
            Self::Validation(_) => "note_invalid",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotLoaded => write!(f, "note store is not loaded"),
            Self::Corrupt(details) => write!(f, "stored notes are corrupt: {details}"),
            Self::ReadFailed(details) => write!(f, "failed to read stored notes: {details}"),
            Self::WriteFailed(details) => write!(f, "failed to save notes: {details}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for StoreError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

struct Inner {
    state: StoreState,
    notes: NoteCollection,
}

/// Owner of the durable note collection.
pub struct NoteStore<R: BlobRepository> {
    repo: R,
    inner: Mutex<Inner>,
    save_gate: Mutex<()>,
}

impl<R: BlobRepository> NoteStore<R> {
    /// Creates an uninitialized store over `repo`.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            inner: Mutex::new(Inner {
                state: StoreState::Uninitialized,
                notes: NoteCollection::new(),
            }),
            save_gate: Mutex::new(()),
        }
    }

    pub fn state(&self) -> StoreState {
        self.inner().state
    }

    /// Reads, decrypts and decodes the persisted collection.
    ///
    /// Does not touch the working collection or the lifecycle state.
    ///
    /// # Errors
    /// - `Corrupt` when the payload fails decryption or decoding.
    /// - `ReadFailed` when the backend itself fails.
    pub fn load(&self) -> StoreResult<NoteCollection> {
        let started_at = Instant::now();
        let result = self.read_collection();
        match &result {
            Ok(notes) => info!(
                "event=notes_load module=store status=ok count={} duration_ms={}",
                notes.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=notes_load module=store status=error error_code={} duration_ms={} error={}",
                err.code(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Serializes, encrypts and writes `notes` as one atomic replacement.
    ///
    /// Concurrent calls are serialized; none of them observes another's
    /// partial write.
    ///
    /// # Errors
    /// - `NotLoaded` before a successful `init`.
    /// - `WriteFailed` when encoding or the backend write fails.
    pub fn save(&self, notes: &NoteCollection) -> StoreResult<()> {
        let _gate = self.save_gate();
        self.write_collection(notes)
    }

    /// Loads persisted notes into the working collection.
    ///
    /// Calling `init` on a loaded store is a no-op. On `Corrupt` the store
    /// still becomes `Loaded` with an empty collection and the error is
    /// returned so the caller can surface the data loss.
    ///
    /// # Errors
    /// - `Corrupt` (store usable, collection empty).
    /// - `ReadFailed` (store stays `Uninitialized`).
    pub fn init(&self) -> StoreResult<()> {
        if self.state() != StoreState::Uninitialized {
            return Ok(());
        }

        let loaded = self.load();
        let mut inner = self.inner();
        if inner.state != StoreState::Uninitialized {
            return Ok(());
        }
        match loaded {
            Ok(notes) => {
                inner.notes = notes;
                inner.state = StoreState::Loaded;
                Ok(())
            }
            Err(err @ StoreError::Corrupt(_)) => {
                warn!(
                    "event=notes_init module=store status=degraded error_code={} action=discard",
                    err.code()
                );
                inner.notes = NoteCollection::new();
                inner.state = StoreState::Loaded;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Validates and appends a note to the working collection.
    ///
    /// Allowed while a save is in flight; that save writes its own snapshot.
    pub fn add_note(&self, title: &str, text: &str) -> StoreResult<Note> {
        let mut inner = self.inner();
        if inner.state == StoreState::Uninitialized {
            return Err(StoreError::NotLoaded);
        }
        let note = Note::new(title, text)?;
        inner.notes.push(note.clone());
        info!(
            "event=note_add module=store status=ok count={}",
            inner.notes.len()
        );
        Ok(note)
    }

    /// Returns a snapshot of the working collection.
    pub fn notes(&self) -> NoteCollection {
        self.inner().notes.clone()
    }

    /// Evaluates the note at `index`; `None` when out of range.
    pub fn evaluate_note(&self, index: usize) -> Option<Result<f64, ExprError>> {
        let note = self.inner().notes.get(index).cloned()?;
        Some(note.evaluate())
    }

    /// Saves the working collection.
    pub fn flush(&self) -> StoreResult<()> {
        let _gate = self.save_gate();
        let snapshot = self.notes();
        self.write_collection(&snapshot)
    }

    /// Final save at application teardown.
    pub fn shutdown(&self) -> StoreResult<()> {
        let result = self.flush();
        match &result {
            Ok(()) => info!("event=notes_shutdown module=store status=ok"),
            Err(err) => error!(
                "event=notes_shutdown module=store status=error error_code={} error={}",
                err.code(),
                err
            ),
        }
        result
    }

    fn read_collection(&self) -> StoreResult<NoteCollection> {
        let bytes = match self.repo.get(NOTES_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(NoteCollection::new()),
            Err(RepoError::Crypto(err)) => return Err(StoreError::Corrupt(err.to_string())),
            Err(RepoError::InvalidData(details)) => return Err(StoreError::Corrupt(details)),
            Err(err) => return Err(StoreError::ReadFailed(err.to_string())),
        };
        NoteCollection::from_json_bytes(&bytes).map_err(|err| StoreError::Corrupt(err.to_string()))
    }

    /// Caller must hold `save_gate`.
    fn write_collection(&self, notes: &NoteCollection) -> StoreResult<()> {
        {
            let mut inner = self.inner();
            if inner.state == StoreState::Uninitialized {
                return Err(StoreError::NotLoaded);
            }
            inner.state = StoreState::Saving;
        }

        let started_at = Instant::now();
        let result = notes
            .to_json_bytes()
            .map_err(|err| StoreError::WriteFailed(err.to_string()))
            .and_then(|bytes| {
                self.repo
                    .put(NOTES_KEY, &bytes)
                    .map_err(|err| StoreError::WriteFailed(err.to_string()))
            });
        self.inner().state = StoreState::Loaded;

        match &result {
            Ok(()) => info!(
                "event=notes_save module=store status=ok count={} duration_ms={}",
                notes.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=notes_save module=store status=error error_code={} duration_ms={} error={}",
                err.code(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_gate(&self) -> MutexGuard<'_, ()> {
        self.save_gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
