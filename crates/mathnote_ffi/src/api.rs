//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the process-wide session: one encrypted database shared by the
//!   note store and the credential gate.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures come back as envelopes with `ok=false`, a stable
//!   `error_code` and a human-readable `message`.
//! - Note content and credentials never reach log lines.
//! - The `SESSION` lock is held only to clone the session handle, so a slow
//!   save never blocks other calls.

use log::{info, warn};
use mathnote_core::{
    core_version as core_version_inner, evaluate_str, init_logging as init_logging_inner,
    ping as ping_inner, BlobCredentialRepository, Credential, CredentialGate,
    CredentialRepository, EncryptedBlobRepository, NoteCipher, NoteCollection, NoteStore,
    SqliteBlobRepository, StoreError,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const DB_FILE_NAME: &str = "mathnote.sqlite3";
const DB_PATH_ENV: &str = "MATHNOTE_DB_PATH";
const NO_SESSION: &str = "no_session";

type SessionBlobs = Arc<EncryptedBlobRepository<SqliteBlobRepository>>;

static SESSION: Mutex<Option<Arc<Session>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Note projection handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub title: String,
    pub text: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Stable machine-readable code on failure.
    pub error_code: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(code.into()),
            message: message.into(),
        }
    }

    fn from_store_error(err: &StoreError) -> Self {
        Self::failure(err.code(), err.to_string())
    }
}

/// Note list response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesResponse {
    pub ok: bool,
    /// Notes in insertion order; empty on failure.
    pub items: Vec<NoteItem>,
    pub error_code: Option<String>,
    pub message: String,
}

impl NotesResponse {
    fn listing(notes: &NoteCollection, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            items: to_items(notes),
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            error_code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Evaluation response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResponse {
    pub ok: bool,
    /// Result value when `ok`.
    pub value: Option<f64>,
    pub error_code: Option<String>,
    pub message: String,
}

impl EvalResponse {
    fn from_result(result: Result<f64, mathnote_core::ExprError>) -> Self {
        match result {
            Ok(value) => Self {
                ok: true,
                value: Some(value),
                error_code: None,
                message: format_value(value),
            },
            Err(err) => Self {
                ok: false,
                value: None,
                error_code: Some(err.code().to_string()),
                message: err.to_string(),
            },
        }
    }
}

/// Opens the encrypted note database and makes it the active session.
///
/// `db_path` may be empty; `MATHNOTE_DB_PATH` and then
/// `<temp_dir>/mathnote.sqlite3` are used instead. `key` must be 32 bytes
/// taken from the platform keystore. An already open session is replaced
/// without saving; call `notes_save` first.
///
/// # FFI contract
/// - Async call (DB-backed).
/// - Never panics.
pub fn store_open(db_path: String, key: Vec<u8>) -> ActionResponse {
    let path = resolve_db_path(&db_path);
    match Session::open(&path, &key) {
        Ok(session) => {
            *session_slot() = Some(Arc::new(session));
            info!("event=store_open module=ffi status=ok");
            ActionResponse::success("Store opened.")
        }
        Err(response) => {
            warn!(
                "event=store_open module=ffi status=error error_code={}",
                response.error_code.as_deref().unwrap_or("unknown")
            );
            response
        }
    }
}

/// Provisions or replaces the reference login credential.
pub fn auth_set_reference(identity: String, secret: String) -> ActionResponse {
    with_session(|session| session.set_reference(&Credential::new(identity, secret)))
        .unwrap_or_else(no_session_action)
}

/// Compares a login attempt against the stored reference.
///
/// Returns `false` without an open session, so the gate fails closed.
pub fn auth_verify(identity: String, secret: String) -> bool {
    with_session(|session| session.verify(&Credential::new(identity, secret))).unwrap_or(false)
}

/// Loads persisted notes into the session.
///
/// A corrupt payload still yields `ok=true` with an empty list; the
/// `error_code` carries `store_corrupt` so the UI can warn about the loss.
pub fn notes_load() -> NotesResponse {
    with_session(Session::load).unwrap_or_else(|| {
        NotesResponse::failure(NO_SESSION, "Open the store before loading notes.")
    })
}

/// Returns the working note collection.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list() -> NotesResponse {
    with_session(|session| {
        let notes = session.store.notes();
        let message = format!("{} note(s).", notes.len());
        NotesResponse::listing(&notes, message)
    })
    .unwrap_or_else(|| NotesResponse::failure(NO_SESSION, "Store is not open."))
}

/// Appends a note to the working collection.
///
/// Empty title or text is rejected with "Title and equation cannot be empty".
#[flutter_rust_bridge::frb(sync)]
pub fn notes_add(title: String, text: String) -> ActionResponse {
    with_session(|session| session.add(&title, &text)).unwrap_or_else(no_session_action)
}

/// Persists the working collection; call on teardown.
pub fn notes_save() -> ActionResponse {
    with_session(Session::save).unwrap_or_else(no_session_action)
}

/// Evaluates the stored note at `index`.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_evaluate(index: u32) -> EvalResponse {
    with_session(|session| session.evaluate(index)).unwrap_or_else(|| EvalResponse {
        ok: false,
        value: None,
        error_code: Some(NO_SESSION.to_string()),
        message: "Store is not open.".to_string(),
    })
}

/// Evaluates arbitrary expression text without touching the store.
#[flutter_rust_bridge::frb(sync)]
pub fn evaluate_expression(text: String) -> EvalResponse {
    EvalResponse::from_result(evaluate_str(&text))
}

/// Database plus the services sharing it.
struct Session {
    blobs: SessionBlobs,
    store: NoteStore<SessionBlobs>,
}

impl Session {
    fn open(path: &Path, key: &[u8]) -> Result<Self, ActionResponse> {
        let cipher = NoteCipher::from_key(key)
            .map_err(|err| ActionResponse::failure("invalid_key", err.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    ActionResponse::failure("store_open_failed", err.to_string())
                })?;
            }
        }
        let repo = SqliteBlobRepository::open(path)
            .map_err(|err| ActionResponse::failure("store_open_failed", err.to_string()))?;
        let blobs = Arc::new(EncryptedBlobRepository::new(repo, cipher));
        Ok(Self {
            store: NoteStore::new(Arc::clone(&blobs)),
            blobs,
        })
    }

    fn credentials(&self) -> BlobCredentialRepository<SessionBlobs> {
        BlobCredentialRepository::new(Arc::clone(&self.blobs))
    }

    fn set_reference(&self, credential: &Credential) -> ActionResponse {
        match self.credentials().set_reference(credential) {
            Ok(()) => ActionResponse::success("Credential saved."),
            Err(err) => ActionResponse::failure("credential_write_failed", err.to_string()),
        }
    }

    fn verify(&self, candidate: &Credential) -> bool {
        CredentialGate::new(self.credentials()).verify(candidate)
    }

    fn load(&self) -> NotesResponse {
        match self.store.init() {
            Ok(()) => {
                let notes = self.store.notes();
                let message = format!("Loaded {} note(s).", notes.len());
                NotesResponse::listing(&notes, message)
            }
            Err(err @ StoreError::Corrupt(_)) => NotesResponse {
                error_code: Some(err.code().to_string()),
                ..NotesResponse::listing(
                    &self.store.notes(),
                    "Stored notes could not be read and were discarded.",
                )
            },
            Err(err) => NotesResponse::failure(err.code(), err.to_string()),
        }
    }

    fn add(&self, title: &str, text: &str) -> ActionResponse {
        match self.store.add_note(title, text) {
            Ok(_) => ActionResponse::success("Note added."),
            Err(StoreError::Validation(_)) => ActionResponse::failure(
                "note_invalid",
                "Title and equation cannot be empty",
            ),
            Err(err) => ActionResponse::from_store_error(&err),
        }
    }

    fn save(&self) -> ActionResponse {
        match self.store.shutdown() {
            Ok(()) => ActionResponse::success("Notes saved."),
            Err(err) => ActionResponse::from_store_error(&err),
        }
    }

    fn evaluate(&self, index: u32) -> EvalResponse {
        match self.store.evaluate_note(index as usize) {
            Some(result) => EvalResponse::from_result(result),
            None => EvalResponse {
                ok: false,
                value: None,
                error_code: Some("note_not_found".to_string()),
                message: format!("No note at index {index}."),
            },
        }
    }
}

fn session_slot() -> MutexGuard<'static, Option<Arc<Session>>> {
    SESSION.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs `f` on the active session after releasing the slot lock.
fn with_session<T>(f: impl FnOnce(&Session) -> T) -> Option<T> {
    let session = session_slot().clone()?;
    Some(f(&session))
}

fn no_session_action() -> ActionResponse {
    ActionResponse::failure(NO_SESSION, "Store is not open.")
}

fn resolve_db_path(explicit: &str) -> PathBuf {
    let explicit = explicit.trim();
    if !explicit.is_empty() {
        return PathBuf::from(explicit);
    }
    if let Ok(raw) = std::env::var(DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(DB_FILE_NAME)
}

fn to_items(notes: &NoteCollection) -> Vec<NoteItem> {
    notes
        .iter()
        .map(|note| NoteItem {
            title: note.title().to_string(),
            text: note.text().to_string(),
        })
        .collect()
}

/// Shortest round-tripping decimal; integral values print without `.0`.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        auth_verify, core_version, evaluate_expression, format_value, init_logging, notes_add,
        notes_evaluate, notes_list, notes_load, notes_save, ping, resolve_db_path, store_open,
        with_session, Session,
    };
    use mathnote_core::{Credential, KEY_LEN};
    use std::path::PathBuf;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn evaluate_expression_reports_value_or_typed_error() {
        let ok = evaluate_expression("2 + 3 * 4".to_string());
        assert!(ok.ok);
        assert_eq!(ok.value, Some(14.0));
        assert_eq!(ok.message, "14");

        let err = evaluate_expression("1/0".to_string());
        assert!(!err.ok);
        assert_eq!(err.value, None);
        assert_eq!(err.error_code.as_deref(), Some("division_by_zero"));

        let empty = evaluate_expression("  ".to_string());
        assert_eq!(empty.error_code.as_deref(), Some("empty_expression"));
    }

    #[test]
    fn format_value_trims_integral_results() {
        assert_eq!(format_value(14.0), "14");
        assert_eq!(format_value(-3.0), "-3");
        assert_eq!(format_value(3.5), "3.5");
        assert_eq!(format_value(1e20), "100000000000000000000");
    }

    #[test]
    fn explicit_db_path_wins() {
        assert_eq!(
            resolve_db_path(" /data/notes.sqlite3 "),
            PathBuf::from("/data/notes.sqlite3")
        );
        if std::env::var_os("MATHNOTE_DB_PATH").is_none() {
            assert_eq!(
                resolve_db_path(""),
                std::env::temp_dir().join("mathnote.sqlite3")
            );
        }
    }

    #[test]
    fn session_rejects_short_key() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::open(&dir.path().join("db.sqlite3"), &[1, 2, 3])
            .err()
            .expect("short key should be rejected");
        assert_eq!(err.error_code.as_deref(), Some("invalid_key"));
    }

    #[test]
    fn session_persists_notes_and_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.sqlite3");
        let key = [3u8; KEY_LEN];

        {
            let session = Session::open(&path, &key).unwrap();
            assert!(session.load().ok);
            assert!(session.set_reference(&Credential::new("ada", "pw")).ok);

            let rejected = session.add("", "1");
            assert!(!rejected.ok);
            assert_eq!(rejected.message, "Title and equation cannot be empty");

            assert!(session.add("sum", "2 + 2").ok);
            assert!(session.save().ok);
        }

        let session = Session::open(&path, &key).unwrap();
        assert!(session.verify(&Credential::new("ada", "pw")));
        assert!(!session.verify(&Credential::new("ada", "nope")));

        let loaded = session.load();
        assert!(loaded.ok);
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(session.evaluate(0).value, Some(4.0));
        assert_eq!(
            session.evaluate(5).error_code.as_deref(),
            Some("note_not_found")
        );
    }

    #[test]
    fn session_with_wrong_key_loads_empty_and_flags_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sqlite3");
        {
            let session = Session::open(&path, &[1u8; KEY_LEN]).unwrap();
            session.load();
            session.add("t", "1");
            assert!(session.save().ok);
        }

        let session = Session::open(&path, &[2u8; KEY_LEN]).unwrap();
        let loaded = session.load();
        assert!(loaded.ok);
        assert!(loaded.items.is_empty());
        assert_eq!(loaded.error_code.as_deref(), Some("store_corrupt"));
    }

    #[test]
    fn global_session_flow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global.sqlite3");

        let opened = store_open(
            path.to_str().unwrap().to_string(),
            vec![9u8; KEY_LEN],
        );
        assert!(opened.ok, "{}", opened.message);
        assert!(!auth_verify("ada".to_string(), "pw".to_string()));

        assert!(notes_load().ok);
        assert!(notes_add("area".to_string(), "pi * pow(1, 2)".to_string()).ok);
        assert_eq!(notes_list().items.len(), 1);
        assert!(notes_evaluate(0).ok);
        assert!(notes_save().ok);

        // Calls made from another thread while a save is in flight must not
        // wait for it.
        let during_save = with_session(|session| {
            let added = std::thread::spawn(|| {
                notes_add("during save".to_string(), "1 + 1".to_string())
            })
            .join()
            .unwrap();
            (added, session.save())
        })
        .unwrap();
        assert!(during_save.0.ok, "{}", during_save.0.message);
        assert!(during_save.1.ok, "{}", during_save.1.message);
        assert_eq!(notes_list().items.len(), 2);
        assert!(notes_save().ok);
    }
}
