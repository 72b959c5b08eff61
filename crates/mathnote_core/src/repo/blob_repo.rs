//! Key/value blob repository contracts and implementations.
//!
//! # Responsibility
//! - Store opaque byte payloads under fixed logical keys.
//! - Provide a SQLite implementation for devices and an in-memory one for
//!   tests and ephemeral sessions.
//!
//! # Invariants
//! - SQLite writes run in an immediate transaction; readers observe either
//!   the previous value or the new one, never a partial write.
//! - Repositories are `Send + Sync`; interior locks are recovered on poison.

use crate::crypto::CryptoError;
use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for blob persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Crypto(CryptoError),
    /// Stored payload decrypted but does not match the expected schema.
    InvalidData(String),
    /// Failure reported by a non-SQLite backend.
    Backend(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Crypto(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Backend(message) => write!(f, "storage backend failure: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Crypto(err) => Some(err),
            Self::InvalidData(_) | Self::Backend(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CryptoError> for RepoError {
    fn from(value: CryptoError) -> Self {
        Self::Crypto(value)
    }
}

/// Key/value persistence backend for opaque blobs.
pub trait BlobRepository {
    /// Returns the value stored under `key`, or `None` when never written.
    fn get(&self, key: &str) -> RepoResult<Option<Vec<u8>>>;
    /// Atomically replaces the value stored under `key`.
    fn put(&self, key: &str, value: &[u8]) -> RepoResult<()>;
}

impl<R: BlobRepository + ?Sized> BlobRepository for Arc<R> {
    fn get(&self, key: &str) -> RepoResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> RepoResult<()> {
        (**self).put(key, value)
    }
}

impl<R: BlobRepository + ?Sized> BlobRepository for &R {
    fn get(&self, key: &str) -> RepoResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> RepoResult<()> {
        (**self).put(key, value)
    }
}

/// SQLite-backed blob repository owning one migrated connection.
pub struct SqliteBlobRepository {
    conn: Mutex<Connection>,
}

impl SqliteBlobRepository {
    /// Opens (or creates) the database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection already returned by `open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlobRepository for SqliteBlobRepository {
    fn get(&self, key: &str) -> RepoResult<Option<Vec<u8>>> {
        let conn = self.conn();
        let value = conn
            .query_row("SELECT value FROM blobs WHERE key = ?1;", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &[u8]) -> RepoResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO blobs (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        tx.commit()?;
        Ok(())
    }
}

/// Process-local blob repository.
#[derive(Debug, Default)]
pub struct MemoryBlobRepository {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlobRepository for MemoryBlobRepository {
    fn get(&self, key: &str) -> RepoResult<Option<Vec<u8>>> {
        Ok(self.entries().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> RepoResult<()> {
        self.entries().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
