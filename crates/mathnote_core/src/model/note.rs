//! Note domain model.
//!
//! # Responsibility
//! - Define the `{title, text}` record persisted by the note store.
//! - Provide validated, order-preserving append semantics.
//!
//! # Invariants
//! - `text` is stored raw and re-parsed on every evaluation.
//! - A validated append never reorders or mutates existing notes.
//! - Wire shape is a JSON array of `{"title", "text"}` objects.
//! - No `Note` with a blank field can be built or decoded, so every
//!   collection that can be saved can also be loaded back.

use crate::expr::{evaluate_str, ExprError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// User-entered note field, used in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    Title,
    Text,
}

impl NoteField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Text => "text",
        }
    }
}

/// Validation error for note input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Field is empty after trimming whitespace.
    EmptyField(NoteField),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "note {} cannot be empty", field.as_str()),
        }
    }
}

impl Error for NoteValidationError {}

/// One titled note whose text may hold an arithmetic expression.
///
/// Fields are private so every `Note` in existence has passed validation,
/// including ones decoded from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NoteRecord")]
pub struct Note {
    title: String,
    /// Raw expression source. Not required to be valid until evaluated.
    text: String,
}

/// Unchecked wire shape of a note.
#[derive(Deserialize)]
struct NoteRecord {
    title: String,
    text: String,
}

impl TryFrom<NoteRecord> for Note {
    type Error = NoteValidationError;

    fn try_from(record: NoteRecord) -> Result<Self, Self::Error> {
        Self::new(record.title, record.text)
    }
}

impl Note {
    /// Creates a note after rejecting blank fields.
    ///
    /// Field values are stored as given; trimming only applies to the check.
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self, NoteValidationError> {
        let title = title.into();
        let text = text.into();
        if title.trim().is_empty() {
            return Err(NoteValidationError::EmptyField(NoteField::Title));
        }
        if text.trim().is_empty() {
            return Err(NoteValidationError::EmptyField(NoteField::Text));
        }
        Ok(Self { title, text })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parses and evaluates `text` from scratch.
    pub fn evaluate(&self) -> Result<f64, ExprError> {
        evaluate_str(&self.text)
    }
}

/// Ordered note sequence; duplicates allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteCollection {
    notes: Vec<Note>,
}

impl NoteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    /// Appends one note at the end.
    pub fn push(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Serializes to the persisted JSON wire format.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Parses the persisted JSON wire format.
    ///
    /// Every record goes through `Note::new`; one blank field rejects the
    /// whole payload.
    pub fn from_json_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

impl From<Vec<Note>> for NoteCollection {
    fn from(notes: Vec<Note>) -> Self {
        Self { notes }
    }
}

impl IntoIterator for NoteCollection {
    type Item = Note;
    type IntoIter = std::vec::IntoIter<Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NoteCollection {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

/// Returns a new collection with one validated note appended.
///
/// `collection` itself is never modified.
pub fn add_note(
    collection: &NoteCollection,
    title: &str,
    text: &str,
) -> Result<NoteCollection, NoteValidationError> {
    let note = Note::new(title, text)?;
    let mut next = collection.clone();
    next.notes.push(note);
    Ok(next)
}
