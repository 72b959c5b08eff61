//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the lifecycle and login use-cases.
//! - Keep UI/FFI layers decoupled from storage and encryption details.

pub mod credential_gate;
pub mod note_store;
