//! Domain model for math notes and login credentials.
//!
//! # Responsibility
//! - Define the value objects shared by store, gate and FFI layers.
//! - Own validation rules for user-entered note fields.
//!
//! # Invariants
//! - Notes are value objects; equality is structural.
//! - Collections preserve insertion order and allow duplicates.

pub mod credential;
pub mod note;
