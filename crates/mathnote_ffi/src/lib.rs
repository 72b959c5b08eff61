//! Flutter-facing bindings for MathNote core.

pub mod api;
