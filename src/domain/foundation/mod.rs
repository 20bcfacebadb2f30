//! Foundation module - Shared domain primitives.
//!
//! Contains the error classification every layer maps its failures into.

mod error_kind;

pub use error_kind::ErrorKind;
