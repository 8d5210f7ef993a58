//! Public runtime API surface.
//!
//! Gathers the error types every layer returns so clients can match on one
//! enum regardless of which subsystem failed.

pub mod errors;

pub use errors::{ActionRejected, MovementError, Result, RuntimeError};
