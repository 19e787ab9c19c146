//! Diagnostics and source management for the BASIC front end.
//!
//! Every pipeline stage reports problems through the same
//! [`DiagnosticEmitter`], which accumulates diagnostics instead of raising
//! them: a stage keeps going past individual errors so the user sees as
//! many problems as possible in one run. The driver checks `error_count()`
//! between stages and short-circuits the pipeline when it is non-zero.
//!
//! Rendering is deterministic: diagnostics are ordered by source location,
//! then by insertion order for equal locations, and each renders as three
//! lines (header, offending source line, caret line).

mod diagnostic;
mod emitter;
mod error_code;
mod source_manager;

pub use diagnostic::{Diagnostic, Severity};
pub use emitter::DiagnosticEmitter;
pub use error_code::ErrorCode;
pub use source_manager::SourceManager;
