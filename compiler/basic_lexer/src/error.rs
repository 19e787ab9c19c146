//! Lexer errors.

use basic_ir::Span;
use thiserror::Error;

/// What went wrong while scanning.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LexErrorKind {
    UnterminatedString,
    BadNumericLiteral,
    UnexpectedCharacter,
    UnknownEscape,
}

/// A scan error with the offending span.
///
/// Carried alongside the token stream; the parser converts these into
/// diagnostics so the emitter renders them with carets like every other
/// error.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("{message}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
    pub message: String,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span, message: impl Into<String>) -> Self {
        LexError {
            kind,
            span,
            message: message.into(),
        }
    }
}
