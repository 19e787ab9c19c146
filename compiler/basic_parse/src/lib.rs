//! Recursive-descent parser for the BASIC front end.
//!
//! The parser never panics on malformed input. Problems are recorded as
//! diagnostics and the parser synchronizes to the next statement boundary
//! (end of line, or the terminating keyword of the enclosing block), so a
//! well-formed `Program` value always comes back — possibly oddly shaped,
//! which downstream tests rely on (a `TRY` without `CATCH` still yields a
//! `TryCatch` node; a stray `END TRY` still parses as `End`).
//!
//! # Statement dispatch
//!
//! Each physical line optionally starts with a numeric label or a `Name:`
//! label; the rest is keyword-dispatched to the per-statement parsers in
//! `grammar`. Declarations (`FUNCTION`, `SUB`, `CLASS`, `TYPE`,
//! `INTERFACE`) accumulate into `Program::procs`, everything else into
//! `Program::main`.

mod cursor;
mod grammar;
#[cfg(test)]
mod tests;

use basic_diagnostic::{DiagnosticEmitter, ErrorCode};
use basic_ir::{Program, Span, FIRST_SYNTHETIC_LABEL};
use basic_lexer::{Token, TokenKind};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use cursor::Cursor;

/// Parse BASIC source text into a `Program`.
///
/// `emitter` is optional: tests that only inspect the AST can pass `None`
/// and diagnostics are silently dropped, mirroring how the printer-oracle
/// tests drive the parser.
pub fn parse_program(
    source: &str,
    file_id: u32,
    emitter: Option<&mut DiagnosticEmitter>,
) -> Program {
    let (tokens, lex_errors) = basic_lexer::tokenize(source);
    let mut parser = Parser::new(tokens, file_id, emitter);
    for err in &lex_errors {
        let code = match err.kind {
            basic_lexer::LexErrorKind::UnterminatedString => ErrorCode::B1001,
            basic_lexer::LexErrorKind::BadNumericLiteral => ErrorCode::B1002,
            basic_lexer::LexErrorKind::UnexpectedCharacter => ErrorCode::B1003,
            basic_lexer::LexErrorKind::UnknownEscape => ErrorCode::B1004,
        };
        parser.report(code, err.span, err.message.clone());
    }
    let program = parser.parse_program();
    debug!(
        procs = program.procs.len(),
        main = program.main.len(),
        "parsed program"
    );
    program
}

/// Parser state shared by the grammar modules.
pub(crate) struct Parser<'a> {
    cursor: Cursor,
    file_id: u32,
    emitter: Option<&'a mut DiagnosticEmitter>,
    /// Named label -> synthetic id (>= 1,000,000), assigned on first sight.
    labels: FxHashMap<String, i64>,
    next_synthetic: i64,
    /// BASIC line number of the statement currently being parsed.
    line: i64,
    /// Array names seen in `DIM`/`REDIM`/array parameters, used to tell
    /// `NAME(expr)` array accesses apart from calls.
    known_arrays: FxHashSet<String>,
    /// Nesting depth of procedure bodies; decides whether a bare `RETURN`
    /// is a GOSUB return.
    proc_depth: u32,
    /// When false, `AS` is not consumed as a cast inside expressions
    /// (used by `CONST name = expr AS TYPE` initializers).
    allow_as_cast: bool,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, file_id: u32, emitter: Option<&'a mut DiagnosticEmitter>) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
            file_id,
            emitter,
            labels: FxHashMap::default(),
            next_synthetic: FIRST_SYNTHETIC_LABEL,
            line: 0,
            known_arrays: FxHashSet::default(),
            proc_depth: 0,
            allow_as_cast: true,
        }
    }

    /// Record a parse diagnostic, when an emitter is attached.
    pub(crate) fn report(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        if let Some(emitter) = self.emitter.as_deref_mut() {
            emitter.error(code, self.file_id, span, message);
        }
    }

    /// Synthetic id for a named label, assigning the next free one on
    /// first sight.
    pub(crate) fn label_id(&mut self, name: &str) -> i64 {
        if let Some(&id) = self.labels.get(name) {
            return id;
        }
        let id = self.next_synthetic;
        self.next_synthetic += 1;
        self.labels.insert(name.to_string(), id);
        id
    }

    /// "expected X, found Y" at the current token.
    pub(crate) fn unexpected(&mut self, expected: &str) {
        let found = self.cursor.current().kind.describe();
        let span = self.cursor.current_span();
        self.report(
            ErrorCode::B1101,
            span,
            format!("expected {expected}, found {found}"),
        );
    }

    /// Skip tokens up to (not including) the next end of line, so the
    /// statement sequence loop resumes at a clean boundary.
    pub(crate) fn sync_to_eol(&mut self) {
        while !matches!(
            self.cursor.current().kind,
            TokenKind::Eol | TokenKind::Eof
        ) {
            self.cursor.advance();
        }
    }
}
