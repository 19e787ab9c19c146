//! Grammar productions.
//!
//! `mod.rs` owns the statement-sequence machinery (line labels, colon
//! sequencing, block terminators); the statement, declaration, and
//! expression productions live in the sibling modules.

mod decl;
mod expr;
mod stmt;

use basic_ir::{Program, Span, Stmt, StmtKind, Type};
use basic_lexer::{Keyword, TokenKind};

use crate::Parser;

/// A token shape that terminates the current block body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Term {
    /// A bare keyword (`CASE`, `CATCH`, `LOOP`, `NEXT`, `ELSE`, ...).
    Kw(Keyword),
    /// `END` followed by the given keyword (`END SELECT`, `END IF`, ...).
    End(Keyword),
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_program(&mut self) -> Program {
        let mut program = Program::new();
        loop {
            let fresh = self.skip_eols();
            if self.cursor.at_eof() {
                break;
            }
            if fresh {
                if let Some(label) = self.take_line_label() {
                    program.main.push(label);
                    continue;
                }
            }
            if self.cursor.eat(&TokenKind::Colon) {
                continue;
            }
            match self.parse_stmt() {
                Some(stmt) if stmt.is_proc_decl() => program.procs.push(stmt),
                Some(stmt) => program.main.push(stmt),
                None => {}
            }
        }
        program
    }

    /// Parse a block body until one of the terminators (or end of input).
    /// The terminator token itself is left for the caller.
    pub(crate) fn parse_body(&mut self, terms: &[Term]) -> Vec<Stmt> {
        let mut body = Vec::new();
        loop {
            let fresh = self.skip_eols();
            if self.cursor.at_eof() {
                break;
            }
            if fresh {
                if let Some(label) = self.take_line_label() {
                    body.push(label);
                    continue;
                }
            }
            if self.at_terminator(terms) {
                break;
            }
            // A colon before the terminator of a single-line loop body.
            if self.cursor.eat(&TokenKind::Colon) {
                continue;
            }
            if let Some(stmt) = self.parse_stmt() {
                body.push(stmt);
            }
        }
        body
    }

    /// Skip end-of-line tokens; returns whether the cursor now sits at the
    /// start of a fresh source line.
    fn skip_eols(&mut self) -> bool {
        let mut fresh = self.cursor.previous_span() == Span::DUMMY;
        while matches!(self.cursor.current().kind, TokenKind::Eol) {
            self.cursor.advance();
            fresh = true;
        }
        fresh
    }

    /// At a fresh line, consume a leading numeric line prefix or a `Name:`
    /// label. Updates the current BASIC line number either way; returns a
    /// `Label` statement when the label stands alone (bare numeric line,
    /// or any named label).
    fn take_line_label(&mut self) -> Option<Stmt> {
        // Numeric line prefix.
        if let TokenKind::Int(value) = self.cursor.current().kind {
            let span = self.cursor.current_span();
            self.cursor.advance();
            self.line = value;
            if self.cursor.at_line_end() {
                return Some(Stmt::new(StmtKind::Label, value, span));
            }
            return None;
        }
        // Named label: `Name:` at start of line.
        if let TokenKind::Ident(name) = &self.cursor.current().kind {
            if matches!(self.cursor.peek(1).kind, TokenKind::Colon) {
                let name = name.clone();
                let span = self.cursor.current_span();
                self.cursor.advance();
                self.cursor.advance();
                let id = self.label_id(&name);
                self.line = id;
                return Some(Stmt::new(StmtKind::Label, id, span));
            }
        }
        None
    }

    /// Whether the current token(s) match one of the block terminators.
    pub(crate) fn at_terminator(&self, terms: &[Term]) -> bool {
        terms.iter().any(|term| match term {
            Term::Kw(kw) => self.cursor.at_keyword(*kw),
            Term::End(kw) => {
                self.cursor.at_keyword(Keyword::End) && self.cursor.peek(1).kind.is_keyword(*kw)
            }
        })
    }

    /// Consume `END <kw>`, reporting when it is missing.
    pub(crate) fn expect_end(&mut self, kw: Keyword, what: &str) {
        if self.cursor.at_keyword(Keyword::End) && self.cursor.peek(1).kind.is_keyword(kw) {
            self.cursor.advance();
            self.cursor.advance();
        } else {
            self.unexpected(what);
            self.sync_to_eol();
        }
    }

    /// Sigil-implied type of an identifier: `$` string, `%` integer,
    /// `!`/`#` float, default integer.
    pub(crate) fn sigil_type(name: &str) -> Type {
        match name.as_bytes().last() {
            Some(b'$') => Type::Str,
            Some(b'%') => Type::I64,
            Some(b'!') | Some(b'#') => Type::F64,
            _ => Type::I64,
        }
    }

    /// Parse a type spelling (`INTEGER`, `LONG`, `SINGLE`, `DOUBLE`,
    /// `STRING`, `BOOLEAN`) after `AS`.
    pub(crate) fn parse_type_name(&mut self) -> Option<Type> {
        let ty = if self.cursor.at_ident_ci("INTEGER") || self.cursor.at_ident_ci("LONG") {
            Type::I64
        } else if self.cursor.at_ident_ci("SINGLE") || self.cursor.at_ident_ci("DOUBLE") {
            Type::F64
        } else if self.cursor.at_ident_ci("STRING") {
            Type::Str
        } else if self.cursor.at_ident_ci("BOOLEAN") {
            Type::Bool
        } else {
            self.unexpected("a type name");
            return None;
        };
        self.cursor.advance();
        Some(ty)
    }
}
