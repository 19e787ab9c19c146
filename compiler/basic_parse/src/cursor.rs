//! Token cursor.
//!
//! Low-level token access, lookahead, and consumption. The cursor position
//! is always valid: the token list ends with `Eof` and `advance` refuses to
//! move past it.

use basic_ir::Span;
use basic_lexer::{Keyword, Token, TokenKind};

pub(crate) struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)),
            "token stream must end with Eof"
        );
        Cursor { tokens, pos: 0 }
    }

    /// Current token.
    #[inline]
    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Current token's span.
    #[inline]
    pub(crate) fn current_span(&self) -> Span {
        self.current().span
    }

    /// Token `ahead` positions past the current one (clamped to `Eof`).
    #[inline]
    pub(crate) fn peek(&self, ahead: usize) -> &Token {
        let idx = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Span of the most recently consumed token.
    #[inline]
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos == 0 {
            Span::DUMMY
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    /// Advance past the current token and return it by clone.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Whether the current token is `Eof`.
    #[inline]
    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    /// Whether the current token starts or ends a line.
    #[inline]
    pub(crate) fn at_line_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eol | TokenKind::Eof)
    }

    /// Consume the current token when it matches `kind` exactly.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.current().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token when it is the given keyword.
    pub(crate) fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.current().kind.is_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Whether the current token is the given keyword.
    #[inline]
    pub(crate) fn at_keyword(&self, kw: Keyword) -> bool {
        self.current().kind.is_keyword(kw)
    }

    /// Whether the current token is an identifier spelling `name`
    /// case-insensitively (used for non-keyword mode words like `OUTPUT`).
    pub(crate) fn at_ident_ci(&self, name: &str) -> bool {
        matches!(&self.current().kind, TokenKind::Ident(id) if id.eq_ignore_ascii_case(name))
    }

    /// Consume an identifier token and return its spelling.
    pub(crate) fn eat_ident(&mut self) -> Option<(String, Span)> {
        if let TokenKind::Ident(name) = &self.current().kind {
            let name = name.clone();
            let span = self.current().span;
            self.advance();
            Some((name, span))
        } else {
            None
        }
    }

    /// Consume an integer literal token and return its value.
    pub(crate) fn eat_int(&mut self) -> Option<(i64, Span)> {
        if let TokenKind::Int(value) = self.current().kind {
            let span = self.current().span;
            self.advance();
            Some((value, span))
        } else {
            None
        }
    }
}
