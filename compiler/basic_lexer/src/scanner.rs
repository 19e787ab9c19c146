//! The scanner.
//!
//! Byte-cursor loop over the source. Produces one token per call site in
//! `scan_token`; whitespace and comments never reach the token stream.

use basic_ir::Span;

use crate::error::{LexError, LexErrorKind};
use crate::keywords;
use crate::token::{Token, TokenKind};

/// Tokenize BASIC source text.
///
/// Always returns a token stream terminated by a single `Eof` token, even
/// for malformed input; scan problems are accumulated in the error list.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut scanner = Scanner::new(source);
    scanner.run();
    (scanner.tokens, scanner.errors)
}

struct Scanner<'src> {
    src: &'src [u8],
    pos: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'src> Scanner<'src> {
    fn new(source: &'src str) -> Self {
        Scanner {
            src: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.pos < self.src.len() {
            self.scan_token();
        }
        let end = self.pos as u32;
        self.push(TokenKind::Eof, Span::new(end, end));
    }

    #[inline]
    fn peek(&self) -> u8 {
        *self.src.get(self.pos).unwrap_or(&0)
    }

    #[inline]
    fn peek_at(&self, ahead: usize) -> u8 {
        *self.src.get(self.pos + ahead).unwrap_or(&0)
    }

    #[inline]
    fn bump(&mut self) -> u8 {
        let byte = self.peek();
        self.pos += 1;
        byte
    }

    fn push(&mut self, kind: TokenKind, span: Span) {
        self.tokens.push(Token::new(kind, span));
    }

    fn error(&mut self, kind: LexErrorKind, span: Span, message: impl Into<String>) {
        self.errors.push(LexError::new(kind, span, message));
    }

    fn scan_token(&mut self) {
        let start = self.pos;
        let byte = self.bump();
        match byte {
            b' ' | b'\t' | b'\r' => {}
            b'\n' => self.push(TokenKind::Eol, Span::from_range(start..self.pos)),
            b'\'' => self.skip_to_eol(),
            b'"' => self.scan_string(start),
            b'0'..=b'9' => self.scan_number(start),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.scan_ident(start),
            b'+' => self.push(TokenKind::Plus, Span::from_range(start..self.pos)),
            b'-' => self.push(TokenKind::Minus, Span::from_range(start..self.pos)),
            b'*' => self.push(TokenKind::Star, Span::from_range(start..self.pos)),
            b'/' => self.push(TokenKind::Slash, Span::from_range(start..self.pos)),
            b'\\' => self.push(TokenKind::Backslash, Span::from_range(start..self.pos)),
            b'^' => self.push(TokenKind::Caret, Span::from_range(start..self.pos)),
            b'(' => self.push(TokenKind::LParen, Span::from_range(start..self.pos)),
            b')' => self.push(TokenKind::RParen, Span::from_range(start..self.pos)),
            b',' => self.push(TokenKind::Comma, Span::from_range(start..self.pos)),
            b';' => self.push(TokenKind::Semicolon, Span::from_range(start..self.pos)),
            b':' => self.push(TokenKind::Colon, Span::from_range(start..self.pos)),
            b'#' => self.push(TokenKind::Hash, Span::from_range(start..self.pos)),
            b'.' => self.push(TokenKind::Dot, Span::from_range(start..self.pos)),
            b'=' => self.push(TokenKind::Eq, Span::from_range(start..self.pos)),
            b'<' => {
                let kind = match self.peek() {
                    b'>' => {
                        self.pos += 1;
                        TokenKind::Ne
                    }
                    b'=' => {
                        self.pos += 1;
                        TokenKind::Le
                    }
                    _ => TokenKind::Lt,
                };
                self.push(kind, Span::from_range(start..self.pos));
            }
            b'>' => {
                let kind = if self.peek() == b'=' {
                    self.pos += 1;
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                };
                self.push(kind, Span::from_range(start..self.pos));
            }
            other => {
                let span = Span::from_range(start..self.pos);
                self.error(
                    LexErrorKind::UnexpectedCharacter,
                    span,
                    format!("unexpected character '{}'", other as char),
                );
            }
        }
    }

    fn skip_to_eol(&mut self) {
        while self.pos < self.src.len() && self.peek() != b'\n' {
            self.pos += 1;
        }
    }

    fn scan_string(&mut self, start: usize) {
        let mut value = String::new();
        loop {
            if self.pos >= self.src.len() || self.peek() == b'\n' {
                let span = Span::from_range(start..self.pos);
                self.error(
                    LexErrorKind::UnterminatedString,
                    span,
                    "unterminated string literal",
                );
                self.push(TokenKind::Str(value), span);
                return;
            }
            match self.bump() {
                b'"' => break,
                b'\\' => {
                    let escape_at = self.pos - 1;
                    match self.bump() {
                        b'n' => value.push('\n'),
                        b't' => value.push('\t'),
                        b'r' => value.push('\r'),
                        b'0' => value.push('\0'),
                        b'"' => value.push('"'),
                        b'\'' => value.push('\''),
                        b'\\' => value.push('\\'),
                        other => {
                            let span = Span::from_range(escape_at..self.pos);
                            self.error(
                                LexErrorKind::UnknownEscape,
                                span,
                                format!("unknown escape sequence '\\{}'", other as char),
                            );
                            value.push(other as char);
                        }
                    }
                }
                byte if byte < 0x80 => value.push(byte as char),
                _ => {
                    // Multi-byte UTF-8 sequence; copy it through unchanged
                    // so the payload stays byte-identical to the source.
                    let seq_start = self.pos - 1;
                    while self.pos < self.src.len() && self.peek() & 0xC0 == 0x80 {
                        self.pos += 1;
                    }
                    if let Ok(chunk) = std::str::from_utf8(&self.src[seq_start..self.pos]) {
                        value.push_str(chunk);
                    }
                }
            }
        }
        self.push(
            TokenKind::Str(value),
            Span::from_range(start..self.pos),
        );
    }

    fn scan_number(&mut self, start: usize) {
        while self.peek().is_ascii_digit() {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            is_float = true;
            self.pos += 1;
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), b'e' | b'E') {
            let mut ahead = 1;
            if matches!(self.peek_at(1), b'+' | b'-') {
                ahead = 2;
            }
            if self.peek_at(ahead).is_ascii_digit() {
                is_float = true;
                self.pos += ahead;
                while self.peek().is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }

        let digits_end = self.pos;
        // Type suffixes: `%` int16, `&` int32/64, `!` single, `#` double.
        let suffix = match self.peek() {
            b'%' | b'&' | b'!' | b'#' => {
                self.pos += 1;
                self.src[self.pos - 1]
            }
            _ => 0,
        };

        let span = Span::from_range(start..self.pos);
        let text = std::str::from_utf8(&self.src[start..digits_end]).unwrap_or("0");

        let float_result = is_float || matches!(suffix, b'!' | b'#');
        if float_result {
            match text.parse::<f64>() {
                Ok(value) => self.push(TokenKind::Float(value), span),
                Err(_) => {
                    self.error(
                        LexErrorKind::BadNumericLiteral,
                        span,
                        format!("malformed float literal '{text}'"),
                    );
                    self.push(TokenKind::Float(0.0), span);
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.push(TokenKind::Int(value), span),
                Err(_) => {
                    self.error(
                        LexErrorKind::BadNumericLiteral,
                        span,
                        format!("integer literal '{text}' out of range"),
                    );
                    self.push(TokenKind::Int(i64::MAX), span);
                }
            }
        }
    }

    fn scan_ident(&mut self, start: usize) {
        while matches!(self.peek(), b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }
        let bare_end = self.pos;
        // A single trailing sigil is part of the identifier.
        if matches!(self.peek(), b'$' | b'%' | b'!' | b'#') {
            self.pos += 1;
        }
        let span = Span::from_range(start..self.pos);
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        let has_sigil = self.pos != bare_end;

        if !has_sigil {
            if text.eq_ignore_ascii_case("REM") {
                self.skip_to_eol();
                return;
            }
            if let Some(kw) = keywords::lookup(text) {
                self.push(TokenKind::Keyword(kw), span);
                return;
            }
        }
        self.push(TokenKind::Ident(text.to_string()), span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keyword;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = tokenize(source);
        assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("print PRINT Print"),
            vec![
                TokenKind::Keyword(Keyword::Print),
                TokenKind::Keyword(Keyword::Print),
                TokenKind::Keyword(Keyword::Print),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_sigil_identifiers_keep_spelling() {
        assert_eq!(
            kinds("A$ n% x! Y#"),
            vec![
                TokenKind::Ident("A$".to_string()),
                TokenKind::Ident("n%".to_string()),
                TokenKind::Ident("x!".to_string()),
                TokenKind::Ident("Y#".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_sigiled_keyword_is_an_identifier() {
        assert_eq!(
            kinds("END$"),
            vec![TokenKind::Ident("END$".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_numeric_suffixes() {
        assert_eq!(
            kinds("42 2# 1! 7% 9&"),
            vec![
                TokenKind::Int(42),
                TokenKind::Float(2.0),
                TokenKind::Float(1.0),
                TokenKind::Int(7),
                TokenKind::Int(9),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(
            kinds("2.5 1e3 2.5E-1"),
            vec![
                TokenKind::Float(2.5),
                TokenKind::Float(1000.0),
                TokenKind::Float(0.25),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes_decode_at_lex_time() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![TokenKind::Str("a\nb".to_string()), TokenKind::Eof]
        );
        assert_eq!(
            kinds(r#""A""#),
            vec![TokenKind::Str("A".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_multibyte_string_payload() {
        assert_eq!(
            kinds("\"AßC\""),
            vec![TokenKind::Str("AßC".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let (tokens, errors) = tokenize("\"abc\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::UnterminatedString);
        assert_eq!(tokens[0].kind, TokenKind::Str("abc".to_string()));
    }

    #[test]
    fn test_comments_are_discarded() {
        assert_eq!(
            kinds("PRINT 1 ' trailing\nREM whole line\nPRINT 2"),
            vec![
                TokenKind::Keyword(Keyword::Print),
                TokenKind::Int(1),
                TokenKind::Eol,
                TokenKind::Eol,
                TokenKind::Keyword(Keyword::Print),
                TokenKind::Int(2),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_channel_hash_is_standalone() {
        assert_eq!(
            kinds("PRINT #1, X"),
            vec![
                TokenKind::Keyword(Keyword::Print),
                TokenKind::Hash,
                TokenKind::Int(1),
                TokenKind::Comma,
                TokenKind::Ident("X".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_compound_comparisons() {
        assert_eq!(
            kinds("< <= <> > >= ="),
            vec![
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Ne,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::Eq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_structure() {
        assert_eq!(
            kinds("10 END\n20 END\n"),
            vec![
                TokenKind::Int(10),
                TokenKind::Keyword(Keyword::End),
                TokenKind::Eol,
                TokenKind::Int(20),
                TokenKind::Keyword(Keyword::End),
                TokenKind::Eol,
                TokenKind::Eof,
            ]
        );
    }
}
