//! Lexer for the BASIC front end.
//!
//! A single-pass byte scanner that produces spanned tokens directly:
//! keywords are resolved case-insensitively, identifiers keep their source
//! spelling (including the trailing `$ % ! #` sigil), string escapes are
//! decoded at lex time, and `REM`/`'` comments are discarded. Physical line
//! ends become [`TokenKind::Eol`] tokens so the parser can detect
//! statement boundaries and leading line numbers.
//!
//! Lex errors are accumulated, not raised: the scanner always produces a
//! token stream ending in `Eof`, and the parser converts accumulated
//! [`LexError`]s into diagnostics.

mod error;
mod keywords;
mod scanner;
mod token;

pub use error::{LexError, LexErrorKind};
pub use keywords::Keyword;
pub use scanner::tokenize;
pub use token::{Token, TokenKind};
