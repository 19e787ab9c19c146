//! Stable diagnostic codes.
//!
//! Codes are the contract downstream tests assert on; message wording may
//! change, codes may not. Numeric `B` codes are grouped by phase:
//! - B0xxx: driver / support
//! - B10xx: lexer
//! - B11xx: parser
//! - B2xxx: semantic analysis
//!
//! A handful of parser diagnostics keep their historical named codes
//! (`ERR_Case_EmptyLabelList`, ...) because golden tests match on them.

use std::fmt;

/// Stable diagnostic code.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Driver / support (B0xxx)
    /// Source manager exhausted the file identifier space.
    B0005,

    // Lexer (B10xx)
    /// Unterminated string literal.
    B1001,
    /// Malformed numeric literal.
    B1002,
    /// Unexpected character in source.
    B1003,
    /// Unknown escape sequence in a string literal.
    B1004,

    // Parser (B11xx)
    /// Unexpected token.
    B1101,
    /// Expected an expression.
    B1102,
    /// Expected a variable (scalar or array element).
    B1103,
    /// Missing statement terminator (`END IF`, `LOOP`, `NEXT`, ...).
    B1104,
    /// Unknown statement keyword.
    B1105,

    // Parser, named codes kept for golden-test stability
    /// `CASE` arm with an empty label list.
    CaseEmptyLabelList,
    /// `CASE` label that is not an integer literal.
    CaseInvalidLabel,
    /// More than one `CASE ELSE` arm.
    SelectCaseDuplicateElse,
    /// `SELECT CASE` without `END SELECT`.
    SelectCaseMissingEndSelect,

    // Semantic analysis (B2xxx)
    /// String operand where a numeric value is required (or vice versa).
    B2001,
    /// Unknown procedure or name.
    B2002,
    /// Array used before `DIM`, or `DIM`/`REDIM` misuse.
    B2003,
    /// Argument count mismatch.
    B2004,
    /// Argument type mismatch.
    B2005,
    /// Return type mismatch.
    B2006,
    /// Duplicate declaration in the same scope.
    B2007,
    /// Sigil conflicts with the declared type.
    B2008,
}

impl ErrorCode {
    /// Stable textual form written inside `error[...]`.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::B0005 => "B0005",
            ErrorCode::B1001 => "B1001",
            ErrorCode::B1002 => "B1002",
            ErrorCode::B1003 => "B1003",
            ErrorCode::B1004 => "B1004",
            ErrorCode::B1101 => "B1101",
            ErrorCode::B1102 => "B1102",
            ErrorCode::B1103 => "B1103",
            ErrorCode::B1104 => "B1104",
            ErrorCode::B1105 => "B1105",
            ErrorCode::CaseEmptyLabelList => "ERR_Case_EmptyLabelList",
            ErrorCode::CaseInvalidLabel => "ERR_Case_InvalidLabel",
            ErrorCode::SelectCaseDuplicateElse => "ERR_SelectCase_DuplicateElse",
            ErrorCode::SelectCaseMissingEndSelect => "ERR_SelectCase_MissingEndSelect",
            ErrorCode::B2001 => "B2001",
            ErrorCode::B2002 => "B2002",
            ErrorCode::B2003 => "B2003",
            ErrorCode::B2004 => "B2004",
            ErrorCode::B2005 => "B2005",
            ErrorCode::B2006 => "B2006",
            ErrorCode::B2007 => "B2007",
            ErrorCode::B2008 => "B2008",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
