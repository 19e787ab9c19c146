//! Scalar types of the BASIC front end.

use std::fmt;

/// Resolved scalar type of a binding or expression.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Type {
    /// 64-bit signed integer (the default for unsuffixed identifiers).
    #[default]
    I64,
    /// IEEE 754 double (covers both `!` single and `#` double sigils).
    F64,
    /// Runtime-owned string.
    Str,
    /// Boolean, distinct from integer 0/1 so the lowerer can emit typed IL.
    Bool,
}

impl Type {
    /// Name used by the AST printer (`AS F64`, `AS STR`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Type::I64 => "I64",
            Type::F64 => "F64",
            Type::Str => "STR",
            Type::Bool => "BOOLEAN",
        }
    }

    /// Whether the type is numeric (integer or float).
    #[inline]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Type::I64 | Type::F64)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Explicit type annotation as written in source, used on function return
/// clauses where "no annotation" and "annotated void" must stay distinct.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum DeclType {
    #[default]
    Unknown,
    Void,
    I64,
    F64,
    Str,
    Bool,
}

impl DeclType {
    /// Source spelling for dumps; `Unknown`/`Void` are never printed.
    pub const fn name(self) -> &'static str {
        match self {
            DeclType::Unknown => "UNKNOWN",
            DeclType::Void => "VOID",
            DeclType::I64 => "INTEGER",
            DeclType::F64 => "DOUBLE",
            DeclType::Str => "STRING",
            DeclType::Bool => "BOOLEAN",
        }
    }

    /// Collapse to the resolved scalar type, if the annotation names one.
    pub const fn resolve(self) -> Option<Type> {
        match self {
            DeclType::I64 => Some(Type::I64),
            DeclType::F64 => Some(Type::F64),
            DeclType::Str => Some(Type::Str),
            DeclType::Bool => Some(Type::Bool),
            DeclType::Unknown | DeclType::Void => None,
        }
    }
}
