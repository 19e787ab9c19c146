//! Core data types for the BASIC front end.
//!
//! This crate contains the data model shared by every pipeline stage:
//! - Spans for source locations
//! - The AST (expressions, statements, declarations)
//! - The `Program` value that flows through the pipeline
//! - Scalar types and the builtin-function registry
//!
//! # Design Philosophy
//!
//! Each AST family is a sum type (`ExprKind`, `StmtKind`) wrapped in a
//! struct carrying the node's source span. Every node owns its children
//! exclusively through `Box`/`Vec`; there are no back-pointers and no
//! cycles, so in-place rewriters replace the owning slot directly.

pub mod ast;
mod builtins;
mod span;
mod types;

pub use ast::{
    Access, CaseArm, ClassDecl, ClassField, ConstructorDecl, DestructorDecl, DoCond, DoTestPos,
    ElseIf, ExitKind, Expr, ExprKind, Field, FunctionDecl, InterfaceDecl, MethodDecl, OpenMode,
    Param, PrintChMode, PrintItem, Program, PropertyDecl, PropertyGetter, PropertySetter,
    ResumeMode, Stmt, StmtKind, SubDecl, TypeDecl, UnaryOp,
};
pub use ast::operators::BinaryOp;
pub use builtins::{builtin_by_name, descriptor, ArgType, Builtin, BuiltinDescriptor, ResultRule,
    RuntimeVariant};
pub use span::Span;
pub use types::{DeclType, Type};

/// First synthetic id handed out for named labels (`Name:`).
///
/// Numeric labels keep their source value; named labels are mapped to
/// monotonically increasing integers starting here so the two ranges can
/// never collide in real programs.
pub const FIRST_SYNTHETIC_LABEL: i64 = 1_000_000;
