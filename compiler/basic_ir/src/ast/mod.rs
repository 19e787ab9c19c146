//! AST node definitions.
//!
//! One sum type per family: `ExprKind` for expressions, `StmtKind` for
//! statements (declarations are statement variants carrying their own
//! payload structs). Every node owns its children exclusively; rewriters
//! replace the owning slot in place.

mod expr;
pub mod operators;
mod stmt;

pub use expr::{Expr, ExprKind, UnaryOp};
pub use stmt::{
    Access, CaseArm, ClassDecl, ClassField, ConstructorDecl, DestructorDecl, DoCond, DoTestPos,
    ElseIf, ExitKind, Field, FunctionDecl, InterfaceDecl, MethodDecl, OpenMode, Param, PrintChMode,
    PrintItem, PropertyDecl, PropertyGetter, PropertySetter, ResumeMode, Stmt, StmtKind, SubDecl,
    TypeDecl,
};

/// A parsed BASIC program.
///
/// Procedure-level declarations (`FUNCTION`, `SUB`, `CLASS`, `TYPE`,
/// `INTERFACE`) are kept apart from top-level statements so the printer can
/// emit them in source order ahead of the main body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub procs: Vec<Stmt>,
    pub main: Vec<Stmt>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
