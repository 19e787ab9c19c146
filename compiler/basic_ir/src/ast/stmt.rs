//! Statement and declaration nodes.

use smallvec::SmallVec;

use super::expr::Expr;
use crate::{DeclType, Span, Type};

/// Statement node.
///
/// `line` is the BASIC label of the statement: the numeric line prefix when
/// present, or the synthetic id (>= 1,000,000) assigned to a named label.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: i64,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: i64, span: Span) -> Self {
        Stmt { kind, line, span }
    }

    /// Whether this statement is a procedure-level declaration that belongs
    /// in `Program::procs` rather than the main body.
    pub fn is_proc_decl(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::Function(_)
                | StmtKind::Sub(_)
                | StmtKind::Class(_)
                | StmtKind::TypeDecl(_)
                | StmtKind::Interface(_)
        )
    }
}

/// One item of a `PRINT` list: an expression or a literal separator.
#[derive(Clone, Debug, PartialEq)]
pub enum PrintItem {
    Expr(Expr),
    Comma,
    Semicolon,
}

/// Output mode of a channel print statement.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PrintChMode {
    Print,
    Write,
}

/// File mode of an `OPEN` statement. Ordinals are stable: the printer emits
/// them numerically (`mode=INPUT(0)`).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum OpenMode {
    Input = 0,
    Output = 1,
    Append = 2,
    Binary = 3,
    Random = 4,
}

impl OpenMode {
    pub const fn name(self) -> &'static str {
        match self {
            OpenMode::Input => "INPUT",
            OpenMode::Output => "OUTPUT",
            OpenMode::Append => "APPEND",
            OpenMode::Binary => "BINARY",
            OpenMode::Random => "RANDOM",
        }
    }
}

/// Loop kind named by an `EXIT` statement.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ExitKind {
    For,
    While,
    Do,
}

/// Whether a `DO` loop tests its condition before or after the body.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DoTestPos {
    Pre,
    Post,
}

/// Condition flavour of a `DO` loop.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DoCond {
    None,
    While,
    Until,
}

/// `RESUME` statement variants.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ResumeMode {
    /// Re-execute the statement that trapped.
    Same,
    /// Continue with the following statement.
    Next,
    /// Jump to a label.
    Label,
}

/// One `ELSEIF` clause of an `IF` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct ElseIf {
    pub cond: Expr,
    pub then_branch: Box<Stmt>,
}

/// One `CASE` arm of a `SELECT CASE`. Labels are integer literals only.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseArm {
    pub labels: SmallVec<[i64; 4]>,
    pub body: Vec<Stmt>,
}

/// Procedure parameter. `is_array` marks `name()` array parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub is_array: bool,
}

/// Field of a user-defined `TYPE`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// Field of a `CLASS`, which may be static.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassField {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
}

/// Member access level.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Access {
    Public,
    Private,
}

/// `FUNCTION` declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    /// Dotted path when declared inside a namespace; `None` otherwise.
    pub qualified_name: Option<String>,
    pub params: Vec<Param>,
    /// Resolved return type (sigil or annotation, default I64).
    pub ret: Type,
    /// The return annotation exactly as written, when present.
    pub explicit_ret: DeclType,
    pub body: Vec<Stmt>,
}

/// `SUB` declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct SubDecl {
    pub name: String,
    pub qualified_name: Option<String>,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// `CONSTRUCTOR` declaration inside a class.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructorDecl {
    pub is_static: bool,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// `DESTRUCTOR` declaration inside a class.
#[derive(Clone, Debug, PartialEq)]
pub struct DestructorDecl {
    pub body: Vec<Stmt>,
}

/// `METHOD` declaration inside a class or interface.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDecl {
    pub is_static: bool,
    pub name: String,
    pub ret: Option<Type>,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// `GET` accessor of a property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyGetter {
    pub access: Access,
    pub body: Vec<Stmt>,
}

/// `SET` accessor of a property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySetter {
    pub access: Access,
    pub param_name: String,
    pub body: Vec<Stmt>,
}

/// `PROPERTY` declaration inside a class.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub is_static: bool,
    pub name: String,
    pub ty: Type,
    pub access: Access,
    pub get: Option<PropertyGetter>,
    pub set: Option<PropertySetter>,
}

/// `CLASS` declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub qualified_name: Option<String>,
    pub fields: Vec<ClassField>,
    /// Dotted interface names from the `IMPLEMENTS` clause.
    pub implements: Vec<Vec<String>>,
    pub members: Vec<Stmt>,
}

/// `TYPE` declaration (plain aggregate, no members).
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub fields: Vec<Field>,
}

/// `INTERFACE` declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceDecl {
    pub qualified_name: Vec<String>,
    pub members: Vec<Stmt>,
}

/// Statement variants.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// A bare label line (numeric prefix with no statement, or `Name:`).
    Label,

    Print {
        items: Vec<PrintItem>,
    },
    PrintCh {
        mode: PrintChMode,
        channel: Option<Expr>,
        args: Vec<Expr>,
        trailing_newline: bool,
    },
    Input {
        prompt: Option<Expr>,
        vars: Vec<String>,
    },
    InputCh {
        channel: Expr,
        targets: Vec<String>,
    },
    LineInputCh {
        channel: Option<Expr>,
        target: Option<Expr>,
    },
    Open {
        mode: OpenMode,
        path: Option<Expr>,
        channel: Option<Expr>,
    },
    Close {
        channel: Option<Expr>,
    },
    Seek {
        channel: Option<Expr>,
        position: Option<Expr>,
    },

    Let {
        target: Expr,
        value: Expr,
    },
    Const {
        name: String,
        value: Expr,
        ty: Type,
    },
    Dim {
        name: String,
        is_array: bool,
        size: Option<Expr>,
        ty: Type,
    },
    ReDim {
        name: String,
        size: Option<Expr>,
    },
    Static {
        name: String,
        ty: Type,
    },
    Shared {
        names: Vec<String>,
    },
    Swap {
        lhs: Expr,
        rhs: Expr,
    },

    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        elseifs: Vec<ElseIf>,
        else_branch: Option<Box<Stmt>>,
    },
    SelectCase {
        selector: Option<Expr>,
        arms: Vec<CaseArm>,
        else_body: Vec<Stmt>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    Do {
        test_pos: DoTestPos,
        cond_kind: DoCond,
        cond: Option<Expr>,
        body: Vec<Stmt>,
    },
    For {
        var: String,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Vec<Stmt>,
    },
    Next {
        var: String,
    },
    Exit {
        kind: ExitKind,
    },
    Goto {
        target: i64,
    },
    Gosub {
        target_line: i64,
    },
    Return {
        is_gosub_return: bool,
        value: Option<Expr>,
    },
    End,

    OnErrorGoto {
        target: i64,
        to_zero: bool,
    },
    Resume {
        mode: ResumeMode,
        target: i64,
    },
    TryCatch {
        try_body: Vec<Stmt>,
        catch_var: Option<String>,
        catch_body: Vec<Stmt>,
    },

    Cls,
    Beep,
    Cursor {
        visible: bool,
    },
    AltScreen {
        enabled: bool,
    },
    Color {
        fg: Option<Expr>,
        bg: Option<Expr>,
    },
    Locate {
        row: Option<Expr>,
        col: Option<Expr>,
    },
    Sleep {
        ms: Option<Expr>,
    },
    Randomize {
        seed: Expr,
    },

    Function(FunctionDecl),
    Sub(SubDecl),
    Constructor(ConstructorDecl),
    Destructor(DestructorDecl),
    Method(MethodDecl),
    Property(PropertyDecl),
    Class(ClassDecl),
    TypeDecl(TypeDecl),
    Interface(InterfaceDecl),
    Using {
        alias: Option<String>,
        path: Vec<String>,
    },
    Delete {
        target: Expr,
    },

    /// Ordered statement sequence (colon-separated statements, single-line
    /// IF branches).
    StmtList(Vec<Stmt>),
    /// Procedure invocation in statement position.
    CallStmt {
        call: Option<Expr>,
    },
}
