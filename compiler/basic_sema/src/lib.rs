//! Semantic analyzer for the BASIC front end.
//!
//! Resolves every variable and array reference to a declared binding,
//! renames scoped locals to globally unique `_N` forms (rewriting
//! references in lock-step), enforces type compatibility, and publishes
//! procedure signatures and symbol tables for the lowerer.
//!
//! Analysis mutates the AST in place. Diagnostics accumulate in the shared
//! emitter; analysis itself never aborts early, so one run surfaces as
//! many problems as possible.

mod analyzer;
mod expr;
mod scope;
#[cfg(test)]
mod tests;

use basic_diagnostic::DiagnosticEmitter;
use basic_ir::{Program, Type};
use rustc_hash::FxHashMap;

/// Resolved information about one binding, keyed by its unique
/// (post-rename) name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarInfo {
    pub ty: Type,
    pub is_array: bool,
    /// Refers to a program-scope binding through `SHARED`.
    pub is_shared: bool,
}

/// Signature of a user-defined procedure, for call checking and lowering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcSignature {
    pub params: Vec<ParamInfo>,
    /// `None` for subroutines.
    pub ret: Option<Type>,
}

/// One parameter of a procedure signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: String,
    pub ty: Type,
    pub is_array: bool,
}

/// Output of semantic analysis, consumed by the lowerer.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    /// Program-scope bindings by name (not renamed).
    pub program_vars: FxHashMap<String, VarInfo>,
    /// Per-procedure locals by unique (renamed) name.
    pub proc_vars: FxHashMap<String, FxHashMap<String, VarInfo>>,
    /// Procedure signatures by declared name.
    pub procs: FxHashMap<String, ProcSignature>,
}

/// Analyze a program in place.
pub fn analyze(
    program: &mut Program,
    emitter: &mut DiagnosticEmitter,
    file_id: u32,
) -> Analysis {
    analyzer::Analyzer::new(emitter, file_id).run(program)
}
