//! AST → IL lowering for the BASIC front end.
//!
//! Walks the analyzed AST and emits typed IL: literals become constants,
//! loads and stores go through named slots (using the analyzer's unique
//! names), control flow becomes labelled blocks with explicit jumps, and
//! everything the runtime owns — strings, channels, the terminal, error
//! handlers — becomes a call against the runtime symbol surface.
//!
//! Lowering assumes a clean analysis: the driver never invokes it when
//! any earlier stage recorded an error.

mod lower;
mod runtime;

use basic_ir::Program;
use basic_sema::Analysis;

/// Lowering configuration.
#[derive(Copy, Clone, Debug)]
pub struct LowerOptions {
    /// Insert bounds checks on array element access.
    pub bounds_checks: bool,
}

impl Default for LowerOptions {
    fn default() -> Self {
        LowerOptions {
            bounds_checks: true,
        }
    }
}

/// Lower an analyzed program to an IL module.
pub fn lower(program: &Program, analysis: &Analysis, options: LowerOptions) -> basic_il::Module {
    lower::Lowerer::new(analysis, options).run(program)
}
