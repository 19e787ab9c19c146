//! Deterministic S-expression dump of the BASIC AST.
//!
//! The dump is the oracle format for golden tests: one `<label>: <sexpr>`
//! line per top-level statement, procedures first, then the main body.
//! Formatting never mutates the AST and is safe to call on
//! partially-analyzed programs.
//!
//! The `Sink` value owns the output buffer plus the handful of
//! punctuation helpers whose exact spellings the golden tests depend on
//! (` {` / `})` body delimiters, `<null>` placeholders, ` channel=#`
//! prefixes, ` no-newline` tags).

mod expr;
mod sink;
mod stmt;

use basic_ir::{Program, Stmt};

pub(crate) use sink::Sink;

/// Serialize an entire program to its printable dump.
pub fn dump(program: &Program) -> String {
    let mut out = String::new();
    for stmt in &program.procs {
        dump_line(stmt, &mut out);
    }
    for stmt in &program.main {
        dump_line(stmt, &mut out);
    }
    out
}

/// Serialize a single statement (without the label prefix).
pub fn dump_stmt(stmt: &Stmt) -> String {
    let mut sink = Sink::new();
    stmt::print_stmt(stmt, &mut sink);
    sink.into_string()
}

/// Serialize a single expression.
pub fn dump_expr(expr: &basic_ir::Expr) -> String {
    let mut sink = Sink::new();
    expr::print_expr(expr, &mut sink);
    sink.into_string()
}

fn dump_line(stmt: &Stmt, out: &mut String) {
    let mut sink = Sink::new();
    sink.write_label(stmt.line);
    sink.raw(' ');
    stmt::print_stmt(stmt, &mut sink);
    out.push_str(sink.as_str());
    out.push('\n');
}
