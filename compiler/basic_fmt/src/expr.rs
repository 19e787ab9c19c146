//! Expression printing.
//!
//! Prefix notation keeps evaluation order explicit for nested trees. The
//! operator token table is indexed by the `BinaryOp` ordinal; the enum
//! order is load-bearing.

use basic_ir::{descriptor, BinaryOp, Expr, ExprKind, UnaryOp};

use crate::Sink;

fn print_dotted(path: &[String], sink: &mut Sink) {
    for (index, segment) in path.iter().enumerate() {
        if index > 0 {
            sink.raw('.');
        }
        sink.text(segment);
    }
}

fn print_args(args: &[Expr], sink: &mut Sink) {
    for arg in args {
        sink.raw(' ');
        print_expr(arg, sink);
    }
}

pub(crate) fn print_expr(expr: &Expr, sink: &mut Sink) {
    match &expr.kind {
        ExprKind::Int(value) => sink.int(*value),
        ExprKind::Float(value) => sink.float(*value),
        // The payload is printed verbatim: escapes were decoded by the
        // lexer and stay decoded in dumps.
        ExprKind::Str(value) => {
            sink.raw('"');
            sink.text(value);
            sink.raw('"');
        }
        ExprKind::Bool(value) => sink.text(if *value { "TRUE" } else { "FALSE" }),

        ExprKind::Var(name) => sink.text(name),

        ExprKind::Array { name, indices } => {
            sink.text(name);
            sink.raw('(');
            let mut first = true;
            for index in indices {
                if !first {
                    sink.raw(',');
                }
                first = false;
                print_expr(index, sink);
            }
            sink.raw(')');
        }

        ExprKind::Unary { op, operand } => {
            sink.raw('(');
            sink.text(match op {
                UnaryOp::LogicalNot => "NOT ",
                UnaryOp::Plus => "+ ",
                UnaryOp::Negate => "- ",
            });
            print_expr(operand, sink);
            sink.raw(')');
        }

        ExprKind::Binary { op, lhs, rhs } => {
            sink.raw('(');
            sink.text(BinaryOp::TOKENS[*op as usize]);
            sink.raw(' ');
            print_expr(lhs, sink);
            sink.raw(' ');
            print_expr(rhs, sink);
            sink.raw(')');
        }

        ExprKind::Builtin { builtin, args } => {
            sink.raw('(');
            sink.text(descriptor(*builtin).name);
            print_args(args, sink);
            sink.raw(')');
        }

        ExprKind::Call {
            callee,
            qualified,
            args,
        } => {
            sink.raw('(');
            if qualified.is_empty() {
                sink.text(callee);
            } else {
                print_dotted(qualified, sink);
            }
            print_args(args, sink);
            sink.raw(')');
        }

        ExprKind::LBound(name) => {
            sink.text("(LBOUND ");
            sink.text(name);
            sink.raw(')');
        }
        ExprKind::UBound(name) => {
            sink.text("(UBOUND ");
            sink.text(name);
            sink.raw(')');
        }

        ExprKind::New {
            class_name,
            qualified,
            args,
        } => {
            sink.text("(NEW ");
            if qualified.is_empty() {
                sink.text(class_name);
            } else {
                print_dotted(qualified, sink);
            }
            print_args(args, sink);
            sink.raw(')');
        }

        ExprKind::Me => sink.text("Me"),

        ExprKind::Member { base, member } => {
            sink.raw('(');
            print_expr(base, sink);
            sink.raw('.');
            sink.text(member);
            sink.raw(')');
        }

        ExprKind::MethodCall { base, method, args } => {
            sink.raw('(');
            print_expr(base, sink);
            sink.raw('.');
            sink.text(method);
            print_args(args, sink);
            sink.raw(')');
        }

        ExprKind::Is { value, type_name } => {
            sink.text("(IS ");
            print_expr(value, sink);
            sink.raw(' ');
            print_dotted(type_name, sink);
            sink.raw(')');
        }

        ExprKind::As { value, type_name } => {
            sink.text("(AS ");
            print_expr(value, sink);
            sink.raw(' ');
            print_dotted(type_name, sink);
            sink.raw(')');
        }

        ExprKind::AddressOf(name) => {
            sink.text("(ADDRESSOF ");
            sink.text(name);
            sink.raw(')');
        }
    }
}

/// Print an optional expression, falling back to the `<null>` marker.
pub(crate) fn print_opt_expr(expr: Option<&Expr>, sink: &mut Sink) {
    match expr {
        Some(expr) => print_expr(expr, sink),
        None => sink.write_null(),
    }
}
