//! The folding pass: a statement-level walk that rewrites expressions in
//! their owning slots.

use basic_ir::{BinaryOp, Expr, ExprKind, PrintItem, Program, Span, Stmt, StmtKind};
use tracing::trace;

use crate::arith;
use crate::builtins;
use crate::logic;
use crate::numeric::as_numeric;

/// Fold constants across an entire program, in place.
pub fn fold_constants(program: &mut Program) {
    for decl in &mut program.procs {
        fold_stmt(decl);
    }
    for stmt in &mut program.main {
        fold_stmt(stmt);
    }
}

fn replace(expr: &mut Expr, kind: ExprKind, span: Span) {
    trace!(?span, "folded expression");
    expr.kind = kind;
    expr.span = span;
}

fn fold_expr(expr: &mut Expr) {
    match &mut expr.kind {
        // Literals and runtime-only references are already canonical.
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Var(_)
        | ExprKind::LBound(_)
        | ExprKind::UBound(_)
        | ExprKind::Me
        | ExprKind::AddressOf(_) => {}

        ExprKind::Array { indices, .. } => {
            for index in indices {
                fold_expr(index);
            }
        }

        ExprKind::Unary { .. } => fold_unary(expr),
        ExprKind::Binary { .. } => fold_binary(expr),

        ExprKind::Builtin { .. } => fold_builtin_call(expr),

        // User calls may have side effects and are never folded.
        ExprKind::Call { .. } => {}

        ExprKind::New { args, .. } => {
            for arg in args {
                fold_expr(arg);
            }
        }
        ExprKind::Member { base, .. } => fold_expr(base),
        ExprKind::MethodCall { base, args, .. } => {
            fold_expr(base);
            for arg in args {
                fold_expr(arg);
            }
        }
        ExprKind::Is { value, .. } | ExprKind::As { value, .. } => fold_expr(value),
    }
}

fn fold_builtin_call(expr: &mut Expr) {
    let span = expr.span;
    let ExprKind::Builtin { builtin, args } = &mut expr.kind else {
        return;
    };
    let builtin = *builtin;
    for arg in args.iter_mut() {
        fold_expr(arg);
    }
    let folded = builtins::fold_builtin(builtin, args);
    if let Some(kind) = folded {
        replace(expr, kind, span);
    }
}

fn fold_unary(expr: &mut Expr) {
    let span = expr.span;
    let ExprKind::Unary { op, operand } = &mut expr.kind else {
        return;
    };
    let op = *op;
    fold_expr(operand);

    if op == basic_ir::UnaryOp::LogicalNot {
        if let Some(kind) = logic::fold_logical_not(operand) {
            replace(expr, kind, span);
        }
        return;
    }
    if let Some(value) = as_numeric(operand) {
        if let Some(folded) = arith::fold_unary_arith(op, value) {
            let kind = if folded.is_float {
                ExprKind::Float(folded.f)
            } else {
                ExprKind::Int(folded.i)
            };
            replace(expr, kind, span);
        }
    }
}

fn fold_binary(expr: &mut Expr) {
    let span = expr.span;
    let ExprKind::Binary { op, lhs, rhs } = &mut expr.kind else {
        return;
    };
    let op = *op;
    fold_expr(lhs);

    // Short-circuit handling runs before the right-hand side is touched:
    // a decided LHS must not fold (or even traverse) the RHS.
    if let ExprKind::Bool(lhs_value) = lhs.kind {
        if let Some(decided) = logic::try_short_circuit(op, lhs_value) {
            replace(expr, ExprKind::Bool(decided), span);
            return;
        }
        if op.is_short_circuit() {
            // TRUE ANDALSO e / FALSE ORELSE e: the result is e itself.
            fold_expr(rhs);
            if let Some(kind) = logic::fold_logical_binary(lhs, op, rhs) {
                replace(expr, kind, span);
            } else {
                let rhs = std::mem::replace(rhs, Box::new(Expr::int(0, Span::DUMMY)));
                *expr = *rhs;
            }
            return;
        }
    }

    fold_expr(rhs);

    if let Some(kind) = logic::fold_logical_binary(lhs, op, rhs) {
        replace(expr, kind, span);
        return;
    }
    if let Some(kind) = fold_binary_literal(op, lhs, rhs) {
        replace(expr, kind, span);
    }
}

/// Fold a binary operation over two literal operands: numeric arithmetic
/// and comparisons, string concatenation and (in)equality. `^` and ordered
/// string comparisons are never folded.
fn fold_binary_literal(op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Option<ExprKind> {
    if let (Some(l), Some(r)) = (as_numeric(lhs), as_numeric(rhs)) {
        if op.is_comparison() {
            return arith::fold_compare(op, l, r).map(|n| ExprKind::Int(n.i));
        }
        return arith::fold_binary_arith(op, l, r).map(|n| {
            if n.is_float {
                ExprKind::Float(n.f)
            } else {
                ExprKind::Int(n.i)
            }
        });
    }
    if matches!(lhs.kind, ExprKind::Str(_)) && matches!(rhs.kind, ExprKind::Str(_)) {
        return match op {
            BinaryOp::Add => crate::strings::fold_concat(lhs, rhs),
            BinaryOp::Eq => crate::strings::fold_str_eq(lhs, rhs, false),
            BinaryOp::Ne => crate::strings::fold_str_eq(lhs, rhs, true),
            _ => None,
        };
    }
    None
}

fn fold_opt(expr: &mut Option<Expr>) {
    if let Some(expr) = expr {
        fold_expr(expr);
    }
}

fn fold_stmts(stmts: &mut [Stmt]) {
    for stmt in stmts {
        fold_stmt(stmt);
    }
}

fn fold_stmt(stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Label
        | StmtKind::End
        | StmtKind::Cls
        | StmtKind::Beep
        | StmtKind::Cursor { .. }
        | StmtKind::AltScreen { .. }
        | StmtKind::Next { .. }
        | StmtKind::Exit { .. }
        | StmtKind::Goto { .. }
        | StmtKind::Gosub { .. }
        | StmtKind::OnErrorGoto { .. }
        | StmtKind::Resume { .. }
        | StmtKind::Shared { .. }
        | StmtKind::Static { .. }
        | StmtKind::Using { .. }
        | StmtKind::InputCh { .. } => {}

        StmtKind::Print { items } => {
            for item in items {
                if let PrintItem::Expr(expr) = item {
                    fold_expr(expr);
                }
            }
        }
        StmtKind::PrintCh { channel, args, .. } => {
            fold_opt(channel);
            for arg in args {
                fold_expr(arg);
            }
        }
        StmtKind::Input { prompt, .. } => fold_opt(prompt),
        StmtKind::LineInputCh { channel, target } => {
            fold_opt(channel);
            fold_opt(target);
        }
        StmtKind::Open { path, channel, .. } => {
            fold_opt(path);
            fold_opt(channel);
        }
        StmtKind::Close { channel } => fold_opt(channel),
        StmtKind::Seek { channel, position } => {
            fold_opt(channel);
            fold_opt(position);
        }

        StmtKind::Let { target, value } => {
            fold_expr(target);
            fold_expr(value);
        }
        StmtKind::Const { value, .. } => fold_expr(value),
        StmtKind::Dim { size, .. } => fold_opt(size),
        StmtKind::ReDim { size, .. } => fold_opt(size),
        StmtKind::Swap { lhs, rhs } => {
            fold_expr(lhs);
            fold_expr(rhs);
        }

        StmtKind::If {
            cond,
            then_branch,
            elseifs,
            else_branch,
        } => {
            fold_expr(cond);
            fold_stmt(then_branch);
            for elseif in elseifs {
                fold_expr(&mut elseif.cond);
                fold_stmt(&mut elseif.then_branch);
            }
            if let Some(else_branch) = else_branch {
                fold_stmt(else_branch);
            }
        }
        StmtKind::SelectCase {
            selector,
            arms,
            else_body,
        } => {
            fold_opt(selector);
            for arm in arms {
                fold_stmts(&mut arm.body);
            }
            fold_stmts(else_body);
        }
        StmtKind::While { cond, body } => {
            fold_expr(cond);
            fold_stmts(body);
        }
        StmtKind::Do { cond, body, .. } => {
            fold_opt(cond);
            fold_stmts(body);
        }
        StmtKind::For {
            start,
            end,
            step,
            body,
            ..
        } => {
            fold_expr(start);
            fold_expr(end);
            fold_opt(step);
            fold_stmts(body);
        }
        StmtKind::Return { value, .. } => fold_opt(value),
        StmtKind::TryCatch {
            try_body,
            catch_body,
            ..
        } => {
            fold_stmts(try_body);
            fold_stmts(catch_body);
        }

        StmtKind::Color { fg, bg } => {
            fold_opt(fg);
            fold_opt(bg);
        }
        StmtKind::Locate { row, col } => {
            fold_opt(row);
            fold_opt(col);
        }
        StmtKind::Sleep { ms } => fold_opt(ms),
        StmtKind::Randomize { seed } => fold_expr(seed),
        StmtKind::Delete { target } => fold_expr(target),

        StmtKind::Function(decl) => fold_stmts(&mut decl.body),
        StmtKind::Sub(decl) => fold_stmts(&mut decl.body),
        StmtKind::Constructor(decl) => fold_stmts(&mut decl.body),
        StmtKind::Destructor(decl) => fold_stmts(&mut decl.body),
        StmtKind::Method(decl) => fold_stmts(&mut decl.body),
        StmtKind::Property(decl) => {
            if let Some(getter) = &mut decl.get {
                fold_stmts(&mut getter.body);
            }
            if let Some(setter) = &mut decl.set {
                fold_stmts(&mut setter.body);
            }
        }
        StmtKind::Class(decl) => fold_stmts(&mut decl.members),
        // Pure shape declarations carry no foldable expressions.
        StmtKind::TypeDecl(_) | StmtKind::Interface(_) => {}

        StmtKind::StmtList(stmts) => fold_stmts(stmts),
        StmtKind::CallStmt { call } => {
            // The call itself is never folded, but its arguments are.
            if let Some(call) = call {
                if let ExprKind::Call { args, .. } | ExprKind::MethodCall { args, .. } =
                    &mut call.kind
                {
                    for arg in args {
                        fold_expr(arg);
                    }
                }
            }
        }
    }
}
