//! Statement printing.
//!
//! The output mirrors the BASIC surface syntax closely enough for
//! debugging while staying explicit about implicit behaviour (channel
//! handling, suppressed newlines, mode ordinals).

use basic_ir::{
    Access, ClassDecl, DoCond, DoTestPos, ExitKind, Param, PrintChMode, PrintItem, PropertyDecl,
    ResumeMode, Stmt, StmtKind, Type,
};

use crate::expr::{print_expr, print_opt_expr};
use crate::Sink;

/// Space-separated parameter list with `()` markers on array parameters.
fn print_params(params: &[Param], sink: &mut Sink) {
    let mut first = true;
    for param in params {
        if !first {
            sink.raw(' ');
        }
        first = false;
        sink.text(&param.name);
        if param.is_array {
            sink.text("()");
        }
    }
}

fn print_qualified_name(name: Option<&str>, sink: &mut Sink) {
    sink.text(" qualifiedName: ");
    match name {
        Some(name) => sink.text(name),
        None => sink.write_null(),
    }
}

pub(crate) fn print_stmt(stmt: &Stmt, sink: &mut Sink) {
    match &stmt.kind {
        StmtKind::Label => sink.text("(LABEL)"),
        StmtKind::End => sink.text("(END)"),
        StmtKind::Cls => sink.text("(CLS)"),
        StmtKind::Beep => sink.text("(BEEP)"),

        StmtKind::Print { items } => {
            sink.text("(PRINT");
            for item in items {
                sink.raw(' ');
                match item {
                    PrintItem::Expr(expr) => print_expr(expr, sink),
                    PrintItem::Comma => sink.raw(','),
                    PrintItem::Semicolon => sink.raw(';'),
                }
            }
            sink.raw(')');
        }

        StmtKind::PrintCh {
            mode,
            channel,
            args,
            trailing_newline,
        } => {
            sink.text(match mode {
                PrintChMode::Print => "(PRINT#",
                PrintChMode::Write => "(WRITE#",
            });
            sink.channel_prefix();
            print_opt_expr(channel.as_ref(), sink);
            sink.args_prefix();
            let mut first = true;
            for arg in args {
                sink.separate(&mut first);
                print_expr(arg, sink);
            }
            sink.args_suffix();
            if !trailing_newline {
                sink.no_newline_tag();
            }
            sink.raw(')');
        }

        StmtKind::Input { prompt, vars } => {
            sink.text("(INPUT");
            let mut first = true;
            let mut item_prefix = |sink: &mut Sink| {
                if first {
                    sink.raw(' ');
                    first = false;
                } else {
                    sink.text(", ");
                }
            };
            if let Some(prompt) = prompt {
                item_prefix(sink);
                print_expr(prompt, sink);
            }
            for var in vars {
                item_prefix(sink);
                sink.text(var);
            }
            sink.raw(')');
        }

        StmtKind::InputCh { channel, targets } => {
            sink.text("(INPUT#");
            sink.channel_prefix();
            print_expr(channel, sink);
            sink.text(" target=");
            let mut first = true;
            for target in targets {
                sink.separate(&mut first);
                sink.text(target);
            }
            sink.raw(')');
        }

        StmtKind::LineInputCh { channel, target } => {
            sink.text("(LINE-INPUT#");
            sink.channel_prefix();
            print_opt_expr(channel.as_ref(), sink);
            sink.text(" target=");
            print_opt_expr(target.as_ref(), sink);
            sink.raw(')');
        }

        StmtKind::Open {
            mode,
            path,
            channel,
        } => {
            sink.text("(OPEN mode=");
            sink.text(mode.name());
            sink.raw('(');
            sink.int(*mode as i64);
            sink.text(") path=");
            print_opt_expr(path.as_ref(), sink);
            sink.channel_prefix();
            print_opt_expr(channel.as_ref(), sink);
            sink.raw(')');
        }

        StmtKind::Close { channel } => {
            sink.text("(CLOSE");
            sink.channel_prefix();
            print_opt_expr(channel.as_ref(), sink);
            sink.raw(')');
        }

        StmtKind::Seek { channel, position } => {
            sink.text("(SEEK");
            sink.channel_prefix();
            print_opt_expr(channel.as_ref(), sink);
            sink.text(" pos=");
            print_opt_expr(position.as_ref(), sink);
            sink.raw(')');
        }

        StmtKind::Let { target, value } => {
            sink.text("(LET ");
            print_expr(target, sink);
            sink.raw(' ');
            print_expr(value, sink);
            sink.raw(')');
        }

        StmtKind::Const { name, value, ty } => {
            sink.text("(CONST ");
            sink.text(name);
            sink.text(" = ");
            print_expr(value, sink);
            if *ty != Type::I64 {
                sink.text(" AS ");
                sink.text(ty.name());
            }
            sink.raw(')');
        }

        StmtKind::Dim {
            name,
            is_array,
            size,
            ty,
        } => {
            sink.text("(DIM ");
            sink.text(name);
            if *is_array {
                if let Some(size) = size {
                    sink.raw(' ');
                    print_expr(size, sink);
                }
                if *ty != Type::I64 {
                    sink.text(" AS ");
                    sink.text(ty.name());
                }
            } else {
                sink.text(" AS ");
                sink.text(ty.name());
            }
            sink.raw(')');
        }

        StmtKind::ReDim { name, size } => {
            sink.text("(REDIM ");
            sink.text(name);
            if let Some(size) = size {
                sink.raw(' ');
                print_expr(size, sink);
            }
            sink.raw(')');
        }

        StmtKind::Static { name, ty } => {
            sink.text("(STATIC ");
            sink.text(name);
            if *ty != Type::I64 {
                sink.text(" AS ");
                sink.text(ty.name());
            }
            sink.raw(')');
        }

        StmtKind::Shared { names } => {
            sink.text("(SHARED");
            for name in names {
                sink.raw(' ');
                sink.text(name);
            }
            sink.raw(')');
        }

        StmtKind::Swap { lhs, rhs } => {
            sink.text("(SWAP ");
            print_expr(lhs, sink);
            sink.raw(' ');
            print_expr(rhs, sink);
            sink.raw(')');
        }

        StmtKind::Randomize { seed } => {
            sink.text("(RANDOMIZE ");
            print_expr(seed, sink);
            sink.raw(')');
        }

        StmtKind::If {
            cond,
            then_branch,
            elseifs,
            else_branch,
        } => {
            sink.text("(IF ");
            print_expr(cond, sink);
            sink.text(" THEN ");
            print_stmt(then_branch, sink);
            for elseif in elseifs {
                sink.text(" ELSEIF ");
                print_expr(&elseif.cond, sink);
                sink.text(" THEN ");
                print_stmt(&elseif.then_branch, sink);
            }
            if let Some(else_branch) = else_branch {
                sink.text(" ELSE ");
                print_stmt(else_branch, sink);
            }
            sink.raw(')');
        }

        StmtKind::SelectCase {
            selector,
            arms,
            else_body,
        } => {
            sink.text("(SELECT CASE ");
            print_opt_expr(selector.as_ref(), sink);
            for arm in arms {
                sink.text(" (CASE");
                for label in &arm.labels {
                    sink.raw(' ');
                    sink.int(*label);
                }
                sink.raw(')');
                sink.numbered_body(&arm.body);
            }
            if !else_body.is_empty() {
                sink.text(" (CASE ELSE)");
                sink.numbered_body(else_body);
            }
            sink.raw(')');
        }

        StmtKind::While { cond, body } => {
            sink.text("(WHILE ");
            print_expr(cond, sink);
            sink.numbered_body(body);
        }

        StmtKind::Do {
            test_pos,
            cond_kind,
            cond,
            body,
        } => {
            sink.text("(DO ");
            sink.text(match test_pos {
                DoTestPos::Pre => "pre",
                DoTestPos::Post => "post",
            });
            sink.raw(' ');
            sink.text(match cond_kind {
                DoCond::None => "NONE",
                DoCond::While => "WHILE",
                DoCond::Until => "UNTIL",
            });
            if *cond_kind != DoCond::None {
                if let Some(cond) = cond {
                    sink.raw(' ');
                    print_expr(cond, sink);
                }
            }
            sink.numbered_body(body);
        }

        StmtKind::For {
            var,
            start,
            end,
            step,
            body,
        } => {
            sink.text("(FOR ");
            sink.text(var);
            sink.text(" = ");
            print_expr(start, sink);
            sink.text(" TO ");
            print_expr(end, sink);
            if let Some(step) = step {
                sink.text(" STEP ");
                print_expr(step, sink);
            }
            sink.numbered_body(body);
        }

        StmtKind::Next { var } => {
            sink.text("(NEXT ");
            sink.text(var);
            sink.raw(')');
        }

        StmtKind::Exit { kind } => {
            sink.text("(EXIT ");
            sink.text(match kind {
                ExitKind::For => "FOR",
                ExitKind::While => "WHILE",
                ExitKind::Do => "DO",
            });
            sink.raw(')');
        }

        StmtKind::Goto { target } => {
            sink.text("(GOTO ");
            sink.int(*target);
            sink.raw(')');
        }

        StmtKind::Gosub { target_line } => {
            sink.text("(GOSUB ");
            sink.int(*target_line);
            sink.raw(')');
        }

        StmtKind::Return {
            is_gosub_return,
            value,
        } => {
            sink.text("(RETURN");
            if *is_gosub_return {
                sink.text(" GOSUB");
            }
            if let Some(value) = value {
                sink.raw(' ');
                print_expr(value, sink);
            }
            sink.raw(')');
        }

        StmtKind::OnErrorGoto { target, to_zero } => {
            sink.text("(ON-ERROR GOTO ");
            if *to_zero {
                sink.raw('0');
            } else {
                sink.int(*target);
            }
            sink.raw(')');
        }

        StmtKind::Resume { mode, target } => {
            sink.text("(RESUME");
            match mode {
                ResumeMode::Same => {}
                ResumeMode::Next => sink.text(" NEXT"),
                ResumeMode::Label => {
                    sink.raw(' ');
                    sink.int(*target);
                }
            }
            sink.raw(')');
        }

        StmtKind::TryCatch {
            try_body,
            catch_var,
            catch_body,
        } => {
            sink.text("(TRY");
            sink.numbered_body(try_body);
            sink.text(" (CATCH");
            if let Some(var) = catch_var {
                sink.raw(' ');
                sink.text(var);
            }
            sink.raw(')');
            sink.numbered_body(catch_body);
            sink.raw(')');
        }

        StmtKind::Cursor { visible } => {
            sink.text("(CURSOR ");
            sink.text(if *visible { "ON" } else { "OFF" });
            sink.raw(')');
        }

        StmtKind::AltScreen { enabled } => {
            sink.text("(ALTSCREEN ");
            sink.text(if *enabled { "ON" } else { "OFF" });
            sink.raw(')');
        }

        StmtKind::Color { fg, bg } => {
            sink.text("(COLOR ");
            print_opt_expr(fg.as_ref(), sink);
            sink.raw(' ');
            print_opt_expr(bg.as_ref(), sink);
            sink.raw(')');
        }

        StmtKind::Locate { row, col } => {
            sink.text("(LOCATE ");
            print_opt_expr(row.as_ref(), sink);
            if let Some(col) = col {
                sink.raw(' ');
                print_expr(col, sink);
            }
            sink.raw(')');
        }

        StmtKind::Sleep { ms } => {
            sink.text("(SLEEP ");
            print_opt_expr(ms.as_ref(), sink);
            sink.raw(')');
        }

        StmtKind::Function(decl) => {
            sink.text("(FUNCTION ");
            sink.text(&decl.name);
            print_qualified_name(decl.qualified_name.as_deref(), sink);
            sink.text(" RET ");
            sink.text(decl.ret.name());
            sink.text(" (");
            print_params(&decl.params, sink);
            sink.raw(')');
            if decl.explicit_ret != basic_ir::DeclType::Unknown
                && decl.explicit_ret != basic_ir::DeclType::Void
            {
                sink.text(" AS ");
                sink.text(decl.explicit_ret.name());
            }
            sink.numbered_body(&decl.body);
        }

        StmtKind::Sub(decl) => {
            sink.text("(SUB ");
            sink.text(&decl.name);
            print_qualified_name(decl.qualified_name.as_deref(), sink);
            sink.text(" (");
            print_params(&decl.params, sink);
            sink.raw(')');
            sink.numbered_body(&decl.body);
        }

        StmtKind::Constructor(decl) => {
            sink.text("(CONSTRUCTOR");
            if decl.is_static {
                sink.text(" STATIC");
            }
            sink.text(" (");
            print_params(&decl.params, sink);
            sink.raw(')');
            sink.numbered_body(&decl.body);
        }

        StmtKind::Destructor(decl) => {
            sink.text("(DESTRUCTOR");
            sink.numbered_body(&decl.body);
        }

        StmtKind::Method(decl) => {
            sink.text("(METHOD ");
            if decl.is_static {
                sink.text("STATIC ");
            }
            sink.text(&decl.name);
            if let Some(ret) = decl.ret {
                sink.text(" RET ");
                sink.text(ret.name());
            }
            sink.text(" (");
            print_params(&decl.params, sink);
            sink.raw(')');
            sink.numbered_body(&decl.body);
        }

        StmtKind::Property(decl) => print_property(decl, sink),

        StmtKind::Class(decl) => print_class(decl, sink),

        StmtKind::TypeDecl(decl) => {
            sink.text("(TYPE ");
            sink.text(&decl.name);
            if !decl.fields.is_empty() {
                sink.text(" (FIELDS");
                for field in &decl.fields {
                    sink.raw(' ');
                    sink.text(&field.name);
                    sink.raw(':');
                    sink.text(field.ty.name());
                }
                sink.raw(')');
            }
            sink.raw(')');
        }

        StmtKind::Interface(decl) => {
            sink.text("(INTERFACE ");
            let mut first = true;
            for segment in &decl.qualified_name {
                if !first {
                    sink.raw('.');
                }
                first = false;
                sink.text(segment);
            }
            sink.numbered_body(&decl.members);
        }

        StmtKind::Using { alias, path } => {
            sink.text("(USING ");
            if let Some(alias) = alias {
                sink.text(alias);
                sink.text(" = ");
            }
            let mut first = true;
            for segment in path {
                if !first {
                    sink.raw('.');
                }
                first = false;
                sink.text(segment);
            }
            sink.raw(')');
        }

        StmtKind::Delete { target } => {
            sink.text("(DELETE ");
            print_expr(target, sink);
            sink.raw(')');
        }

        StmtKind::StmtList(stmts) => {
            sink.text("(SEQ");
            for stmt in stmts {
                sink.raw(' ');
                print_stmt(stmt, sink);
            }
            sink.raw(')');
        }

        StmtKind::CallStmt { call } => {
            sink.text("(CALL");
            if let Some(call) = call {
                sink.raw(' ');
                print_expr(call, sink);
            }
            sink.raw(')');
        }
    }
}

fn print_class(decl: &ClassDecl, sink: &mut Sink) {
    sink.text("(CLASS ");
    sink.text(&decl.name);
    print_qualified_name(decl.qualified_name.as_deref(), sink);
    if !decl.fields.is_empty() {
        sink.text(" (FIELDS");
        for field in &decl.fields {
            sink.raw(' ');
            if field.is_static {
                sink.text("STATIC ");
            }
            sink.text(&field.name);
            sink.raw(':');
            sink.text(field.ty.name());
        }
        sink.raw(')');
    }
    if !decl.implements.is_empty() {
        sink.text(" (IMPLEMENTS");
        for path in &decl.implements {
            sink.raw(' ');
            for (index, segment) in path.iter().enumerate() {
                if index > 0 {
                    sink.raw('.');
                }
                sink.text(segment);
            }
        }
        sink.raw(')');
    }
    sink.numbered_body(&decl.members);
}

fn print_property(decl: &PropertyDecl, sink: &mut Sink) {
    sink.text("(PROPERTY ");
    if decl.is_static {
        sink.text("STATIC ");
    }
    sink.text(&decl.name);
    sink.raw(':');
    sink.text(decl.ty.name());
    if let Some(getter) = &decl.get {
        sink.text(" (GET");
        if getter.access != decl.access {
            sink.raw(' ');
            sink.text(access_name(getter.access));
        }
        sink.numbered_body(&getter.body);
        sink.raw(')');
    }
    if let Some(setter) = &decl.set {
        sink.text(" (SET");
        if setter.access != decl.access {
            sink.raw(' ');
            sink.text(access_name(setter.access));
        }
        sink.text(" param:");
        sink.text(&setter.param_name);
        sink.numbered_body(&setter.body);
        sink.raw(')');
    }
    sink.raw(')');
}

fn access_name(access: Access) -> &'static str {
    match access {
        Access::Public => "PUBLIC",
        Access::Private => "PRIVATE",
    }
}
