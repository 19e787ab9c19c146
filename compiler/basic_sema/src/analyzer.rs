//! The statement-level analysis walk.

use basic_diagnostic::{DiagnosticEmitter, ErrorCode};
use basic_ir::{ClassDecl, Expr, PrintItem, Program, Span, Stmt, StmtKind, Type};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::scope::{Binding, ScopeStack};
use crate::{Analysis, ParamInfo, ProcSignature, VarInfo};

/// Per-class context while analyzing class members.
struct ClassCtx {
    fields: FxHashMap<String, Type>,
}

pub(crate) struct Analyzer<'e> {
    emitter: &'e mut DiagnosticEmitter,
    file_id: u32,
    scopes: ScopeStack,
    analysis: Analysis,
    /// Bindings collected from exited block scopes of the current
    /// procedure.
    current_locals: Vec<Binding>,
    /// Return type context: `None` outside procedures, `Some(None)` in a
    /// SUB, `Some(Some(ty))` in a FUNCTION.
    current_ret: Option<Option<Type>>,
    class_ctx: Option<ClassCtx>,
}

impl<'e> Analyzer<'e> {
    pub(crate) fn new(emitter: &'e mut DiagnosticEmitter, file_id: u32) -> Self {
        Analyzer {
            emitter,
            file_id,
            scopes: ScopeStack::new(),
            analysis: Analysis::default(),
            current_locals: Vec::new(),
            current_ret: None,
            class_ctx: None,
        }
    }

    pub(crate) fn run(mut self, program: &mut Program) -> Analysis {
        self.collect_signatures(program);
        for stmt in &mut program.main {
            self.analyze_stmt(stmt);
        }
        // Block-scope locals of the main body belong to the program table.
        for binding in std::mem::take(&mut self.current_locals) {
            self.analysis.program_vars.insert(
                binding.unique,
                VarInfo {
                    ty: binding.ty,
                    is_array: binding.is_array,
                    is_shared: false,
                },
            );
        }
        for decl in &mut program.procs {
            self.analyze_stmt(decl);
        }
        // Drain the program scope into the published symbol table.
        for binding in self.scopes.exit() {
            self.analysis.program_vars.insert(
                binding.unique,
                VarInfo {
                    ty: binding.ty,
                    is_array: binding.is_array,
                    is_shared: false,
                },
            );
        }
        debug!(
            globals = self.analysis.program_vars.len(),
            procs = self.analysis.procs.len(),
            "semantic analysis complete"
        );
        self.analysis
    }

    pub(crate) fn error(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        self.emitter.error(code, self.file_id, span, message);
    }

    pub(crate) fn in_class(&self) -> bool {
        self.class_ctx.is_some()
    }

    pub(crate) fn proc_exists(&self, name: &str) -> bool {
        self.analysis.procs.contains_key(name)
    }

    pub(crate) fn signature(&self, name: &str) -> Option<ProcSignature> {
        self.analysis.procs.get(name).cloned()
    }

    pub(crate) fn class_field_type(&mut self, member: &str, span: Span) -> Option<Type> {
        let ty = self
            .class_ctx
            .as_ref()
            .and_then(|ctx| ctx.fields.get(member).copied());
        if ty.is_none() {
            let message = format!("unknown field '{member}' on ME");
            self.error(ErrorCode::B2002, span, message);
        }
        ty
    }

    /// Sigil-implied type of an identifier.
    fn sigil_type(name: &str) -> Type {
        match name.as_bytes().last() {
            Some(b'$') => Type::Str,
            Some(b'%') => Type::I64,
            Some(b'!') | Some(b'#') => Type::F64,
            _ => Type::I64,
        }
    }

    /// Resolve a scalar reference, creating the binding on first sight
    /// (classic BASIC implicit declaration). Rewrites the name in place.
    pub(crate) fn resolve_var(&mut self, name: &mut String, span: Span) -> Type {
        if let Some(binding) = self.scopes.lookup(name) {
            if binding.is_array {
                let message = format!("array '{name}' used without a subscript");
                let ty = binding.ty;
                self.error(ErrorCode::B2003, span, message);
                return ty;
            }
            let (unique, ty) = (binding.unique.clone(), binding.ty);
            *name = unique;
            return ty;
        }
        let ty = Self::sigil_type(name);
        match self.scopes.declare(name, ty, false) {
            Some(unique) => *name = unique,
            None => {}
        }
        ty
    }

    /// Resolve an array reference. Arrays must be declared with `DIM`
    /// before use; there is no implicit array creation.
    pub(crate) fn resolve_array(&mut self, name: &mut String, span: Span) -> Option<Type> {
        match self.scopes.lookup(name) {
            Some(binding) if binding.is_array => {
                let (unique, ty) = (binding.unique.clone(), binding.ty);
                *name = unique;
                Some(ty)
            }
            Some(_) => {
                let message = format!("'{name}' is not an array");
                self.error(ErrorCode::B2003, span, message);
                None
            }
            None => {
                let message = format!("array '{name}' used before DIM");
                self.error(ErrorCode::B2003, span, message);
                None
            }
        }
    }

    /// Declare a binding, reporting duplicates, and rewrite `name` to the
    /// unique form.
    fn declare(&mut self, name: &mut String, ty: Type, is_array: bool, span: Span) {
        match self.scopes.declare(name, ty, is_array) {
            Some(unique) => *name = unique,
            None => {
                let message = format!("duplicate declaration of '{name}'");
                self.error(ErrorCode::B2007, span, message);
            }
        }
    }

    /// Pre-collect procedure signatures so calls ahead of the declaration
    /// resolve.
    fn collect_signatures(&mut self, program: &Program) {
        for stmt in &program.procs {
            match &stmt.kind {
                StmtKind::Function(decl) => {
                    let sig = ProcSignature {
                        params: decl
                            .params
                            .iter()
                            .map(|p| ParamInfo {
                                name: p.name.clone(),
                                ty: Self::sigil_type(&p.name),
                                is_array: p.is_array,
                            })
                            .collect(),
                        ret: Some(decl.ret),
                    };
                    self.insert_signature(&decl.name, sig, stmt.span);
                }
                StmtKind::Sub(decl) => {
                    let sig = ProcSignature {
                        params: decl
                            .params
                            .iter()
                            .map(|p| ParamInfo {
                                name: p.name.clone(),
                                ty: Self::sigil_type(&p.name),
                                is_array: p.is_array,
                            })
                            .collect(),
                        ret: None,
                    };
                    self.insert_signature(&decl.name, sig, stmt.span);
                }
                _ => {}
            }
        }
    }

    fn insert_signature(&mut self, name: &str, sig: ProcSignature, span: Span) {
        if self.analysis.procs.insert(name.to_string(), sig).is_some() {
            let message = format!("duplicate declaration of procedure '{name}'");
            self.error(ErrorCode::B2007, span, message);
        }
    }

    fn analyze_opt(&mut self, expr: &mut Option<Expr>) -> Option<Type> {
        expr.as_mut().and_then(|e| self.analyze_expr(e))
    }

    fn analyze_body(&mut self, body: &mut [Stmt]) {
        for stmt in body {
            self.analyze_stmt(stmt);
        }
    }

    /// Analyze a block that opens its own local scope.
    fn analyze_block_scope(&mut self, body: &mut [Stmt]) {
        self.scopes.enter_block();
        self.analyze_body(body);
        let bindings = self.scopes.exit();
        self.current_locals.extend(bindings);
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::Label
            | StmtKind::End
            | StmtKind::Cls
            | StmtKind::Beep
            | StmtKind::Cursor { .. }
            | StmtKind::AltScreen { .. }
            | StmtKind::Exit { .. }
            | StmtKind::Goto { .. }
            | StmtKind::Gosub { .. }
            | StmtKind::OnErrorGoto { .. }
            | StmtKind::Resume { .. }
            | StmtKind::Using { .. }
            | StmtKind::TypeDecl(_)
            | StmtKind::Interface(_) => {}

            StmtKind::Print { items } => {
                for item in items {
                    if let PrintItem::Expr(expr) = item {
                        let _ = self.analyze_expr(expr);
                    }
                }
            }
            StmtKind::PrintCh { channel, args, .. } => {
                let ty = self.analyze_opt(channel);
                if let Some(chan) = channel {
                    self.require_numeric(ty, chan.span, "channel");
                }
                for arg in args {
                    let _ = self.analyze_expr(arg);
                }
            }
            StmtKind::Input { prompt, vars } => {
                let _ = self.analyze_opt(prompt);
                for var in vars {
                    let _ = self.resolve_var(var, span);
                }
            }
            StmtKind::InputCh { channel, targets } => {
                let ty = self.analyze_expr(channel);
                self.require_numeric(ty, channel.span, "channel");
                for target in targets {
                    let _ = self.resolve_var(target, span);
                }
            }
            StmtKind::LineInputCh { channel, target } => {
                let ty = self.analyze_opt(channel);
                if let Some(chan) = channel {
                    self.require_numeric(ty, chan.span, "channel");
                }
                let _ = self.analyze_opt(target);
            }
            StmtKind::Open { path, channel, .. } => {
                if let Some(path) = path {
                    let ty = self.analyze_expr(path);
                    if ty.is_some() && ty != Some(Type::Str) {
                        self.error(
                            ErrorCode::B2001,
                            path.span,
                            "numeric used where string expected",
                        );
                    }
                }
                let ty = self.analyze_opt(channel);
                if let Some(chan) = channel {
                    self.require_numeric(ty, chan.span, "channel");
                }
            }
            StmtKind::Close { channel } => {
                let ty = self.analyze_opt(channel);
                if let Some(chan) = channel {
                    self.require_numeric(ty, chan.span, "channel");
                }
            }
            StmtKind::Seek { channel, position } => {
                let ty = self.analyze_opt(channel);
                if let Some(chan) = channel {
                    self.require_numeric(ty, chan.span, "channel");
                }
                let ty = self.analyze_opt(position);
                if let Some(pos) = position {
                    self.require_numeric(ty, pos.span, "SEEK position");
                }
            }

            StmtKind::Let { target, value } => {
                let target_ty = self.analyze_expr(target);
                let value_ty = self.analyze_expr(value);
                self.check_assign(target_ty, value_ty, value.span);
            }
            StmtKind::Const { name, value, ty } => {
                let value_ty = self.analyze_expr(value);
                let inferred = value_ty.unwrap_or_else(|| Self::sigil_type(name));
                *ty = inferred;
                self.declare(name, inferred, false, span);
            }
            StmtKind::Dim {
                name,
                is_array,
                size,
                ty,
            } => {
                if let Some(size) = size {
                    let size_ty = self.analyze_expr(size);
                    self.require_numeric(size_ty, size.span, "DIM size");
                }
                let declared_ty = *ty;
                let array = *is_array;
                self.declare(name, declared_ty, array, span);
            }
            StmtKind::ReDim { name, size } => {
                if let Some(size) = size {
                    let size_ty = self.analyze_expr(size);
                    self.require_numeric(size_ty, size.span, "REDIM size");
                }
                let _ = self.resolve_array(name, span);
            }
            StmtKind::Static { name, ty } => {
                let declared_ty = *ty;
                self.declare(name, declared_ty, false, span);
            }
            StmtKind::Shared { names } => {
                for name in names {
                    let (ty, is_array) = match self.scopes.lookup_program(name) {
                        Some(binding) => (binding.ty, binding.is_array),
                        None => {
                            let ty = Self::sigil_type(name);
                            self.scopes.declare_program(name, ty, false);
                            (ty, false)
                        }
                    };
                    self.scopes.declare_shared(name, ty, is_array);
                }
            }
            StmtKind::Swap { lhs, rhs } => {
                let lt = self.analyze_expr(lhs);
                let rt = self.analyze_expr(rhs);
                if let (Some(lt), Some(rt)) = (lt, rt) {
                    if (lt == Type::Str) != (rt == Type::Str) {
                        self.error(
                            ErrorCode::B2001,
                            span,
                            "SWAP mixes string and numeric operands",
                        );
                    }
                }
            }

            StmtKind::If {
                cond,
                then_branch,
                elseifs,
                else_branch,
            } => {
                let ty = self.analyze_expr(cond);
                self.require_numeric(ty, cond.span, "IF condition");
                self.analyze_stmt(then_branch);
                for elseif in elseifs {
                    let ty = self.analyze_expr(&mut elseif.cond);
                    self.require_numeric(ty, elseif.cond.span, "ELSEIF condition");
                    self.analyze_stmt(&mut elseif.then_branch);
                }
                if let Some(else_branch) = else_branch {
                    self.analyze_stmt(else_branch);
                }
            }
            StmtKind::SelectCase {
                selector,
                arms,
                else_body,
            } => {
                let ty = self.analyze_opt(selector);
                if let Some(sel) = selector {
                    self.require_numeric(ty, sel.span, "SELECT CASE selector");
                }
                for arm in arms {
                    self.analyze_block_scope(&mut arm.body);
                }
                self.analyze_block_scope(else_body);
            }
            StmtKind::While { cond, body } => {
                let ty = self.analyze_expr(cond);
                self.require_numeric(ty, cond.span, "WHILE condition");
                self.analyze_body(body);
            }
            StmtKind::Do { cond, body, .. } => {
                let ty = self.analyze_opt(cond);
                if let Some(cond) = cond {
                    self.require_numeric(ty, cond.span, "DO condition");
                }
                self.analyze_body(body);
            }
            StmtKind::For {
                var,
                start,
                end,
                step,
                body,
            } => {
                let var_ty = self.resolve_var(var, span);
                if var_ty == Type::Str {
                    self.error(
                        ErrorCode::B2001,
                        span,
                        "string used where numeric expected in FOR variable",
                    );
                }
                let ty = self.analyze_expr(start);
                self.require_numeric(ty, start.span, "FOR start");
                let ty = self.analyze_expr(end);
                self.require_numeric(ty, end.span, "FOR bound");
                if let Some(step) = step {
                    let ty = self.analyze_expr(step);
                    self.require_numeric(ty, step.span, "FOR step");
                }
                self.analyze_body(body);
            }
            StmtKind::Next { var } => {
                if !var.is_empty() {
                    let _ = self.resolve_var(var, span);
                }
            }
            StmtKind::Return { value, .. } => {
                let value_ty = self.analyze_opt(value);
                match (self.current_ret, value_ty) {
                    (Some(Some(ret)), Some(found)) => {
                        if (ret == Type::Str) != (found == Type::Str) {
                            self.error(
                                ErrorCode::B2006,
                                span,
                                "RETURN value type does not match the function's return type",
                            );
                        }
                    }
                    (Some(None), Some(_)) => {
                        self.error(ErrorCode::B2006, span, "SUB cannot return a value");
                    }
                    _ => {}
                }
            }
            StmtKind::TryCatch {
                try_body,
                catch_var,
                catch_body,
            } => {
                self.analyze_body(try_body);
                self.scopes.enter_block();
                if let Some(var) = catch_var {
                    match self.scopes.declare(var, Type::I64, false) {
                        Some(unique) => *var = unique,
                        None => {}
                    }
                }
                self.analyze_body(catch_body);
                let bindings = self.scopes.exit();
                self.current_locals.extend(bindings);
            }

            StmtKind::Color { fg, bg } => {
                let ty = self.analyze_opt(fg);
                if let Some(fg) = fg {
                    self.require_numeric(ty, fg.span, "COLOR");
                }
                let ty = self.analyze_opt(bg);
                if let Some(bg) = bg {
                    self.require_numeric(ty, bg.span, "COLOR");
                }
            }
            StmtKind::Locate { row, col } => {
                let ty = self.analyze_opt(row);
                if let Some(row) = row {
                    self.require_numeric(ty, row.span, "LOCATE");
                }
                let ty = self.analyze_opt(col);
                if let Some(col) = col {
                    self.require_numeric(ty, col.span, "LOCATE");
                }
            }
            StmtKind::Sleep { ms } => {
                let ty = self.analyze_opt(ms);
                if let Some(ms) = ms {
                    self.require_numeric(ty, ms.span, "SLEEP");
                }
            }
            StmtKind::Randomize { seed } => {
                let ty = self.analyze_expr(seed);
                self.require_numeric(ty, seed.span, "RANDOMIZE seed");
            }
            StmtKind::Delete { target } => {
                let _ = self.analyze_expr(target);
            }

            StmtKind::Function(decl) => {
                self.scopes.enter_proc();
                for param in &mut decl.params {
                    let ty = Self::sigil_type(&param.name);
                    let is_array = param.is_array;
                    match self.scopes.declare(&param.name, ty, is_array) {
                        Some(unique) => param.name = unique,
                        None => {}
                    }
                }
                let prev_ret = self.current_ret.replace(Some(decl.ret));
                self.analyze_body(&mut decl.body);
                self.current_ret = prev_ret;
                self.finish_proc(&decl.name);
            }
            StmtKind::Sub(decl) => {
                self.scopes.enter_proc();
                for param in &mut decl.params {
                    let ty = Self::sigil_type(&param.name);
                    let is_array = param.is_array;
                    match self.scopes.declare(&param.name, ty, is_array) {
                        Some(unique) => param.name = unique,
                        None => {}
                    }
                }
                let prev_ret = self.current_ret.replace(None);
                self.analyze_body(&mut decl.body);
                self.current_ret = prev_ret;
                self.finish_proc(&decl.name);
            }

            StmtKind::Class(decl) => self.analyze_class(decl),

            StmtKind::Constructor(decl) => {
                self.analyze_member_body(&mut decl.params, &mut decl.body, None);
            }
            StmtKind::Destructor(decl) => {
                let mut no_params = Vec::new();
                self.analyze_member_body(&mut no_params, &mut decl.body, None);
            }
            StmtKind::Method(decl) => {
                let ret = decl.ret;
                self.analyze_member_body(&mut decl.params, &mut decl.body, Some(ret));
            }
            StmtKind::Property(decl) => {
                let ty = decl.ty;
                if let Some(getter) = &mut decl.get {
                    let mut no_params = Vec::new();
                    self.analyze_member_body(&mut no_params, &mut getter.body, Some(Some(ty)));
                }
                if let Some(setter) = &mut decl.set {
                    let mut params = vec![basic_ir::Param {
                        name: std::mem::take(&mut setter.param_name),
                        is_array: false,
                    }];
                    self.analyze_member_body(&mut params, &mut setter.body, Some(None));
                    setter.param_name = params.pop().map(|p| p.name).unwrap_or_default();
                }
            }

            StmtKind::StmtList(stmts) => self.analyze_body(stmts),
            StmtKind::CallStmt { call } => {
                if let Some(call) = call {
                    let _ = self.analyze_expr(call);
                }
            }
        }
    }

    /// Shared scope handling for class member bodies (constructors,
    /// destructors, methods, property getters).
    fn analyze_member_body(
        &mut self,
        params: &mut [basic_ir::Param],
        body: &mut Vec<Stmt>,
        ret: Option<Option<Type>>,
    ) {
        self.scopes.enter_proc();
        for param in params {
            if param.name.is_empty() {
                continue;
            }
            let ty = Self::sigil_type(&param.name);
            let is_array = param.is_array;
            match self.scopes.declare(&param.name, ty, is_array) {
                Some(unique) => param.name = unique,
                None => {}
            }
        }
        let locals_mark = self.current_locals.len();
        let prev_ret = std::mem::replace(&mut self.current_ret, ret);
        self.analyze_body(body);
        self.current_ret = prev_ret;
        // Member locals are method-scoped; they are not published in the
        // per-procedure tables.
        self.current_locals.truncate(locals_mark);
        let _ = self.scopes.exit();
    }

    /// Close the current procedure scope and publish its locals.
    fn finish_proc(&mut self, name: &str) {
        let mut locals = std::mem::take(&mut self.current_locals);
        locals.extend(self.scopes.exit());
        let vars: FxHashMap<String, VarInfo> = locals
            .into_iter()
            .filter(|binding| !binding.is_shared)
            .map(|binding| {
                (
                    binding.unique,
                    VarInfo {
                        ty: binding.ty,
                        is_array: binding.is_array,
                        is_shared: false,
                    },
                )
            })
            .collect();
        self.analysis.proc_vars.insert(name.to_string(), vars);
    }

    fn analyze_class(&mut self, decl: &mut ClassDecl) {
        let fields: FxHashMap<String, Type> = decl
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.ty))
            .collect();
        let prev_ctx = self.class_ctx.replace(ClassCtx { fields });
        for member in &mut decl.members {
            self.analyze_stmt(member);
        }
        self.class_ctx = prev_ctx;
    }
}

