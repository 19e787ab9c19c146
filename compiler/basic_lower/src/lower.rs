//! The lowering walk.

use basic_il::{BinOp, Cmp, FunctionBuilder, Instr, Module, Ty, Value};
use basic_ir::{
    descriptor, BinaryOp, Builtin, Expr, ExprKind, OpenMode, PrintChMode, PrintItem, Program,
    ResumeMode, Stmt, StmtKind, Type, UnaryOp,
};
use basic_sema::Analysis;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::runtime;
use crate::LowerOptions;

/// Kind tag for the loop-exit stack.
#[derive(Copy, Clone, Eq, PartialEq)]
enum LoopKind {
    For,
    While,
    Do,
}

pub(crate) struct Lowerer<'a> {
    analysis: &'a Analysis,
    options: LowerOptions,
    module: Module,
}

/// Per-function lowering state.
struct FnCtx {
    fb: FunctionBuilder,
    /// Slot name -> type for every local (and parameter) of the function.
    slots: FxHashMap<String, (Ty, bool)>,
    /// Lines targeted by GOTO/GOSUB/ON ERROR in this function.
    jump_targets: FxHashSet<i64>,
    /// Line blocks already opened.
    line_blocks: FxHashSet<i64>,
    /// (kind, exit label) stack for EXIT statements.
    loop_exits: Vec<(LoopKind, String)>,
    /// GOSUB continuation sites, in emission order.
    gosub_sites: Vec<String>,
    /// Whether a GOSUB-return dispatch block is needed.
    needs_gosub_dispatch: bool,
    /// String temporaries pending `rt_string_unref` at statement end.
    string_temps: Vec<Value>,
    ret: Ty,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(analysis: &'a Analysis, options: LowerOptions) -> Self {
        Lowerer {
            analysis,
            options,
            module: Module::new(),
        }
    }

    pub(crate) fn run(mut self, program: &Program) -> Module {
        for decl in &program.procs {
            self.lower_decl(decl);
        }
        self.lower_main(program);
        debug!(
            functions = self.module.functions.len(),
            externs = self.module.externs.len(),
            "lowering complete"
        );
        self.module
    }

    fn scalar_ty(ty: Type) -> Ty {
        match ty {
            Type::I64 => Ty::I64,
            Type::F64 => Ty::F64,
            Type::Str => Ty::Str,
            Type::Bool => Ty::Bool,
        }
    }

    fn lower_main(&mut self, program: &Program) {
        let fb = FunctionBuilder::new("@main", Vec::new(), Ty::I64);
        let mut slots = FxHashMap::default();
        for (name, info) in &self.analysis.program_vars {
            slots.insert(name.clone(), (Self::scalar_ty(info.ty), info.is_array));
        }
        let mut ctx = FnCtx {
            fb,
            slots,
            jump_targets: collect_jump_targets(&program.main),
            line_blocks: FxHashSet::default(),
            loop_exits: Vec::new(),
            gosub_sites: Vec::new(),
            needs_gosub_dispatch: false,
            string_temps: Vec::new(),
            ret: Ty::I64,
        };
        self.emit_prologue(&mut ctx);
        self.lower_body(&mut ctx, &program.main);
        self.finish_function(ctx, Some(0));
    }

    fn lower_decl(&mut self, decl: &Stmt) {
        match &decl.kind {
            StmtKind::Function(func) => {
                let sig = self.analysis.procs.get(&func.name);
                let params: Vec<(String, Ty)> = func
                    .params
                    .iter()
                    .enumerate()
                    .map(|(index, param)| {
                        let ty = sig
                            .and_then(|s| s.params.get(index))
                            .map(|p| Self::scalar_ty(p.ty))
                            .unwrap_or(Ty::I64);
                        (param.name.clone(), ty)
                    })
                    .collect();
                let ret = Self::scalar_ty(func.ret);
                self.lower_proc(&func.name, params, ret, &func.body);
            }
            StmtKind::Sub(sub) => {
                let sig = self.analysis.procs.get(&sub.name);
                let params: Vec<(String, Ty)> = sub
                    .params
                    .iter()
                    .enumerate()
                    .map(|(index, param)| {
                        let ty = sig
                            .and_then(|s| s.params.get(index))
                            .map(|p| Self::scalar_ty(p.ty))
                            .unwrap_or(Ty::I64);
                        (param.name.clone(), ty)
                    })
                    .collect();
                self.lower_proc(&sub.name, params, Ty::Void, &sub.body);
            }
            StmtKind::Class(class) => {
                // Methods lower to plain functions with a leading receiver
                // slot; dispatch tables are the VM's concern.
                let mut has_ctor = false;
                for member in &class.members {
                    match &member.kind {
                        StmtKind::Constructor(ctor) => {
                            has_ctor = true;
                            let mut params = vec![("ME".to_string(), Ty::I64)];
                            params.extend(
                                ctor.params
                                    .iter()
                                    .map(|p| (p.name.clone(), Self::renamed_ty(&p.name))),
                            );
                            let name = format!("{}.ctor", class.name);
                            self.lower_proc(&name, params, Ty::Void, &ctor.body);
                        }
                        StmtKind::Destructor(dtor) => {
                            let name = format!("{}.dtor", class.name);
                            let params = vec![("ME".to_string(), Ty::I64)];
                            self.lower_proc(&name, params, Ty::Void, &dtor.body);
                        }
                        StmtKind::Method(method) => {
                            let mut params = vec![("ME".to_string(), Ty::I64)];
                            params.extend(
                                method
                                    .params
                                    .iter()
                                    .map(|p| (p.name.clone(), Self::renamed_ty(&p.name))),
                            );
                            let name = format!("{}.{}", class.name, method.name);
                            let ret = method.ret.map(Self::scalar_ty).unwrap_or(Ty::Void);
                            self.lower_proc(&name, params, ret, &method.body);
                        }
                        StmtKind::Property(prop) => {
                            let ty = Self::scalar_ty(prop.ty);
                            if let Some(getter) = &prop.get {
                                let name = format!("{}.get_{}", class.name, prop.name);
                                let params = vec![("ME".to_string(), Ty::I64)];
                                self.lower_proc(&name, params, ty, &getter.body);
                            }
                            if let Some(setter) = &prop.set {
                                let name = format!("{}.set_{}", class.name, prop.name);
                                let params = vec![
                                    ("ME".to_string(), Ty::I64),
                                    (setter.param_name.clone(), ty),
                                ];
                                self.lower_proc(&name, params, Ty::Void, &setter.body);
                            }
                        }
                        _ => {}
                    }
                }
                if !has_ctor {
                    // `NEW` always calls the constructor; classes without
                    // one get an empty body.
                    let name = format!("{}.ctor", class.name);
                    let params = vec![("ME".to_string(), Ty::I64)];
                    self.lower_proc(&name, params, Ty::Void, &[]);
                }
            }
            // TYPE, INTERFACE, and USING shape the front end only.
            _ => {}
        }
    }

    fn lower_proc(&mut self, name: &str, params: Vec<(String, Ty)>, ret: Ty, body: &[Stmt]) {
        let mut slots: FxHashMap<String, (Ty, bool)> = FxHashMap::default();
        let mut param_names: FxHashSet<String> = FxHashSet::default();
        for (param_name, ty) in &params {
            slots.insert(param_name.clone(), (*ty, false));
            param_names.insert(param_name.clone());
        }
        if let Some(locals) = self.analysis.proc_vars.get(name) {
            for (local, info) in locals {
                slots
                    .entry(local.clone())
                    .or_insert((Self::scalar_ty(info.ty), info.is_array));
            }
        }
        // Shared names resolve to @main's frame; program-scope slots are
        // visible to every function by name.
        for (global, info) in &self.analysis.program_vars {
            slots
                .entry(global.clone())
                .or_insert((Self::scalar_ty(info.ty), info.is_array));
        }

        let fb = FunctionBuilder::new(&format!("@{name}"), params, ret);
        let mut ctx = FnCtx {
            fb,
            slots,
            jump_targets: collect_jump_targets(body),
            line_blocks: FxHashSet::default(),
            loop_exits: Vec::new(),
            gosub_sites: Vec::new(),
            needs_gosub_dispatch: false,
            string_temps: Vec::new(),
            ret,
        };
        self.emit_local_allocs(&mut ctx, name, &param_names);
        self.lower_body(&mut ctx, body);
        self.finish_function(ctx, None);
    }

    /// Sigil-implied IL type of a renamed local (`A$_0` is a string).
    fn renamed_ty(name: &str) -> Ty {
        let base = match name.rsplit_once('_') {
            Some((base, suffix)) if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) => base,
            _ => name,
        };
        match base.as_bytes().last() {
            Some(b'$') => Ty::Str,
            Some(b'!') | Some(b'#') => Ty::F64,
            _ => Ty::I64,
        }
    }

    /// Allocate scalar slots for the main program's globals.
    fn emit_prologue(&mut self, ctx: &mut FnCtx) {
        let mut names: Vec<&String> = self.analysis.program_vars.keys().collect();
        names.sort();
        for name in names {
            let info = &self.analysis.program_vars[name];
            if !info.is_array {
                ctx.fb.emit(Instr::Alloc {
                    name: name.clone(),
                    ty: Self::scalar_ty(info.ty),
                });
            }
        }
    }

    /// Allocate scalar slots for a procedure's locals (arrays are
    /// allocated by their `DIM`).
    fn emit_local_allocs(
        &mut self,
        ctx: &mut FnCtx,
        proc_name: &str,
        param_names: &FxHashSet<String>,
    ) {
        let Some(locals) = self.analysis.proc_vars.get(proc_name) else {
            return;
        };
        let mut names: Vec<&String> = locals.keys().collect();
        names.sort();
        for name in names {
            if param_names.contains(name.as_str()) {
                continue;
            }
            let info = &locals[name];
            if !info.is_array {
                ctx.fb.emit(Instr::Alloc {
                    name: name.clone(),
                    ty: Self::scalar_ty(info.ty),
                });
            }
        }
    }

    /// Close out a function: default return, GOSUB dispatch, and unresolved
    /// jump targets.
    fn finish_function(&mut self, mut ctx: FnCtx, main_exit: Option<i64>) {
        if !ctx.fb.terminated() {
            self.emit_default_ret(&mut ctx, main_exit);
        }
        if ctx.needs_gosub_dispatch {
            self.emit_gosub_dispatch(&mut ctx);
        }
        // Any jump target that never materialized becomes a trap block so
        // every branch in the function resolves.
        let missing: Vec<i64> = ctx
            .jump_targets
            .iter()
            .filter(|line| !ctx.line_blocks.contains(line))
            .copied()
            .collect();
        for line in missing {
            ctx.fb.begin_block(line_label(line));
            ctx.fb.emit(Instr::Trap {
                message: format!("jump target {line} is not reachable"),
            });
        }
        self.module.functions.push(ctx.fb.finish());
    }

    fn emit_default_ret(&mut self, ctx: &mut FnCtx, main_exit: Option<i64>) {
        match (ctx.ret, main_exit) {
            (_, Some(code)) => {
                let value = ctx.fb.value();
                ctx.fb.emit(Instr::ConstI64 { dst: value, value: code });
                ctx.fb.emit(Instr::Ret { value: Some(value) });
            }
            (Ty::Void, None) => ctx.fb.emit(Instr::Ret { value: None }),
            (ty, None) => {
                let value = self.zero_of(ctx, ty);
                ctx.fb.emit(Instr::Ret { value: Some(value) });
            }
        }
    }

    fn zero_of(&mut self, ctx: &mut FnCtx, ty: Ty) -> Value {
        let dst = ctx.fb.value();
        match ty {
            Ty::F64 => ctx.fb.emit(Instr::ConstF64 { dst, value: 0.0 }),
            Ty::Bool => ctx.fb.emit(Instr::ConstBool { dst, value: false }),
            Ty::Str => {
                let index = self.module.intern_string("");
                ctx.fb.emit(Instr::ConstStr { dst, index });
            }
            _ => ctx.fb.emit(Instr::ConstI64 { dst, value: 0 }),
        }
        dst
    }

    /// Chained compare-and-branch over the recorded GOSUB continuation
    /// sites.
    fn emit_gosub_dispatch(&mut self, ctx: &mut FnCtx) {
        ctx.fb.begin_block("gosub_dispatch".to_string());
        let id = self.call(ctx, "rt_gosub_pop", vec![], true);
        let sites = ctx.gosub_sites.clone();
        for (index, site) in sites.iter().enumerate() {
            let expect = ctx.fb.value();
            ctx.fb.emit(Instr::ConstI64 {
                dst: expect,
                value: index as i64,
            });
            let cond = ctx.fb.value();
            ctx.fb.emit(Instr::Binary {
                dst: cond,
                op: BinOp::ICmp(Cmp::Eq),
                lhs: id,
                rhs: expect,
            });
            let next = ctx.fb.label("gosub_next");
            ctx.fb.emit(Instr::CondBr {
                cond,
                then_label: site.clone(),
                else_label: next.clone(),
            });
            ctx.fb.begin_block(next);
        }
        ctx.fb.emit(Instr::Trap {
            message: "RETURN without GOSUB".to_string(),
        });
    }

    // Statement lowering ---------------------------------------------------

    fn lower_body(&mut self, ctx: &mut FnCtx, body: &[Stmt]) {
        for stmt in body {
            if ctx.jump_targets.contains(&stmt.line) && !ctx.line_blocks.contains(&stmt.line) {
                let label = line_label(stmt.line);
                if !ctx.fb.terminated() {
                    ctx.fb.emit(Instr::Br {
                        target: label.clone(),
                    });
                }
                ctx.fb.begin_block(label);
                ctx.line_blocks.insert(stmt.line);
            } else if ctx.fb.terminated() {
                // Unreachable statement after GOTO/RETURN/END; keep the IL
                // well formed by opening a fresh block for it.
                let label = ctx.fb.label("dead");
                ctx.fb.begin_block(label);
            }
            self.lower_stmt(ctx, stmt);
            self.release_string_temps(ctx);
        }
    }

    /// Unref string temporaries produced while lowering the last
    /// statement. After a terminator the frame is gone and the calls
    /// would be unreachable, so the temps are simply dropped.
    fn release_string_temps(&mut self, ctx: &mut FnCtx) {
        if ctx.fb.terminated() {
            ctx.string_temps.clear();
            return;
        }
        let temps = std::mem::take(&mut ctx.string_temps);
        for temp in temps {
            let _ = self.call(ctx, "rt_string_unref", vec![temp], false);
        }
    }

    fn call(&mut self, ctx: &mut FnCtx, callee: &str, args: Vec<Value>, wants_value: bool) -> Value {
        let ret = runtime::declare(&mut self.module, callee);
        let dst = if wants_value && ret != Ty::Void {
            Some(ctx.fb.value())
        } else {
            None
        };
        ctx.fb.emit(Instr::Call {
            dst,
            callee: callee.to_string(),
            args,
        });
        dst.unwrap_or(Value(u32::MAX))
    }

    /// Call a string-producing runtime helper and track the temporary.
    fn call_str(&mut self, ctx: &mut FnCtx, callee: &str, args: Vec<Value>) -> Value {
        let value = self.call(ctx, callee, args, true);
        ctx.string_temps.push(value);
        value
    }

    fn lower_stmt(&mut self, ctx: &mut FnCtx, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Label
            | StmtKind::Shared { .. }
            | StmtKind::Using { .. }
            | StmtKind::TypeDecl(_)
            | StmtKind::Interface(_)
            | StmtKind::Function(_)
            | StmtKind::Sub(_)
            | StmtKind::Class(_)
            | StmtKind::Constructor(_)
            | StmtKind::Destructor(_)
            | StmtKind::Method(_)
            | StmtKind::Property(_) => {}

            StmtKind::Print { items } => self.lower_print(ctx, items),
            StmtKind::PrintCh {
                mode,
                channel,
                args,
                trailing_newline,
            } => self.lower_print_channel(ctx, *mode, channel.as_ref(), args, *trailing_newline),
            StmtKind::Input { prompt, vars } => self.lower_input(ctx, prompt.as_ref(), vars),
            StmtKind::InputCh { channel, targets } => {
                let chan = self.lower_to_i64(ctx, channel);
                for target in targets {
                    let line = self.call_str(ctx, "rt_line_input_ch_err", vec![chan]);
                    self.store_converted_line(ctx, target, line);
                }
            }
            StmtKind::LineInputCh { channel, target } => {
                let chan = match channel {
                    Some(channel) => self.lower_to_i64(ctx, channel),
                    None => self.const_i64(ctx, 0),
                };
                let line = self.call_str(ctx, "rt_line_input_ch_err", vec![chan]);
                if let Some(target) = target {
                    self.store_into(ctx, target, line, Ty::Str);
                }
            }
            StmtKind::Open {
                mode,
                path,
                channel,
            } => {
                let path = match path {
                    Some(path) => self.lower_expr(ctx, path).0,
                    None => self.zero_of(ctx, Ty::Str),
                };
                let mode_val = self.const_i64(ctx, open_mode_ordinal(*mode));
                let chan = match channel {
                    Some(channel) => self.lower_to_i64(ctx, channel),
                    None => self.const_i64(ctx, 0),
                };
                let _ = self.call(ctx, "rt_open_err_vstr", vec![path, mode_val, chan], false);
            }
            StmtKind::Close { channel } => {
                let chan = match channel {
                    Some(channel) => self.lower_to_i64(ctx, channel),
                    None => self.const_i64(ctx, -1),
                };
                let _ = self.call(ctx, "rt_close_err", vec![chan], false);
            }
            StmtKind::Seek { channel, position } => {
                let chan = match channel {
                    Some(channel) => self.lower_to_i64(ctx, channel),
                    None => self.const_i64(ctx, 0),
                };
                let pos = match position {
                    Some(position) => self.lower_to_i64(ctx, position),
                    None => self.const_i64(ctx, 0),
                };
                let _ = self.call(ctx, "rt_seek_ch_err", vec![chan, pos], false);
            }

            StmtKind::Let { target, value } => {
                let (value, ty) = self.lower_expr(ctx, value);
                self.store_into(ctx, target, value, ty);
            }
            StmtKind::Const { name, value, ty } => {
                let slot_ty = Self::scalar_ty(*ty);
                let (value, from) = self.lower_expr(ctx, value);
                let value = self.coerce(ctx, value, from, slot_ty);
                ctx.fb.emit(Instr::Store {
                    slot: name.clone(),
                    value,
                    ty: slot_ty,
                });
            }
            StmtKind::Dim {
                name,
                is_array,
                size,
                ty,
            } => {
                if *is_array {
                    let len = match size {
                        Some(size) => {
                            let len = self.lower_to_i64(ctx, size);
                            // DIM N declares indices 0..N inclusive.
                            let one = self.const_i64(ctx, 1);
                            let total = ctx.fb.value();
                            ctx.fb.emit(Instr::Binary {
                                dst: total,
                                op: BinOp::IAddWrap,
                                lhs: len,
                                rhs: one,
                            });
                            total
                        }
                        None => self.const_i64(ctx, 0),
                    };
                    ctx.fb.emit(Instr::AllocArray {
                        name: name.clone(),
                        elem: Self::scalar_ty(*ty),
                        len,
                    });
                } else if !ctx.slots.contains_key(name) {
                    // Scalars normally get their slot in the prologue; class
                    // member bodies have no symbol table entry, so allocate
                    // here.
                    let slot_ty = Self::scalar_ty(*ty);
                    ctx.fb.emit(Instr::Alloc {
                        name: name.clone(),
                        ty: slot_ty,
                    });
                    ctx.slots.insert(name.clone(), (slot_ty, false));
                }
            }
            StmtKind::ReDim { name, size } => {
                let elem = ctx
                    .slots
                    .get(name)
                    .map(|(ty, _)| *ty)
                    .unwrap_or(Ty::I64);
                let len = match size {
                    Some(size) => {
                        let len = self.lower_to_i64(ctx, size);
                        let one = self.const_i64(ctx, 1);
                        let total = ctx.fb.value();
                        ctx.fb.emit(Instr::Binary {
                            dst: total,
                            op: BinOp::IAddWrap,
                            lhs: len,
                            rhs: one,
                        });
                        total
                    }
                    None => self.const_i64(ctx, 0),
                };
                ctx.fb.emit(Instr::AllocArray {
                    name: name.clone(),
                    elem,
                    len,
                });
            }
            StmtKind::Static { .. } => {
                // Static slots persist across calls; allocation happened in
                // the prologue and the VM keeps the backing storage alive.
            }
            StmtKind::Swap { lhs, rhs } => {
                let (left, lty) = self.lower_expr(ctx, lhs);
                let (right, rty) = self.lower_expr(ctx, rhs);
                self.store_into(ctx, lhs, right, rty);
                self.store_into(ctx, rhs, left, lty);
            }

            StmtKind::If {
                cond,
                then_branch,
                elseifs,
                else_branch,
            } => {
                let done = ctx.fb.label("if_done");
                let mut next = ctx.fb.label("if_else");
                let cond_val = self.lower_to_bool(ctx, cond);
                let then_label = ctx.fb.label("if_then");
                ctx.fb.emit(Instr::CondBr {
                    cond: cond_val,
                    then_label: then_label.clone(),
                    else_label: next.clone(),
                });
                ctx.fb.begin_block(then_label);
                self.lower_stmt(ctx, then_branch);
                self.release_string_temps(ctx);
                if !ctx.fb.terminated() {
                    ctx.fb.emit(Instr::Br {
                        target: done.clone(),
                    });
                }
                for elseif in elseifs {
                    ctx.fb.begin_block(next.clone());
                    next = ctx.fb.label("if_else");
                    let cond_val = self.lower_to_bool(ctx, &elseif.cond);
                    let then_label = ctx.fb.label("if_then");
                    ctx.fb.emit(Instr::CondBr {
                        cond: cond_val,
                        then_label: then_label.clone(),
                        else_label: next.clone(),
                    });
                    ctx.fb.begin_block(then_label);
                    self.lower_stmt(ctx, &elseif.then_branch);
                    self.release_string_temps(ctx);
                    if !ctx.fb.terminated() {
                        ctx.fb.emit(Instr::Br {
                            target: done.clone(),
                        });
                    }
                }
                ctx.fb.begin_block(next);
                if let Some(else_branch) = else_branch {
                    self.lower_stmt(ctx, else_branch);
                    self.release_string_temps(ctx);
                }
                if !ctx.fb.terminated() {
                    ctx.fb.emit(Instr::Br {
                        target: done.clone(),
                    });
                }
                ctx.fb.begin_block(done);
            }

            StmtKind::SelectCase {
                selector,
                arms,
                else_body,
            } => self.lower_select(ctx, selector.as_ref(), arms, else_body),

            StmtKind::While { cond, body } => {
                let head = ctx.fb.label("while_head");
                let body_label = ctx.fb.label("while_body");
                let exit = ctx.fb.label("while_exit");
                ctx.fb.emit(Instr::Br {
                    target: head.clone(),
                });
                ctx.fb.begin_block(head.clone());
                let cond_val = self.lower_to_bool(ctx, cond);
                ctx.fb.emit(Instr::CondBr {
                    cond: cond_val,
                    then_label: body_label.clone(),
                    else_label: exit.clone(),
                });
                ctx.fb.begin_block(body_label);
                ctx.loop_exits.push((LoopKind::While, exit.clone()));
                self.lower_body(ctx, body);
                ctx.loop_exits.pop();
                if !ctx.fb.terminated() {
                    ctx.fb.emit(Instr::Br {
                        target: head,
                    });
                }
                ctx.fb.begin_block(exit);
            }

            StmtKind::Do {
                test_pos,
                cond_kind,
                cond,
                body,
            } => self.lower_do(ctx, *test_pos, *cond_kind, cond.as_ref(), body),

            StmtKind::For {
                var,
                start,
                end,
                step,
                body,
            } => self.lower_for(ctx, var, start, end, step.as_ref(), body),

            StmtKind::Next { .. } => {
                // A stray NEXT outside a FOR; the loop form consumes its
                // own terminator.
            }
            StmtKind::Exit { kind } => {
                let wanted = match kind {
                    basic_ir::ExitKind::For => LoopKind::For,
                    basic_ir::ExitKind::While => LoopKind::While,
                    basic_ir::ExitKind::Do => LoopKind::Do,
                };
                let target = ctx
                    .loop_exits
                    .iter()
                    .rev()
                    .find(|(kind, _)| *kind == wanted)
                    .map(|(_, label)| label.clone());
                match target {
                    Some(label) => ctx.fb.emit(Instr::Br { target: label }),
                    None => ctx.fb.emit(Instr::Trap {
                        message: "EXIT outside of a matching loop".to_string(),
                    }),
                }
            }

            StmtKind::Goto { target } => {
                ctx.fb.emit(Instr::Br {
                    target: line_label(*target),
                });
            }
            StmtKind::Gosub { target_line } => {
                let site = ctx.gosub_sites.len() as i64;
                let id = self.const_i64(ctx, site);
                let _ = self.call(ctx, "rt_gosub_push", vec![id], false);
                ctx.fb.emit(Instr::Br {
                    target: line_label(*target_line),
                });
                let cont = format!("gosub_ret_{site}");
                ctx.fb.begin_block(cont.clone());
                ctx.gosub_sites.push(cont);
            }
            StmtKind::Return {
                is_gosub_return,
                value,
            } => {
                if *is_gosub_return {
                    ctx.needs_gosub_dispatch = true;
                    ctx.fb.emit(Instr::Br {
                        target: "gosub_dispatch".to_string(),
                    });
                } else {
                    match value {
                        Some(value) => {
                            let (value, ty) = self.lower_expr(ctx, value);
                            let ret_ty = ctx.ret;
                            let value = self.coerce(ctx, value, ty, ret_ty);
                            ctx.fb.emit(Instr::Ret { value: Some(value) });
                        }
                        None => ctx.fb.emit(Instr::Ret { value: None }),
                    }
                }
            }
            StmtKind::End => {
                // END terminates the enclosing function; @main returns its
                // exit code.
                let value = match ctx.ret {
                    Ty::Void => None,
                    ty => Some(self.zero_of(ctx, ty)),
                };
                ctx.fb.emit(Instr::Ret { value });
            }

            StmtKind::OnErrorGoto { target, to_zero } => {
                if *to_zero {
                    ctx.fb.emit(Instr::EhPop);
                } else {
                    ctx.jump_targets.insert(*target);
                    ctx.fb.emit(Instr::EhPush {
                        handler: line_label(*target),
                    });
                }
            }
            StmtKind::Resume { mode, target } => match mode {
                ResumeMode::Same => ctx.fb.emit(Instr::EhResumeSame),
                ResumeMode::Next => ctx.fb.emit(Instr::EhResumeNext),
                ResumeMode::Label => {
                    ctx.jump_targets.insert(*target);
                    ctx.fb.emit(Instr::Br {
                        target: line_label(*target),
                    });
                }
            },
            StmtKind::TryCatch {
                try_body,
                catch_var,
                catch_body,
            } => {
                let handler = ctx.fb.label("catch");
                let done = ctx.fb.label("try_done");
                ctx.fb.emit(Instr::EhPush {
                    handler: handler.clone(),
                });
                self.lower_body(ctx, try_body);
                if !ctx.fb.terminated() {
                    ctx.fb.emit(Instr::EhPop);
                    ctx.fb.emit(Instr::Br {
                        target: done.clone(),
                    });
                }
                ctx.fb.begin_block(handler);
                if let Some(var) = catch_var {
                    let code = self.call(ctx, "rt_err", vec![], true);
                    ctx.fb.emit(Instr::Alloc {
                        name: var.clone(),
                        ty: Ty::I64,
                    });
                    ctx.fb.emit(Instr::Store {
                        slot: var.clone(),
                        value: code,
                        ty: Ty::I64,
                    });
                    ctx.slots.insert(var.clone(), (Ty::I64, false));
                }
                self.lower_body(ctx, catch_body);
                if !ctx.fb.terminated() {
                    ctx.fb.emit(Instr::Br {
                        target: done.clone(),
                    });
                }
                ctx.fb.begin_block(done);
            }

            StmtKind::Cls => {
                let _ = self.call(ctx, "rt_term_cls", vec![], false);
            }
            StmtKind::Beep => {
                let _ = self.call(ctx, "rt_beep", vec![], false);
            }
            StmtKind::Cursor { visible } => {
                let flag = self.const_i64(ctx, i64::from(*visible));
                let _ = self.call(ctx, "rt_term_cursor", vec![flag], false);
            }
            StmtKind::AltScreen { enabled } => {
                let flag = self.const_i64(ctx, i64::from(*enabled));
                let _ = self.call(ctx, "rt_term_altscreen", vec![flag], false);
            }
            StmtKind::Color { fg, bg } => {
                let fg = self.opt_i64_or(ctx, fg.as_ref(), -1);
                let bg = self.opt_i64_or(ctx, bg.as_ref(), -1);
                let _ = self.call(ctx, "rt_term_color", vec![fg, bg], false);
            }
            StmtKind::Locate { row, col } => {
                let row = self.opt_i64_or(ctx, row.as_ref(), 0);
                let col = self.opt_i64_or(ctx, col.as_ref(), 0);
                let _ = self.call(ctx, "rt_term_locate", vec![row, col], false);
            }
            StmtKind::Sleep { ms } => {
                let ms = self.opt_i64_or(ctx, ms.as_ref(), 0);
                let _ = self.call(ctx, "rt_sleep_ms", vec![ms], false);
            }
            StmtKind::Randomize { seed } => {
                let seed = self.lower_to_i64(ctx, seed);
                let _ = self.call(ctx, "rt_randomize_i64", vec![seed], false);
            }
            StmtKind::Delete { target } => {
                let (value, _) = self.lower_expr(ctx, target);
                let _ = self.call(ctx, "rt_obj_delete", vec![value], false);
            }

            StmtKind::StmtList(stmts) => self.lower_body(ctx, stmts),
            StmtKind::CallStmt { call } => {
                if let Some(call) = call {
                    let _ = self.lower_expr(ctx, call);
                }
            }
        }
    }

    fn lower_print(&mut self, ctx: &mut FnCtx, items: &[PrintItem]) {
        let mut suppress_newline = false;
        for item in items {
            suppress_newline = false;
            match item {
                PrintItem::Expr(expr) => {
                    let (value, ty) = self.lower_expr(ctx, expr);
                    match ty {
                        Ty::Str => {
                            let _ = self.call(ctx, "rt_print_str", vec![value], false);
                        }
                        Ty::F64 => {
                            let _ = self.call(ctx, "rt_print_f64", vec![value], false);
                        }
                        Ty::Bool => {
                            let widened = ctx.fb.value();
                            ctx.fb.emit(Instr::BoolToI64 {
                                dst: widened,
                                value,
                            });
                            let _ = self.call(ctx, "rt_print_i64", vec![widened], false);
                        }
                        _ => {
                            let _ = self.call(ctx, "rt_print_i64", vec![value], false);
                        }
                    }
                }
                PrintItem::Comma => {
                    let tab = self.const_str(ctx, "\t");
                    let _ = self.call(ctx, "rt_print_str", vec![tab], false);
                    suppress_newline = true;
                }
                PrintItem::Semicolon => {
                    suppress_newline = true;
                }
            }
        }
        if !suppress_newline {
            let newline = self.const_str(ctx, "\n");
            let _ = self.call(ctx, "rt_print_str", vec![newline], false);
        }
    }

    fn lower_print_channel(
        &mut self,
        ctx: &mut FnCtx,
        mode: PrintChMode,
        channel: Option<&Expr>,
        args: &[Expr],
        trailing_newline: bool,
    ) {
        let chan = match channel {
            Some(channel) => self.lower_to_i64(ctx, channel),
            None => self.const_i64(ctx, 0),
        };
        for arg in args {
            let (value, ty) = self.lower_expr(ctx, arg);
            let text = match ty {
                Ty::Str => {
                    if mode == PrintChMode::Write {
                        self.call_str(ctx, "rt_csv_quote_alloc", vec![value])
                    } else {
                        value
                    }
                }
                Ty::F64 => self.call_str(ctx, "rt_f64_to_str", vec![value]),
                Ty::Bool => {
                    let widened = ctx.fb.value();
                    ctx.fb.emit(Instr::BoolToI64 {
                        dst: widened,
                        value,
                    });
                    self.call_str(ctx, "rt_int_to_str", vec![widened])
                }
                _ => self.call_str(ctx, "rt_int_to_str", vec![value]),
            };
            let _ = self.call(ctx, "rt_write_ch_err", vec![chan, text], false);
        }
        if trailing_newline {
            let empty = self.const_str(ctx, "");
            let _ = self.call(ctx, "rt_println_ch_err", vec![chan, empty], false);
        }
    }

    fn lower_input(&mut self, ctx: &mut FnCtx, prompt: Option<&Expr>, vars: &[String]) {
        if let Some(prompt) = prompt {
            let (value, _) = self.lower_expr(ctx, prompt);
            let _ = self.call(ctx, "rt_print_str", vec![value], false);
        }
        for var in vars {
            let line = self.call_str(ctx, "rt_input_line", vec![]);
            self.store_converted_line(ctx, var, line);
        }
    }

    /// Store an input line into a named slot, converting per the slot's
    /// type.
    fn store_converted_line(&mut self, ctx: &mut FnCtx, slot: &str, line: Value) {
        let ty = ctx.slots.get(slot).map(|(ty, _)| *ty).unwrap_or(Ty::I64);
        let value = match ty {
            Ty::Str => {
                let _ = self.call(ctx, "rt_string_ref", vec![line], false);
                line
            }
            Ty::F64 => self.call(ctx, "rt_val", vec![line], true),
            _ => self.call(ctx, "rt_to_int", vec![line], true),
        };
        ctx.fb.emit(Instr::Store {
            slot: slot.to_string(),
            value,
            ty,
        });
    }

    fn lower_select(
        &mut self,
        ctx: &mut FnCtx,
        selector: Option<&Expr>,
        arms: &[basic_ir::CaseArm],
        else_body: &[Stmt],
    ) {
        let selector = match selector {
            Some(selector) => self.lower_to_i64(ctx, selector),
            None => self.const_i64(ctx, 0),
        };
        let done = ctx.fb.label("select_done");
        // Chained compare-and-branch; the first matching arm wins.
        for arm in arms {
            let body_label = ctx.fb.label("case_body");
            let mut next = ctx.fb.label("case_next");
            if arm.labels.is_empty() {
                // Malformed arm kept by error recovery; its body can never
                // match.
                ctx.fb.emit(Instr::Br {
                    target: next.clone(),
                });
            }
            for (index, label_value) in arm.labels.iter().enumerate() {
                let expect = self.const_i64(ctx, *label_value);
                let cond = ctx.fb.value();
                ctx.fb.emit(Instr::Binary {
                    dst: cond,
                    op: BinOp::ICmp(Cmp::Eq),
                    lhs: selector,
                    rhs: expect,
                });
                let is_last = index + 1 == arm.labels.len();
                let else_label = if is_last {
                    next.clone()
                } else {
                    let probe = ctx.fb.label("case_probe");
                    probe
                };
                ctx.fb.emit(Instr::CondBr {
                    cond,
                    then_label: body_label.clone(),
                    else_label: else_label.clone(),
                });
                if !is_last {
                    ctx.fb.begin_block(else_label);
                } else {
                    next = else_label;
                }
            }
            ctx.fb.begin_block(body_label);
            self.lower_body(ctx, &arm.body);
            if !ctx.fb.terminated() {
                ctx.fb.emit(Instr::Br {
                    target: done.clone(),
                });
            }
            ctx.fb.begin_block(next);
        }
        self.lower_body(ctx, else_body);
        if !ctx.fb.terminated() {
            ctx.fb.emit(Instr::Br {
                target: done.clone(),
            });
        }
        ctx.fb.begin_block(done);
    }

    fn lower_do(
        &mut self,
        ctx: &mut FnCtx,
        test_pos: basic_ir::DoTestPos,
        cond_kind: basic_ir::DoCond,
        cond: Option<&Expr>,
        body: &[Stmt],
    ) {
        use basic_ir::{DoCond, DoTestPos};
        let head = ctx.fb.label("do_head");
        let body_label = ctx.fb.label("do_body");
        let exit = ctx.fb.label("do_exit");
        ctx.fb.emit(Instr::Br {
            target: head.clone(),
        });
        ctx.fb.begin_block(head.clone());

        let pre_test = test_pos == DoTestPos::Pre && cond_kind != DoCond::None;
        if pre_test {
            if let Some(cond) = cond {
                let mut value = self.lower_to_bool(ctx, cond);
                if cond_kind == DoCond::Until {
                    let inverted = ctx.fb.value();
                    ctx.fb.emit(Instr::BoolNot {
                        dst: inverted,
                        value,
                    });
                    value = inverted;
                }
                ctx.fb.emit(Instr::CondBr {
                    cond: value,
                    then_label: body_label.clone(),
                    else_label: exit.clone(),
                });
                ctx.fb.begin_block(body_label);
            }
        }

        ctx.loop_exits.push((LoopKind::Do, exit.clone()));
        self.lower_body(ctx, body);
        ctx.loop_exits.pop();

        if !ctx.fb.terminated() {
            let post_test = test_pos == DoTestPos::Post && cond_kind != DoCond::None;
            if post_test {
                if let Some(cond) = cond {
                    let mut value = self.lower_to_bool(ctx, cond);
                    if cond_kind == DoCond::Until {
                        let inverted = ctx.fb.value();
                        ctx.fb.emit(Instr::BoolNot {
                            dst: inverted,
                            value,
                        });
                        value = inverted;
                    }
                    ctx.fb.emit(Instr::CondBr {
                        cond: value,
                        then_label: head.clone(),
                        else_label: exit.clone(),
                    });
                }
            } else {
                ctx.fb.emit(Instr::Br {
                    target: head.clone(),
                });
            }
        }
        ctx.fb.begin_block(exit);
    }

    fn lower_for(
        &mut self,
        ctx: &mut FnCtx,
        var: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &[Stmt],
    ) {
        let var_ty = ctx.slots.get(var).map(|(ty, _)| *ty).unwrap_or(Ty::I64);
        let (start_val, start_ty) = self.lower_expr(ctx, start);
        let start_val = self.coerce(ctx, start_val, start_ty, var_ty);
        ctx.fb.emit(Instr::Store {
            slot: var.to_string(),
            value: start_val,
            ty: var_ty,
        });

        // Bound and step evaluate once, into synthetic slots.
        let bound_slot = ctx.fb.label("for_bound");
        let (end_val, end_ty) = self.lower_expr(ctx, end);
        let end_val = self.coerce(ctx, end_val, end_ty, var_ty);
        ctx.fb.emit(Instr::Alloc {
            name: bound_slot.clone(),
            ty: var_ty,
        });
        ctx.fb.emit(Instr::Store {
            slot: bound_slot.clone(),
            value: end_val,
            ty: var_ty,
        });
        let step_slot = ctx.fb.label("for_step");
        let step_val = match step {
            Some(step) => {
                let (value, ty) = self.lower_expr(ctx, step);
                self.coerce(ctx, value, ty, var_ty)
            }
            None => match var_ty {
                Ty::F64 => {
                    let dst = ctx.fb.value();
                    ctx.fb.emit(Instr::ConstF64 { dst, value: 1.0 });
                    dst
                }
                _ => self.const_i64(ctx, 1),
            },
        };
        ctx.fb.emit(Instr::Alloc {
            name: step_slot.clone(),
            ty: var_ty,
        });
        ctx.fb.emit(Instr::Store {
            slot: step_slot.clone(),
            value: step_val,
            ty: var_ty,
        });

        let head = ctx.fb.label("for_head");
        let body_label = ctx.fb.label("for_body");
        let exit = ctx.fb.label("for_exit");
        ctx.fb.emit(Instr::Br {
            target: head.clone(),
        });
        ctx.fb.begin_block(head.clone());

        // Continue while (step >= 0 AND var <= bound) OR
        // (step < 0 AND var >= bound).
        let current = ctx.fb.value();
        ctx.fb.emit(Instr::Load {
            dst: current,
            slot: var.to_string(),
            ty: var_ty,
        });
        let bound = ctx.fb.value();
        ctx.fb.emit(Instr::Load {
            dst: bound,
            slot: bound_slot.clone(),
            ty: var_ty,
        });
        let step_cur = ctx.fb.value();
        ctx.fb.emit(Instr::Load {
            dst: step_cur,
            slot: step_slot.clone(),
            ty: var_ty,
        });
        let zero = self.zero_of(ctx, var_ty);
        let cmp = |pred: Cmp| -> BinOp {
            if var_ty == Ty::F64 {
                BinOp::FCmp(pred)
            } else {
                BinOp::ICmp(pred)
            }
        };
        let step_up = ctx.fb.value();
        ctx.fb.emit(Instr::Binary {
            dst: step_up,
            op: cmp(Cmp::Ge),
            lhs: step_cur,
            rhs: zero,
        });
        let below = ctx.fb.value();
        ctx.fb.emit(Instr::Binary {
            dst: below,
            op: cmp(Cmp::Le),
            lhs: current,
            rhs: bound,
        });
        let above = ctx.fb.value();
        ctx.fb.emit(Instr::Binary {
            dst: above,
            op: cmp(Cmp::Ge),
            lhs: current,
            rhs: bound,
        });
        let step_down = ctx.fb.value();
        ctx.fb.emit(Instr::BoolNot {
            dst: step_down,
            value: step_up,
        });
        let up_ok = ctx.fb.value();
        ctx.fb.emit(Instr::Binary {
            dst: up_ok,
            op: BinOp::BoolAnd,
            lhs: step_up,
            rhs: below,
        });
        let down_ok = ctx.fb.value();
        ctx.fb.emit(Instr::Binary {
            dst: down_ok,
            op: BinOp::BoolAnd,
            lhs: step_down,
            rhs: above,
        });
        let keep_going = ctx.fb.value();
        ctx.fb.emit(Instr::Binary {
            dst: keep_going,
            op: BinOp::BoolOr,
            lhs: up_ok,
            rhs: down_ok,
        });
        ctx.fb.emit(Instr::CondBr {
            cond: keep_going,
            then_label: body_label.clone(),
            else_label: exit.clone(),
        });

        ctx.fb.begin_block(body_label);
        ctx.loop_exits.push((LoopKind::For, exit.clone()));
        self.lower_body(ctx, body);
        ctx.loop_exits.pop();

        if !ctx.fb.terminated() {
            let current = ctx.fb.value();
            ctx.fb.emit(Instr::Load {
                dst: current,
                slot: var.to_string(),
                ty: var_ty,
            });
            let step_cur = ctx.fb.value();
            ctx.fb.emit(Instr::Load {
                dst: step_cur,
                slot: step_slot,
                ty: var_ty,
            });
            let next = ctx.fb.value();
            ctx.fb.emit(Instr::Binary {
                dst: next,
                op: if var_ty == Ty::F64 {
                    BinOp::FAdd
                } else {
                    BinOp::IAddWrap
                },
                lhs: current,
                rhs: step_cur,
            });
            ctx.fb.emit(Instr::Store {
                slot: var.to_string(),
                value: next,
                ty: var_ty,
            });
            ctx.fb.emit(Instr::Br { target: head });
        }
        ctx.fb.begin_block(exit);
    }

    // Expression lowering --------------------------------------------------

    fn const_i64(&mut self, ctx: &mut FnCtx, value: i64) -> Value {
        let dst = ctx.fb.value();
        ctx.fb.emit(Instr::ConstI64 { dst, value });
        dst
    }

    fn const_str(&mut self, ctx: &mut FnCtx, value: &str) -> Value {
        let index = self.module.intern_string(value);
        let dst = ctx.fb.value();
        ctx.fb.emit(Instr::ConstStr { dst, index });
        dst
    }

    fn opt_i64_or(&mut self, ctx: &mut FnCtx, expr: Option<&Expr>, default: i64) -> Value {
        match expr {
            Some(expr) => self.lower_to_i64(ctx, expr),
            None => self.const_i64(ctx, default),
        }
    }

    fn lower_to_i64(&mut self, ctx: &mut FnCtx, expr: &Expr) -> Value {
        let (value, ty) = self.lower_expr(ctx, expr);
        self.coerce(ctx, value, ty, Ty::I64)
    }

    fn lower_to_bool(&mut self, ctx: &mut FnCtx, expr: &Expr) -> Value {
        let (value, ty) = self.lower_expr(ctx, expr);
        self.coerce(ctx, value, ty, Ty::Bool)
    }

    fn coerce(&mut self, ctx: &mut FnCtx, value: Value, from: Ty, to: Ty) -> Value {
        if from == to {
            return value;
        }
        match (from, to) {
            (Ty::I64, Ty::F64) => {
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::SiToFp { dst, value });
                dst
            }
            (Ty::F64, Ty::I64) => {
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::FpToSi { dst, value });
                dst
            }
            (Ty::Bool, Ty::I64) => {
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::BoolToI64 { dst, value });
                dst
            }
            (Ty::I64, Ty::Bool) => {
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::I64ToBool { dst, value });
                dst
            }
            (Ty::Bool, Ty::F64) => {
                let widened = ctx.fb.value();
                ctx.fb.emit(Instr::BoolToI64 {
                    dst: widened,
                    value,
                });
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::SiToFp {
                    dst,
                    value: widened,
                });
                dst
            }
            (Ty::F64, Ty::Bool) => {
                let narrowed = ctx.fb.value();
                ctx.fb.emit(Instr::FpToSi {
                    dst: narrowed,
                    value,
                });
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::I64ToBool {
                    dst,
                    value: narrowed,
                });
                dst
            }
            _ => value,
        }
    }

    /// Store a value into an assignable expression (variable, array
    /// element, or object field).
    fn store_into(&mut self, ctx: &mut FnCtx, target: &Expr, value: Value, value_ty: Ty) {
        match &target.kind {
            ExprKind::Var(name) => {
                let slot_ty = ctx.slots.get(name).map(|(ty, _)| *ty).unwrap_or(value_ty);
                let value = self.coerce(ctx, value, value_ty, slot_ty);
                if slot_ty == Ty::Str {
                    // The slot takes its own reference.
                    let _ = self.call(ctx, "rt_string_ref", vec![value], false);
                }
                ctx.fb.emit(Instr::Store {
                    slot: name.clone(),
                    value,
                    ty: slot_ty,
                });
            }
            ExprKind::Array { name, indices } => {
                let elem_ty = ctx.slots.get(name).map(|(ty, _)| *ty).unwrap_or(value_ty);
                let index = match indices.first() {
                    Some(index) => self.lower_to_i64(ctx, index),
                    None => self.const_i64(ctx, 0),
                };
                let value = self.coerce(ctx, value, value_ty, elem_ty);
                if elem_ty == Ty::Str {
                    let _ = self.call(ctx, "rt_string_ref", vec![value], false);
                }
                ctx.fb.emit(Instr::StoreElem {
                    array: name.clone(),
                    index,
                    value,
                    ty: elem_ty,
                    bounds_check: self.options.bounds_checks,
                });
            }
            ExprKind::Member { base, member } => {
                let (object, _) = self.lower_expr(ctx, base);
                let field = self.const_str(ctx, member);
                let value = self.coerce(ctx, value, value_ty, Ty::I64);
                let _ = self.call(ctx, "rt_obj_set", vec![object, field, value], false);
            }
            _ => {
                ctx.fb.emit(Instr::Trap {
                    message: "assignment target is not a variable".to_string(),
                });
            }
        }
    }

    fn lower_expr(&mut self, ctx: &mut FnCtx, expr: &Expr) -> (Value, Ty) {
        match &expr.kind {
            ExprKind::Int(value) => (self.const_i64(ctx, *value), Ty::I64),
            ExprKind::Float(value) => {
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::ConstF64 { dst, value: *value });
                (dst, Ty::F64)
            }
            ExprKind::Bool(value) => {
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::ConstBool { dst, value: *value });
                (dst, Ty::Bool)
            }
            ExprKind::Str(value) => (self.const_str(ctx, value), Ty::Str),

            ExprKind::Var(name) => {
                let ty = ctx.slots.get(name).map(|(ty, _)| *ty).unwrap_or(Ty::I64);
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::Load {
                    dst,
                    slot: name.clone(),
                    ty,
                });
                (dst, ty)
            }

            ExprKind::Array { name, indices } => {
                let ty = ctx.slots.get(name).map(|(ty, _)| *ty).unwrap_or(Ty::I64);
                let index = match indices.first() {
                    Some(index) => self.lower_to_i64(ctx, index),
                    None => self.const_i64(ctx, 0),
                };
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::LoadElem {
                    dst,
                    array: name.clone(),
                    index,
                    ty,
                    bounds_check: self.options.bounds_checks,
                });
                (dst, ty)
            }

            ExprKind::Unary { op, operand } => self.lower_unary(ctx, *op, operand),
            ExprKind::Binary { op, lhs, rhs } => self.lower_binary(ctx, *op, lhs, rhs),
            ExprKind::Builtin { builtin, args } => self.lower_builtin(ctx, *builtin, args),

            ExprKind::Call { callee, args, .. } => {
                let mut arg_values = Vec::with_capacity(args.len());
                let sig = self.analysis.procs.get(callee).cloned();
                for (index, arg) in args.iter().enumerate() {
                    let (value, ty) = self.lower_expr(ctx, arg);
                    let wanted = sig
                        .as_ref()
                        .and_then(|s| s.params.get(index))
                        .map(|p| Self::scalar_ty(p.ty))
                        .unwrap_or(ty);
                    arg_values.push(self.coerce(ctx, value, ty, wanted));
                }
                let ret = sig
                    .as_ref()
                    .and_then(|s| s.ret)
                    .map(Self::scalar_ty)
                    .unwrap_or(Ty::Void);
                let dst = if ret == Ty::Void {
                    None
                } else {
                    Some(ctx.fb.value())
                };
                ctx.fb.emit(Instr::Call {
                    dst,
                    callee: format!("@{callee}"),
                    args: arg_values,
                });
                (dst.unwrap_or(Value(u32::MAX)), ret)
            }

            ExprKind::LBound(_) => (self.const_i64(ctx, 0), Ty::I64),
            ExprKind::UBound(name) => {
                let len = ctx.fb.value();
                ctx.fb.emit(Instr::ArrayLen {
                    dst: len,
                    array: name.clone(),
                });
                let one = self.const_i64(ctx, 1);
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::Binary {
                    dst,
                    op: BinOp::ISubWrap,
                    lhs: len,
                    rhs: one,
                });
                (dst, Ty::I64)
            }

            ExprKind::New {
                class_name,
                qualified,
                args,
            } => {
                let full_name = if qualified.is_empty() {
                    class_name.clone()
                } else {
                    qualified.join(".")
                };
                let name_str = self.const_str(ctx, &full_name);
                let object = self.call(ctx, "rt_obj_new", vec![name_str], true);
                // Run the constructor when the class defines one.
                let mut ctor_args = vec![object];
                for arg in args {
                    let (value, _) = self.lower_expr(ctx, arg);
                    ctor_args.push(value);
                }
                ctx.fb.emit(Instr::Call {
                    dst: None,
                    callee: format!("@{class_name}.ctor"),
                    args: ctor_args,
                });
                (object, Ty::I64)
            }

            ExprKind::Me => {
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::Load {
                    dst,
                    slot: "ME".to_string(),
                    ty: Ty::I64,
                });
                (dst, Ty::I64)
            }

            ExprKind::Member { base, member } => {
                let (object, _) = self.lower_expr(ctx, base);
                let field = self.const_str(ctx, member);
                let dst = self.call(ctx, "rt_obj_get", vec![object, field], true);
                (dst, Ty::I64)
            }

            ExprKind::MethodCall { base, method, args } => {
                let (object, _) = self.lower_expr(ctx, base);
                let name = self.const_str(ctx, method);
                let mut call_args = vec![object, name];
                for arg in args {
                    let (value, _) = self.lower_expr(ctx, arg);
                    call_args.push(value);
                }
                let dst = self.call(ctx, "rt_method_invoke", call_args, true);
                (dst, Ty::I64)
            }

            ExprKind::Is { value, type_name } => {
                let (object, _) = self.lower_expr(ctx, value);
                let name = self.const_str(ctx, &type_name.join("."));
                let raw = self.call(ctx, "rt_obj_is", vec![object, name], true);
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::I64ToBool { dst, value: raw });
                (dst, Ty::Bool)
            }

            ExprKind::As { value, type_name } => {
                let (object, _) = self.lower_expr(ctx, value);
                let name = self.const_str(ctx, &type_name.join("."));
                let dst = self.call(ctx, "rt_obj_cast", vec![object, name], true);
                (dst, Ty::I64)
            }

            ExprKind::AddressOf(name) => {
                let name_str = self.const_str(ctx, name);
                let dst = self.call(ctx, "rt_proc_addr", vec![name_str], true);
                (dst, Ty::I64)
            }
        }
    }

    fn lower_unary(&mut self, ctx: &mut FnCtx, op: UnaryOp, operand: &Expr) -> (Value, Ty) {
        let (value, ty) = self.lower_expr(ctx, operand);
        match op {
            UnaryOp::Plus => (value, ty),
            UnaryOp::Negate => {
                if ty == Ty::F64 {
                    let dst = ctx.fb.value();
                    ctx.fb.emit(Instr::FNeg { dst, value });
                    (dst, Ty::F64)
                } else {
                    let value = self.coerce(ctx, value, ty, Ty::I64);
                    let dst = ctx.fb.value();
                    ctx.fb.emit(Instr::INegWrap { dst, value });
                    (dst, Ty::I64)
                }
            }
            UnaryOp::LogicalNot => {
                if ty == Ty::Bool {
                    let dst = ctx.fb.value();
                    ctx.fb.emit(Instr::BoolNot { dst, value });
                    (dst, Ty::Bool)
                } else {
                    // Integer NOT produces the integer 1/0 the runtime
                    // defines.
                    let as_bool = self.coerce(ctx, value, ty, Ty::Bool);
                    let inverted = ctx.fb.value();
                    ctx.fb.emit(Instr::BoolNot {
                        dst: inverted,
                        value: as_bool,
                    });
                    let dst = ctx.fb.value();
                    ctx.fb.emit(Instr::BoolToI64 {
                        dst,
                        value: inverted,
                    });
                    (dst, Ty::I64)
                }
            }
        }
    }

    fn lower_binary(&mut self, ctx: &mut FnCtx, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> (Value, Ty) {
        // Short-circuit forms need control flow, not a single instruction.
        if op.is_short_circuit() {
            return self.lower_short_circuit(ctx, op, lhs, rhs);
        }

        let (left, lt) = self.lower_expr(ctx, lhs);
        let (right, rt) = self.lower_expr(ctx, rhs);

        // String operations route through the runtime.
        if lt == Ty::Str && rt == Ty::Str {
            return match op {
                BinaryOp::Add => {
                    let dst = self.call_str(ctx, "rt_concat", vec![left, right]);
                    (dst, Ty::Str)
                }
                BinaryOp::Eq | BinaryOp::Ne => {
                    let raw = self.call(ctx, "rt_str_eq", vec![left, right], true);
                    let mut dst = ctx.fb.value();
                    ctx.fb.emit(Instr::I64ToBool {
                        dst,
                        value: raw,
                    });
                    if op == BinaryOp::Ne {
                        let inverted = ctx.fb.value();
                        ctx.fb.emit(Instr::BoolNot {
                            dst: inverted,
                            value: dst,
                        });
                        dst = inverted;
                    }
                    (dst, Ty::Bool)
                }
                _ => {
                    // Ordered string comparison.
                    let cmp = self.call(ctx, "rt_str_cmp", vec![left, right], true);
                    let zero = self.const_i64(ctx, 0);
                    let dst = ctx.fb.value();
                    ctx.fb.emit(Instr::Binary {
                        dst,
                        op: BinOp::ICmp(cmp_pred(op)),
                        lhs: cmp,
                        rhs: zero,
                    });
                    (dst, Ty::Bool)
                }
            };
        }

        if op.is_logical() {
            let left = self.coerce(ctx, left, lt, Ty::Bool);
            let right = self.coerce(ctx, right, rt, Ty::Bool);
            let dst = ctx.fb.value();
            ctx.fb.emit(Instr::Binary {
                dst,
                op: if matches!(op, BinaryOp::And) {
                    BinOp::BoolAnd
                } else {
                    BinOp::BoolOr
                },
                lhs: left,
                rhs: right,
            });
            return (dst, Ty::Bool);
        }

        if op.is_comparison() {
            let float = lt == Ty::F64 || rt == Ty::F64;
            let (left, right, cmp_op) = if float {
                (
                    self.coerce(ctx, left, lt, Ty::F64),
                    self.coerce(ctx, right, rt, Ty::F64),
                    BinOp::FCmp(cmp_pred(op)),
                )
            } else {
                (
                    self.coerce(ctx, left, lt, Ty::I64),
                    self.coerce(ctx, right, rt, Ty::I64),
                    BinOp::ICmp(cmp_pred(op)),
                )
            };
            let dst = ctx.fb.value();
            ctx.fb.emit(Instr::Binary {
                dst,
                op: cmp_op,
                lhs: left,
                rhs: right,
            });
            return (dst, Ty::Bool);
        }

        // Arithmetic. Division and `^` always promote to float; `\` and
        // `MOD` require integers; the rest promote when either side is a
        // float, with explicit wrap on the integer path.
        match op {
            BinaryOp::Div | BinaryOp::Pow => {
                let left = self.coerce(ctx, left, lt, Ty::F64);
                let right = self.coerce(ctx, right, rt, Ty::F64);
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::Binary {
                    dst,
                    op: if op == BinaryOp::Div {
                        BinOp::FDiv
                    } else {
                        BinOp::FPow
                    },
                    lhs: left,
                    rhs: right,
                });
                (dst, Ty::F64)
            }
            BinaryOp::IDiv | BinaryOp::Mod => {
                let left = self.coerce(ctx, left, lt, Ty::I64);
                let right = self.coerce(ctx, right, rt, Ty::I64);
                let dst = ctx.fb.value();
                ctx.fb.emit(Instr::Binary {
                    dst,
                    op: if op == BinaryOp::IDiv {
                        BinOp::IDiv
                    } else {
                        BinOp::IRem
                    },
                    lhs: left,
                    rhs: right,
                });
                (dst, Ty::I64)
            }
            _ => {
                let float = lt == Ty::F64 || rt == Ty::F64;
                if float {
                    let left = self.coerce(ctx, left, lt, Ty::F64);
                    let right = self.coerce(ctx, right, rt, Ty::F64);
                    let dst = ctx.fb.value();
                    ctx.fb.emit(Instr::Binary {
                        dst,
                        op: match op {
                            BinaryOp::Add => BinOp::FAdd,
                            BinaryOp::Sub => BinOp::FSub,
                            _ => BinOp::FMul,
                        },
                        lhs: left,
                        rhs: right,
                    });
                    (dst, Ty::F64)
                } else {
                    let left = self.coerce(ctx, left, lt, Ty::I64);
                    let right = self.coerce(ctx, right, rt, Ty::I64);
                    let dst = ctx.fb.value();
                    ctx.fb.emit(Instr::Binary {
                        dst,
                        op: match op {
                            BinaryOp::Add => BinOp::IAddWrap,
                            BinaryOp::Sub => BinOp::ISubWrap,
                            _ => BinOp::IMulWrap,
                        },
                        lhs: left,
                        rhs: right,
                    });
                    (dst, Ty::I64)
                }
            }
        }
    }

    /// `ANDALSO` / `ORELSE` evaluate the right side only when the left
    /// does not decide the result.
    fn lower_short_circuit(
        &mut self,
        ctx: &mut FnCtx,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> (Value, Ty) {
        let slot = ctx.fb.label("sc_tmp");
        ctx.fb.emit(Instr::Alloc {
            name: slot.clone(),
            ty: Ty::Bool,
        });
        let left = self.lower_to_bool(ctx, lhs);
        ctx.fb.emit(Instr::Store {
            slot: slot.clone(),
            value: left,
            ty: Ty::Bool,
        });
        let rhs_label = ctx.fb.label("sc_rhs");
        let done = ctx.fb.label("sc_done");
        match op {
            BinaryOp::AndAlso => ctx.fb.emit(Instr::CondBr {
                cond: left,
                then_label: rhs_label.clone(),
                else_label: done.clone(),
            }),
            _ => ctx.fb.emit(Instr::CondBr {
                cond: left,
                then_label: done.clone(),
                else_label: rhs_label.clone(),
            }),
        }
        ctx.fb.begin_block(rhs_label);
        let right = self.lower_to_bool(ctx, rhs);
        ctx.fb.emit(Instr::Store {
            slot: slot.clone(),
            value: right,
            ty: Ty::Bool,
        });
        ctx.fb.emit(Instr::Br {
            target: done.clone(),
        });
        ctx.fb.begin_block(done);
        let dst = ctx.fb.value();
        ctx.fb.emit(Instr::Load {
            dst,
            slot,
            ty: Ty::Bool,
        });
        (dst, Ty::Bool)
    }

    /// Builtins emit the pre-declared runtime symbol selected from the
    /// registry by builtin id, arity, and argument type.
    fn lower_builtin(&mut self, ctx: &mut FnCtx, builtin: Builtin, args: &[Expr]) -> (Value, Ty) {
        let desc = descriptor(builtin);
        let mut values = Vec::with_capacity(args.len());
        let mut types = Vec::with_capacity(args.len());
        for arg in args {
            let (value, ty) = self.lower_expr(ctx, arg);
            values.push(value);
            types.push(ty);
        }

        let first_ty = types.first().copied().unwrap_or(Ty::I64);
        let variant = desc
            .variants
            .iter()
            .find(|v| {
                let arity_ok = v.arity == 0 || v.arity as usize == args.len();
                let ty_ok = match v.arg {
                    basic_ir::ArgType::Any => true,
                    basic_ir::ArgType::Str => first_ty == Ty::Str,
                    basic_ir::ArgType::I64 => first_ty == Ty::I64 || first_ty == Ty::Bool,
                    basic_ir::ArgType::F64 => first_ty == Ty::F64,
                };
                arity_ok && ty_ok
            })
            .or_else(|| {
                desc.variants
                    .iter()
                    .find(|v| v.arity == 0 || v.arity as usize == args.len())
            });
        let Some(variant) = variant else {
            ctx.fb.emit(Instr::Trap {
                message: format!("no runtime variant for {}", desc.name),
            });
            return (self.const_i64(ctx, 0), Ty::I64);
        };

        // Coerce numeric arguments to what the chosen symbol expects.
        let expected = match variant.arg {
            basic_ir::ArgType::F64 => Some(Ty::F64),
            basic_ir::ArgType::I64 => Some(Ty::I64),
            _ => None,
        };
        if let (Some(expected), Some(first)) = (expected, values.first().copied()) {
            if types[0] != Ty::Str {
                values[0] = self.coerce(ctx, first, types[0], expected);
            }
        }
        // Index-style trailing arguments are integers.
        for index in 1..values.len() {
            if types[index] == Ty::F64 {
                values[index] = self.coerce(ctx, values[index], Ty::F64, Ty::I64);
            }
        }

        let result_ty = match desc.result {
            basic_ir::ResultRule::Fixed(ty) => Self::scalar_ty(ty),
            basic_ir::ResultRule::SameAsArg => first_ty,
        };
        let value = if result_ty == Ty::Str {
            self.call_str(ctx, variant.symbol, values)
        } else {
            self.call(ctx, variant.symbol, values, true)
        };
        (value, result_ty)
    }
}

fn line_label(line: i64) -> String {
    format!("line_{line}")
}

fn open_mode_ordinal(mode: OpenMode) -> i64 {
    mode as i64
}

fn cmp_pred(op: BinaryOp) -> Cmp {
    match op {
        BinaryOp::Eq => Cmp::Eq,
        BinaryOp::Ne => Cmp::Ne,
        BinaryOp::Lt => Cmp::Lt,
        BinaryOp::Le => Cmp::Le,
        BinaryOp::Gt => Cmp::Gt,
        BinaryOp::Ge => Cmp::Ge,
        _ => Cmp::Eq,
    }
}

/// Collect every line number targeted by a jump anywhere in a body.
fn collect_jump_targets(body: &[Stmt]) -> FxHashSet<i64> {
    fn walk(stmts: &[Stmt], targets: &mut FxHashSet<i64>) {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Goto { target } => {
                    targets.insert(*target);
                }
                StmtKind::Gosub { target_line } => {
                    targets.insert(*target_line);
                }
                StmtKind::OnErrorGoto { target, to_zero } => {
                    if !to_zero {
                        targets.insert(*target);
                    }
                }
                StmtKind::Resume {
                    mode: ResumeMode::Label,
                    target,
                } => {
                    targets.insert(*target);
                }
                StmtKind::If {
                    then_branch,
                    elseifs,
                    else_branch,
                    ..
                } => {
                    walk(std::slice::from_ref(then_branch), targets);
                    for elseif in elseifs {
                        walk(std::slice::from_ref(&elseif.then_branch), targets);
                    }
                    if let Some(else_branch) = else_branch {
                        walk(std::slice::from_ref(else_branch), targets);
                    }
                }
                StmtKind::SelectCase {
                    arms, else_body, ..
                } => {
                    for arm in arms {
                        walk(&arm.body, targets);
                    }
                    walk(else_body, targets);
                }
                StmtKind::While { body, .. }
                | StmtKind::Do { body, .. }
                | StmtKind::For { body, .. } => walk(body, targets),
                StmtKind::TryCatch {
                    try_body,
                    catch_body,
                    ..
                } => {
                    walk(try_body, targets);
                    walk(catch_body, targets);
                }
                StmtKind::StmtList(stmts) => walk(stmts, targets),
                _ => {}
            }
        }
    }
    let mut targets = FxHashSet::default();
    walk(body, &mut targets);
    targets
}
