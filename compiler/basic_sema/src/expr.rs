//! Expression analysis: reference resolution, rename rewriting, and
//! operator/type validation.

use basic_diagnostic::ErrorCode;
use basic_ir::{descriptor, BinaryOp, Expr, ExprKind, ResultRule, Span, Type, UnaryOp};

use crate::analyzer::Analyzer;

impl<'e> Analyzer<'e> {
    /// Analyze an expression, rewriting references in place. Returns the
    /// expression's type, or `None` when it could not be determined
    /// (after a diagnostic, or for object-model constructs the type
    /// system does not track).
    pub(crate) fn analyze_expr(&mut self, expr: &mut Expr) -> Option<Type> {
        let span = expr.span;
        match &mut expr.kind {
            ExprKind::Int(_) => Some(Type::I64),
            ExprKind::Float(_) => Some(Type::F64),
            ExprKind::Str(_) => Some(Type::Str),
            ExprKind::Bool(_) => Some(Type::Bool),

            ExprKind::Var(name) => Some(self.resolve_var(name, span)),

            ExprKind::Array { name, indices } => {
                for index in indices.iter_mut() {
                    let ty = self.analyze_expr(index);
                    self.require_numeric(ty, index.span, "array subscript");
                }
                self.resolve_array(name, span)
            }

            ExprKind::Unary { op, operand } => {
                let op = *op;
                let ty = self.analyze_expr(operand)?;
                match op {
                    UnaryOp::LogicalNot => {
                        if ty == Type::Str {
                            self.string_in_numeric(span);
                            return None;
                        }
                        Some(if ty == Type::Bool { Type::Bool } else { Type::I64 })
                    }
                    UnaryOp::Plus | UnaryOp::Negate => {
                        if ty == Type::Str {
                            self.string_in_numeric(span);
                            return None;
                        }
                        Some(if ty == Type::Bool { Type::I64 } else { ty })
                    }
                }
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                let lt = self.analyze_expr(lhs);
                let rt = self.analyze_expr(rhs);
                self.check_binary(op, lt?, rt?, span)
            }

            ExprKind::Builtin { builtin, args } => {
                let builtin = *builtin;
                let mut arg_types = Vec::with_capacity(args.len());
                for arg in args.iter_mut() {
                    arg_types.push(self.analyze_expr(arg));
                }
                self.check_builtin(builtin, &arg_types, span)
            }

            ExprKind::Call {
                callee,
                qualified: _,
                args,
            } => {
                let callee = callee.clone();
                let mut arg_types = Vec::with_capacity(args.len());
                for arg in args.iter_mut() {
                    arg_types.push(self.analyze_expr(arg));
                }
                self.check_call(&callee, &arg_types, span)
            }

            ExprKind::LBound(name) | ExprKind::UBound(name) => {
                let _ = self.resolve_array(name, span);
                Some(Type::I64)
            }

            ExprKind::New { args, .. } => {
                for arg in args {
                    let _ = self.analyze_expr(arg);
                }
                // Object references lower to runtime handles.
                Some(Type::I64)
            }

            ExprKind::Me => {
                if self.in_class() {
                    Some(Type::I64)
                } else {
                    self.error(ErrorCode::B2002, span, "ME used outside a class member");
                    None
                }
            }

            ExprKind::Member { base, member } => {
                let member = member.clone();
                let is_me = matches!(base.kind, ExprKind::Me);
                let _ = self.analyze_expr(base);
                if is_me {
                    return self.class_field_type(&member, span);
                }
                None
            }

            ExprKind::MethodCall { base, args, .. } => {
                let _ = self.analyze_expr(base);
                for arg in args {
                    let _ = self.analyze_expr(arg);
                }
                None
            }

            ExprKind::Is { value, .. } => {
                let _ = self.analyze_expr(value);
                Some(Type::Bool)
            }
            ExprKind::As { value, .. } => {
                let _ = self.analyze_expr(value);
                Some(Type::I64)
            }

            ExprKind::AddressOf(name) => {
                if !self.proc_exists(name) {
                    let message = format!("unknown procedure '{name}' in ADDRESSOF");
                    self.error(ErrorCode::B2002, span, message);
                }
                Some(Type::I64)
            }
        }
    }

    /// Validate a binary operation and compute its result type.
    fn check_binary(&mut self, op: BinaryOp, lt: Type, rt: Type, span: Span) -> Option<Type> {
        match op {
            BinaryOp::Add => {
                if lt == Type::Str && rt == Type::Str {
                    return Some(Type::Str);
                }
                if lt == Type::Str || rt == Type::Str {
                    self.string_in_numeric(span);
                    return None;
                }
                Some(Self::promote(lt, rt))
            }
            BinaryOp::Sub | BinaryOp::Mul => {
                if lt == Type::Str || rt == Type::Str {
                    self.string_in_numeric(span);
                    return None;
                }
                Some(Self::promote(lt, rt))
            }
            BinaryOp::Div | BinaryOp::Pow => {
                if lt == Type::Str || rt == Type::Str {
                    self.string_in_numeric(span);
                    return None;
                }
                Some(Type::F64)
            }
            BinaryOp::IDiv | BinaryOp::Mod => {
                if lt == Type::Str || rt == Type::Str {
                    self.string_in_numeric(span);
                    return None;
                }
                Some(Type::I64)
            }
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => {
                let l_str = lt == Type::Str;
                let r_str = rt == Type::Str;
                if l_str != r_str {
                    self.error(
                        ErrorCode::B2001,
                        span,
                        "comparison mixes string and numeric operands",
                    );
                    return None;
                }
                Some(Type::Bool)
            }
            BinaryOp::And | BinaryOp::Or | BinaryOp::AndAlso | BinaryOp::OrElse => {
                for ty in [lt, rt] {
                    if ty == Type::Str {
                        self.string_in_numeric(span);
                        return None;
                    }
                    if ty == Type::F64 {
                        self.error(
                            ErrorCode::B2001,
                            span,
                            "logical operator requires boolean or integer operands",
                        );
                        return None;
                    }
                }
                Some(Type::Bool)
            }
        }
    }

    /// Validate a builtin call: arity range and coarse argument types.
    fn check_builtin(
        &mut self,
        builtin: basic_ir::Builtin,
        arg_types: &[Option<Type>],
        span: Span,
    ) -> Option<Type> {
        let desc = descriptor(builtin);
        let count = arg_types.len();
        if count < desc.min_args as usize || count > desc.max_args as usize {
            let message = format!(
                "wrong number of arguments to {}: expected {}..{}, found {}",
                desc.name, desc.min_args, desc.max_args, count
            );
            self.error(ErrorCode::B2004, span, message);
            return None;
        }
        // First-argument type discipline: string builtins take a string,
        // numeric builtins reject one.
        if let Some(Some(first)) = arg_types.first() {
            let wants_str = matches!(
                builtin,
                basic_ir::Builtin::Len
                    | basic_ir::Builtin::Mid
                    | basic_ir::Builtin::Left
                    | basic_ir::Builtin::Right
                    | basic_ir::Builtin::Instr
                    | basic_ir::Builtin::Ltrim
                    | basic_ir::Builtin::Rtrim
                    | basic_ir::Builtin::Trim
                    | basic_ir::Builtin::Ucase
                    | basic_ir::Builtin::Lcase
                    | basic_ir::Builtin::Asc
                    | basic_ir::Builtin::Val
            );
            if wants_str && *first != Type::Str {
                let message = format!("{} expects a string argument", desc.name);
                self.error(ErrorCode::B2005, span, message);
                return None;
            }
            if !wants_str && *first == Type::Str && desc.min_args > 0 {
                let message = format!("{} expects a numeric argument", desc.name);
                self.error(ErrorCode::B2005, span, message);
                return None;
            }
        }
        match desc.result {
            ResultRule::Fixed(ty) => Some(ty),
            ResultRule::SameAsArg => arg_types.first().copied().flatten(),
        }
    }

    /// Validate a user-procedure call against its signature.
    pub(crate) fn check_call(
        &mut self,
        callee: &str,
        arg_types: &[Option<Type>],
        span: Span,
    ) -> Option<Type> {
        let Some(sig) = self.signature(callee) else {
            let message = format!("unknown procedure '{callee}'");
            self.error(ErrorCode::B2002, span, message);
            return None;
        };
        if sig.params.len() != arg_types.len() {
            let message = format!(
                "wrong number of arguments to {}: expected {}, found {}",
                callee,
                sig.params.len(),
                arg_types.len()
            );
            self.error(ErrorCode::B2004, span, message);
            return sig.ret;
        }
        for (param, arg_ty) in sig.params.iter().zip(arg_types) {
            let Some(arg_ty) = arg_ty else { continue };
            let param_str = param.ty == Type::Str;
            let arg_str = *arg_ty == Type::Str;
            if param_str != arg_str {
                let message = format!(
                    "argument type mismatch for parameter {} of {}",
                    param.name, callee
                );
                self.error(ErrorCode::B2005, span, message);
            }
        }
        sig.ret
    }

    /// Numeric promotion: either side float widens the result.
    pub(crate) fn promote(lt: Type, rt: Type) -> Type {
        if lt == Type::F64 || rt == Type::F64 {
            Type::F64
        } else {
            Type::I64
        }
    }

    /// `B2001` in its canonical wording.
    pub(crate) fn string_in_numeric(&mut self, span: Span) {
        self.error(
            ErrorCode::B2001,
            span,
            "string used where numeric expected",
        );
    }

    /// Require a numeric (or boolean) type in `what` position.
    pub(crate) fn require_numeric(&mut self, ty: Option<Type>, span: Span, what: &str) {
        if ty == Some(Type::Str) {
            let message = format!("string used where numeric expected in {what}");
            self.error(ErrorCode::B2001, span, message);
        }
    }

    /// Check that a value type is assignable to a target type.
    pub(crate) fn check_assign(&mut self, target: Option<Type>, value: Option<Type>, span: Span) {
        let (Some(target), Some(value)) = (target, value) else {
            return;
        };
        let target_str = target == Type::Str;
        let value_str = value == Type::Str;
        if target_str != value_str {
            if value_str {
                self.string_in_numeric(span);
            } else {
                self.error(
                    ErrorCode::B2001,
                    span,
                    "numeric used where string expected",
                );
            }
        }
    }
}
