//! Textual listing of IL modules.

use std::fmt;

use crate::{Block, Function, Instr, Module, Value};
#[cfg(test)]
use crate::Ty;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ext in &self.externs {
            write!(f, "extern {}(", ext.name)?;
            for (index, param) in ext.params.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", param.name())?;
            }
            writeln!(f, ") -> {}", ext.ret.name())?;
        }
        for (index, string) in self.strings.iter().enumerate() {
            writeln!(f, "str.{index} = {string:?}")?;
        }
        for function in &self.functions {
            write!(f, "{function}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.name)?;
        for (index, (name, ty)) in self.params.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, ty.name())?;
        }
        writeln!(f, ") -> {} {{", self.ret.name())?;
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.label)?;
        for instr in &self.instrs {
            writeln!(f, "  {instr}")?;
        }
        Ok(())
    }
}

fn call_args(args: &[Value]) -> String {
    let mut out = String::new();
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        out.push_str(&arg.to_string());
    }
    out
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::ConstI64 { dst, value } => write!(f, "{dst} = const.i64 {value}"),
            Instr::ConstF64 { dst, value } => write!(f, "{dst} = const.f64 {value}"),
            Instr::ConstBool { dst, value } => write!(f, "{dst} = const.i1 {value}"),
            Instr::ConstStr { dst, index } => write!(f, "{dst} = const.str str.{index}"),
            Instr::Alloc { name, ty } => write!(f, "alloc {name}: {}", ty.name()),
            Instr::AllocArray { name, elem, len } => {
                write!(f, "alloc.array {name}: {}[{len}]", elem.name())
            }
            Instr::Load { dst, slot, ty } => write!(f, "{dst} = load.{} {slot}", ty.name()),
            Instr::Store { slot, value, ty } => {
                write!(f, "store.{} {slot}, {value}", ty.name())
            }
            Instr::LoadElem {
                dst,
                array,
                index,
                ty,
                bounds_check,
            } => {
                let check = if *bounds_check { ".checked" } else { "" };
                write!(f, "{dst} = load.elem{check}.{} {array}[{index}]", ty.name())
            }
            Instr::StoreElem {
                array,
                index,
                value,
                ty,
                bounds_check,
            } => {
                let check = if *bounds_check { ".checked" } else { "" };
                write!(
                    f,
                    "store.elem{check}.{} {array}[{index}], {value}",
                    ty.name()
                )
            }
            Instr::ArrayLen { dst, array } => write!(f, "{dst} = array.len {array}"),
            Instr::Binary { dst, op, lhs, rhs } => {
                write!(f, "{dst} = {op:?} {lhs}, {rhs}")
            }
            Instr::INegWrap { dst, value } => write!(f, "{dst} = ineg.wrap {value}"),
            Instr::FNeg { dst, value } => write!(f, "{dst} = fneg {value}"),
            Instr::BoolNot { dst, value } => write!(f, "{dst} = not {value}"),
            Instr::SiToFp { dst, value } => write!(f, "{dst} = sitofp {value}"),
            Instr::FpToSi { dst, value } => write!(f, "{dst} = fptosi {value}"),
            Instr::BoolToI64 { dst, value } => write!(f, "{dst} = zext.i1 {value}"),
            Instr::I64ToBool { dst, value } => write!(f, "{dst} = icmp.ne.0 {value}"),
            Instr::Call { dst, callee, args } => match dst {
                Some(dst) => write!(f, "{dst} = call {callee}({})", call_args(args)),
                None => write!(f, "call {callee}({})", call_args(args)),
            },
            Instr::Br { target } => write!(f, "br {target}"),
            Instr::CondBr {
                cond,
                then_label,
                else_label,
            } => write!(f, "cbr {cond}, {then_label}, {else_label}"),
            Instr::Ret { value } => match value {
                Some(value) => write!(f, "ret {value}"),
                None => write!(f, "ret"),
            },
            Instr::Trap { message } => write!(f, "trap {message:?}"),
            Instr::EhPush { handler } => write!(f, "eh.push {handler}"),
            Instr::EhPop => write!(f, "eh.pop"),
            Instr::EhResumeSame => write!(f, "eh.resume.same"),
            Instr::EhResumeNext => write!(f, "eh.resume.next"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FunctionBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_listing_is_stable() {
        let mut module = Module::new();
        module.declare_extern("rt_print_i64", vec![Ty::I64], Ty::Void);
        let mut builder = FunctionBuilder::new("@main", Vec::new(), Ty::I64);
        let v0 = builder.value();
        builder.emit(Instr::ConstI64 { dst: v0, value: 42 });
        builder.emit(Instr::Call {
            dst: None,
            callee: "rt_print_i64".to_string(),
            args: vec![v0],
        });
        builder.emit(Instr::Ret { value: Some(v0) });
        module.functions.push(builder.finish());

        let listing = module.to_string();
        let expected = "extern rt_print_i64(i64) -> void\n\
                        fn @main() -> i64 {\n\
                        entry:\n  \
                        %0 = const.i64 42\n  \
                        call rt_print_i64(%0)\n  \
                        ret %0\n\
                        }\n";
        assert_eq!(listing, expected);
    }
}
