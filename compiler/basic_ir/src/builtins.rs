//! Builtin function registry.
//!
//! A static descriptor table maps each builtin id to its surface name,
//! arity range, result-type rule, and the runtime symbols the lowerer may
//! emit for it. Lookup by name is case-insensitive and the trailing `$` on
//! string-returning builtins is optional (`LEFT` and `LEFT$` are the same
//! builtin).

use crate::Type;

/// Enumerated builtin functions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum Builtin {
    Len,
    Mid,
    Left,
    Right,
    Instr,
    Ltrim,
    Rtrim,
    Trim,
    Ucase,
    Lcase,
    Chr,
    Asc,
    Str,
    Val,
    Int,
    Fix,
    Round,
    Sqr,
    Abs,
    Sgn,
    Rnd,
    Eof,
    Lof,
    Loc,
    Err,
}

/// How a builtin's result type is derived.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ResultRule {
    /// Always the given scalar type.
    Fixed(Type),
    /// Numeric result following the argument (`ABS`, `SGN`).
    SameAsArg,
}

/// Coarse argument type used to select a runtime symbol variant.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ArgType {
    Any,
    Str,
    I64,
    F64,
}

/// One runtime symbol a builtin may lower to.
///
/// `arity` of 0 means the variant applies at any arity; otherwise the
/// variant is only selected when the call has exactly that many arguments
/// (`MID$` maps to `rt_mid2`/`rt_mid3`).
#[derive(Copy, Clone, Debug)]
pub struct RuntimeVariant {
    pub symbol: &'static str,
    pub arg: ArgType,
    pub arity: u8,
}

const fn variant(symbol: &'static str, arg: ArgType, arity: u8) -> RuntimeVariant {
    RuntimeVariant { symbol, arg, arity }
}

/// Descriptor of one builtin.
#[derive(Clone, Debug)]
pub struct BuiltinDescriptor {
    pub builtin: Builtin,
    /// Mnemonic used by the AST printer (includes `$` where the surface
    /// syntax carries it).
    pub name: &'static str,
    pub min_args: u8,
    pub max_args: u8,
    pub result: ResultRule,
    pub variants: &'static [RuntimeVariant],
}

use ArgType as A;
use ResultRule as R;
use Type as T;

static DESCRIPTORS: [BuiltinDescriptor; 25] = [
    BuiltinDescriptor {
        builtin: Builtin::Len,
        name: "LEN",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::I64),
        variants: &[variant("rt_len", A::Str, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Mid,
        name: "MID$",
        min_args: 2,
        max_args: 3,
        result: R::Fixed(T::Str),
        variants: &[variant("rt_mid2", A::Any, 2), variant("rt_mid3", A::Any, 3)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Left,
        name: "LEFT$",
        min_args: 2,
        max_args: 2,
        result: R::Fixed(T::Str),
        variants: &[variant("rt_left", A::Any, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Right,
        name: "RIGHT$",
        min_args: 2,
        max_args: 2,
        result: R::Fixed(T::Str),
        variants: &[variant("rt_right", A::Any, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Instr,
        name: "INSTR",
        min_args: 2,
        max_args: 3,
        result: R::Fixed(T::I64),
        variants: &[
            variant("rt_instr2", A::Any, 2),
            variant("rt_instr3", A::Any, 3),
        ],
    },
    BuiltinDescriptor {
        builtin: Builtin::Ltrim,
        name: "LTRIM$",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::Str),
        variants: &[variant("rt_ltrim", A::Str, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Rtrim,
        name: "RTRIM$",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::Str),
        variants: &[variant("rt_rtrim", A::Str, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Trim,
        name: "TRIM$",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::Str),
        variants: &[variant("rt_trim", A::Str, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Ucase,
        name: "UCASE$",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::Str),
        variants: &[variant("rt_ucase", A::Str, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Lcase,
        name: "LCASE$",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::Str),
        variants: &[variant("rt_lcase", A::Str, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Chr,
        name: "CHR$",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::Str),
        variants: &[variant("rt_chr", A::I64, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Asc,
        name: "ASC",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::I64),
        variants: &[variant("rt_asc", A::Str, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Str,
        name: "STR$",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::Str),
        variants: &[
            variant("rt_int_to_str", A::I64, 0),
            variant("rt_f64_to_str", A::F64, 0),
        ],
    },
    BuiltinDescriptor {
        builtin: Builtin::Val,
        name: "VAL",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::F64),
        variants: &[variant("rt_val", A::Str, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Int,
        name: "INT",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::F64),
        variants: &[variant("rt_floor", A::F64, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Fix,
        name: "FIX",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::F64),
        variants: &[variant("rt_trunc", A::F64, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Round,
        name: "ROUND",
        min_args: 1,
        max_args: 2,
        result: R::Fixed(T::F64),
        variants: &[
            variant("rt_round1", A::Any, 1),
            variant("rt_round2", A::Any, 2),
        ],
    },
    BuiltinDescriptor {
        builtin: Builtin::Sqr,
        name: "SQR",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::F64),
        variants: &[variant("rt_sqrt", A::F64, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Abs,
        name: "ABS",
        min_args: 1,
        max_args: 1,
        result: R::SameAsArg,
        variants: &[
            variant("rt_abs_i64", A::I64, 0),
            variant("rt_abs_f64", A::F64, 0),
        ],
    },
    BuiltinDescriptor {
        builtin: Builtin::Sgn,
        name: "SGN",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::I64),
        variants: &[
            variant("rt_sgn_i64", A::I64, 0),
            variant("rt_sgn_f64", A::F64, 0),
        ],
    },
    BuiltinDescriptor {
        builtin: Builtin::Rnd,
        name: "RND",
        min_args: 0,
        max_args: 0,
        result: R::Fixed(T::F64),
        variants: &[variant("rt_rnd", A::Any, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Eof,
        name: "EOF",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::I64),
        variants: &[variant("rt_eof_ch", A::I64, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Lof,
        name: "LOF",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::I64),
        variants: &[variant("rt_lof_ch", A::I64, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Loc,
        name: "LOC",
        min_args: 1,
        max_args: 1,
        result: R::Fixed(T::I64),
        variants: &[variant("rt_loc_ch", A::I64, 0)],
    },
    BuiltinDescriptor {
        builtin: Builtin::Err,
        name: "ERR",
        min_args: 0,
        max_args: 0,
        result: R::Fixed(T::I64),
        variants: &[variant("rt_err", A::Any, 0)],
    },
];

/// Descriptor for a builtin id.
#[inline]
pub fn descriptor(builtin: Builtin) -> &'static BuiltinDescriptor {
    &DESCRIPTORS[builtin as usize]
}

/// Resolve a surface identifier to a builtin id.
///
/// Matching is case-insensitive; a trailing `$` is stripped before
/// comparison so `mid$`, `MID`, and `MID$` all resolve to `Builtin::Mid`.
pub fn builtin_by_name(name: &str) -> Option<Builtin> {
    let bare = name.strip_suffix('$').unwrap_or(name);
    DESCRIPTORS.iter().find_map(|desc| {
        let desc_bare = desc.name.strip_suffix('$').unwrap_or(desc.name);
        desc_bare.eq_ignore_ascii_case(bare).then_some(desc.builtin)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_descriptor_table_is_indexed_by_ordinal() {
        for (index, desc) in DESCRIPTORS.iter().enumerate() {
            assert_eq!(desc.builtin as usize, index, "descriptor {}", desc.name);
        }
    }

    #[test]
    fn test_lookup_is_case_and_sigil_insensitive() {
        assert_eq!(builtin_by_name("mid$"), Some(Builtin::Mid));
        assert_eq!(builtin_by_name("MID"), Some(Builtin::Mid));
        assert_eq!(builtin_by_name("Left"), Some(Builtin::Left));
        assert_eq!(builtin_by_name("LEN"), Some(Builtin::Len));
        assert_eq!(builtin_by_name("len$"), Some(Builtin::Len));
        assert_eq!(builtin_by_name("nope"), None);
    }

    #[test]
    fn test_arity_ranges() {
        assert_eq!(descriptor(Builtin::Mid).min_args, 2);
        assert_eq!(descriptor(Builtin::Mid).max_args, 3);
        assert_eq!(descriptor(Builtin::Rnd).max_args, 0);
    }
}
