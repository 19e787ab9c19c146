//! Runtime call surface.
//!
//! A static table of the runtime symbols the lowerer may reference, with
//! their IL signatures. Externs are declared in the module on first use,
//! so the emitted extern list reflects what the program actually calls.
//!
//! Runtime functions either succeed or trap with a BASIC error code; the
//! trap is routed through the handler installed by `ON ERROR` / `TRY`.

use basic_il::{Module, Ty};

struct RuntimeSig {
    name: &'static str,
    params: &'static [Ty],
    ret: Ty,
}

const SIGS: &[RuntimeSig] = &[
    // Strings
    sig("rt_string_from_bytes", &[Ty::Str], Ty::Str),
    sig("rt_const_cstr", &[Ty::Str], Ty::Str),
    sig("rt_string_ref", &[Ty::Str], Ty::Void),
    sig("rt_string_unref", &[Ty::Str], Ty::Void),
    sig("rt_concat", &[Ty::Str, Ty::Str], Ty::Str),
    sig("rt_substr", &[Ty::Str, Ty::I64, Ty::I64], Ty::Str),
    sig("rt_left", &[Ty::Str, Ty::I64], Ty::Str),
    sig("rt_right", &[Ty::Str, Ty::I64], Ty::Str),
    sig("rt_mid2", &[Ty::Str, Ty::I64], Ty::Str),
    sig("rt_mid3", &[Ty::Str, Ty::I64, Ty::I64], Ty::Str),
    sig("rt_instr2", &[Ty::Str, Ty::Str], Ty::I64),
    sig("rt_instr3", &[Ty::I64, Ty::Str, Ty::Str], Ty::I64),
    sig("rt_ltrim", &[Ty::Str], Ty::Str),
    sig("rt_rtrim", &[Ty::Str], Ty::Str),
    sig("rt_trim", &[Ty::Str], Ty::Str),
    sig("rt_ucase", &[Ty::Str], Ty::Str),
    sig("rt_lcase", &[Ty::Str], Ty::Str),
    sig("rt_chr", &[Ty::I64], Ty::Str),
    sig("rt_asc", &[Ty::Str], Ty::I64),
    sig("rt_len", &[Ty::Str], Ty::I64),
    sig("rt_str_eq", &[Ty::Str, Ty::Str], Ty::I64),
    sig("rt_str_cmp", &[Ty::Str, Ty::Str], Ty::I64),
    sig("rt_to_int", &[Ty::Str], Ty::I64),
    sig("rt_val", &[Ty::Str], Ty::F64),
    sig("rt_int_to_str", &[Ty::I64], Ty::Str),
    sig("rt_f64_to_str", &[Ty::F64], Ty::Str),
    sig("rt_str_d_alloc", &[Ty::F64], Ty::Str),
    sig("rt_str_i32_alloc", &[Ty::I64], Ty::Str),

    // File I/O
    sig("rt_open_err_vstr", &[Ty::Str, Ty::I64, Ty::I64], Ty::I64),
    sig("rt_close_err", &[Ty::I64], Ty::I64),
    sig("rt_write_ch_err", &[Ty::I64, Ty::Str], Ty::I64),
    sig("rt_println_ch_err", &[Ty::I64, Ty::Str], Ty::I64),
    sig("rt_line_input_ch_err", &[Ty::I64], Ty::Str),
    sig("rt_eof_ch", &[Ty::I64], Ty::I64),
    sig("rt_lof_ch", &[Ty::I64], Ty::I64),
    sig("rt_loc_ch", &[Ty::I64], Ty::I64),
    sig("rt_seek_ch_err", &[Ty::I64, Ty::I64], Ty::I64),

    // Console I/O
    sig("rt_print_str", &[Ty::Str], Ty::Void),
    sig("rt_print_i64", &[Ty::I64], Ty::Void),
    sig("rt_print_f64", &[Ty::F64], Ty::Void),
    sig("rt_input_line", &[], Ty::Str),
    sig("rt_split_fields", &[Ty::Str, Ty::I64], Ty::Str),

    // Formatting
    sig("rt_format_f64", &[Ty::F64], Ty::Str),
    sig("rt_i64_to_cstr", &[Ty::I64], Ty::Str),
    sig("rt_u64_to_cstr", &[Ty::I64], Ty::Str),
    sig("rt_csv_quote_alloc", &[Ty::Str], Ty::Str),

    // Math builtins
    sig("rt_sqrt", &[Ty::F64], Ty::F64),
    sig("rt_floor", &[Ty::F64], Ty::F64),
    sig("rt_trunc", &[Ty::F64], Ty::F64),
    sig("rt_round1", &[Ty::F64], Ty::F64),
    sig("rt_round2", &[Ty::F64, Ty::I64], Ty::F64),
    sig("rt_pow", &[Ty::F64, Ty::F64], Ty::F64),
    sig("rt_abs_i64", &[Ty::I64], Ty::I64),
    sig("rt_abs_f64", &[Ty::F64], Ty::F64),
    sig("rt_sgn_i64", &[Ty::I64], Ty::I64),
    sig("rt_sgn_f64", &[Ty::F64], Ty::I64),

    // Random
    sig("rt_randomize_u64", &[Ty::I64], Ty::Void),
    sig("rt_randomize_i64", &[Ty::I64], Ty::Void),
    sig("rt_rnd", &[], Ty::F64),

    // Errors and traps
    sig("rt_trap", &[Ty::Str], Ty::Void),
    sig("rt_err", &[], Ty::I64),
    sig("rt_gosub_push", &[Ty::I64], Ty::Void),
    sig("rt_gosub_pop", &[], Ty::I64),

    // Terminal control
    sig("rt_term_cls", &[], Ty::Void),
    sig("rt_term_color", &[Ty::I64, Ty::I64], Ty::Void),
    sig("rt_term_locate", &[Ty::I64, Ty::I64], Ty::Void),
    sig("rt_term_cursor", &[Ty::I64], Ty::Void),
    sig("rt_term_altscreen", &[Ty::I64], Ty::Void),
    sig("rt_beep", &[], Ty::Void),
    sig("rt_sleep_ms", &[Ty::I64], Ty::Void),

    // Object model
    sig("rt_obj_new", &[Ty::Str], Ty::I64),
    sig("rt_obj_delete", &[Ty::I64], Ty::Void),
    sig("rt_obj_get", &[Ty::I64, Ty::Str], Ty::I64),
    sig("rt_obj_set", &[Ty::I64, Ty::Str, Ty::I64], Ty::Void),
    sig("rt_obj_is", &[Ty::I64, Ty::Str], Ty::I64),
    sig("rt_obj_cast", &[Ty::I64, Ty::Str], Ty::I64),
    sig("rt_method_invoke", &[Ty::I64, Ty::Str], Ty::I64),
    sig("rt_proc_addr", &[Ty::Str], Ty::I64),
];

const fn sig(name: &'static str, params: &'static [Ty], ret: Ty) -> RuntimeSig {
    RuntimeSig { name, params, ret }
}

/// Declare `name` as an extern in the module (idempotent) and return its
/// result type.
pub(crate) fn declare(module: &mut Module, name: &str) -> Ty {
    match SIGS.iter().find(|s| s.name == name) {
        Some(sig) => {
            module.declare_extern(sig.name, sig.params.to_vec(), sig.ret);
            sig.ret
        }
        None => {
            // User functions and synthesized symbols go through here too;
            // they are defined in-module rather than extern.
            Ty::I64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_symbols_declare_with_signature() {
        let mut module = Module::new();
        assert_eq!(declare(&mut module, "rt_concat"), Ty::Str);
        assert_eq!(declare(&mut module, "rt_eof_ch"), Ty::I64);
        assert_eq!(module.externs.len(), 2);
        // Idempotent.
        declare(&mut module, "rt_concat");
        assert_eq!(module.externs.len(), 2);
    }
}
