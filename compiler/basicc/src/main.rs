//! `basicc` — compile a BASIC source file to IL.
//!
//! Usage: `basicc [--no-bounds-checks] [--dump-ast] [--dump-il] FILE`

use std::process::ExitCode;

use basic_diagnostic::SourceManager;
use basicc::{compile_basic, CompileInput, CompileOptions};
use tracing_subscriber::EnvFilter;

struct Args {
    path: String,
    bounds_checks: bool,
    dump_ast: bool,
    dump_il: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut path = None;
    let mut bounds_checks = true;
    let mut dump_ast = false;
    let mut dump_il = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--no-bounds-checks" => bounds_checks = false,
            "--dump-ast" => dump_ast = true,
            "--dump-il" => dump_il = true,
            "--help" | "-h" => {
                return Err("usage: basicc [--no-bounds-checks] [--dump-ast] [--dump-il] FILE"
                    .to_string())
            }
            flag if flag.starts_with('-') => {
                return Err(format!("unknown flag '{flag}'"));
            }
            file => {
                if path.replace(file.to_string()).is_some() {
                    return Err("expected exactly one input file".to_string());
                }
            }
        }
    }
    let path = path.ok_or_else(|| "expected an input file".to_string())?;
    Ok(Args {
        path,
        bounds_checks,
        dump_ast,
        dump_il,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let source = match std::fs::read_to_string(&args.path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}: {err}", args.path);
            return ExitCode::from(2);
        }
    };

    let mut sm = SourceManager::new();
    let result = compile_basic(
        CompileInput {
            source: &source,
            path: Some(&args.path),
            file_id: None,
        },
        CompileOptions {
            bounds_checks: args.bounds_checks,
        },
        &mut sm,
    );

    if !result.diagnostics().is_empty() {
        eprint!("{}", result.emitter.render_all(&sm));
    }

    if args.dump_ast {
        if let Some(program) = &result.program {
            print!("{}", basic_fmt::dump(program));
        }
    }

    match result.module {
        Some(module) => {
            if args.dump_il {
                print!("{module}");
            }
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    }
}
