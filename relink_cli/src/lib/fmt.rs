// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Formatting diagnostics and reports.

use console::style;
use oxc_diagnostics::OxcDiagnostic;
use relink::CompileError;

use crate::CheckOutcome;

/// Exit the program with parse errors.
pub fn exit_with_parse_errors(errors: Vec<OxcDiagnostic>, source_path: &str, source: &str) -> ! {
    exit_with_diagnostics("SyntaxError:", errors, source_path, source)
}

/// Exit the program with a compile error, rendered against `source`.
pub fn exit_with_compile_error(error: CompileError, source_path: &str, source: &str) -> ! {
    let title = match error {
        CompileError::Parse(_) => "SyntaxError:",
        CompileError::UnsupportedConstruct { .. } | CompileError::UnresolvedBinding { .. } => {
            "CompileError:"
        }
    };
    exit_with_diagnostics(title, error.into_diagnostics(), source_path, source)
}

fn exit_with_diagnostics(
    title: &str,
    errors: Vec<OxcDiagnostic>,
    source_path: &str,
    source: &str,
) -> ! {
    assert!(!errors.is_empty());

    // Needed for color and Unicode output.
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(oxc_diagnostics::GraphicalReportHandler::new())
    }));

    let named_source = miette::NamedSource::new(source_path, source.to_owned());

    eprintln!("{title}");

    for error in errors {
        let report = error.with_source_code(named_source.clone());
        eprintln!("{report:?}");
    }

    std::process::exit(1);
}

/// Prints one line per checked file, followed by the diverging output of
/// files the adapters disagree on.
pub fn print_check(path: &str, outcome: &CheckOutcome) {
    match outcome {
        CheckOutcome::Same => println!("{} {path}", style("ok").green()),
        CheckOutcome::LiteRejected => {
            println!("{} {path} (lite parser declined)", style("ok").green())
        }
        CheckOutcome::Differ { oxc, lite } => {
            println!("{} {path}", style("mismatch").red().bold());
            println!("{}", style("--- oxc").dim());
            print!("{oxc}");
            println!("{}", style("--- lite").dim());
            print!("{lite}");
        }
        CheckOutcome::Failed(error) => println!("{} {path}: {error}", style("error").red()),
    }
}
