// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Utilities for the relink cli program.
//!
//! > [!IMPORTANT]
//! > This library is currently mainly aimed at internal use and might not
//! > adhere to semver versioning.

mod fmt;
mod loader;

pub use fmt::{exit_with_compile_error, exit_with_parse_errors, print_check};
pub use loader::{DiskLoader, LoadError, LoadedGraph};

use relink::{CompileError, CompileOptions, ParserKind, compile};

/// Result of compiling one file with every parser adapter.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Both adapters produced the same code.
    Same,
    /// The lite adapter cannot parse the file; oxc can.
    LiteRejected,
    /// Both adapters parsed the file but disagree on the output.
    Differ { oxc: String, lite: String },
    /// The file does not compile at all.
    Failed(CompileError),
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckOutcome::Same | CheckOutcome::LiteRejected)
    }
}

/// Compiles `source` with both parser adapters and compares the output.
pub fn check_source(source: &str) -> CheckOutcome {
    let compile_with = |kind: ParserKind| {
        let options = CompileOptions {
            parse: kind.parse_fn(),
            ..Default::default()
        };
        compile(source, &options).map(|output| output.code)
    };
    let oxc = match compile_with(ParserKind::Oxc) {
        Ok(code) => code,
        Err(error) => return CheckOutcome::Failed(error),
    };
    match compile_with(ParserKind::Lite) {
        Ok(lite) if lite == oxc => CheckOutcome::Same,
        Ok(lite) => CheckOutcome::Differ { oxc, lite },
        Err(CompileError::Parse(_)) => CheckOutcome::LiteRejected,
        Err(error) => CheckOutcome::Failed(error),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn check_reports_agreement() {
        assert!(matches!(
            check_source("import { a } from './a';\nexport default a;\n"),
            CheckOutcome::Same
        ));
        assert!(matches!(
            check_source("import { caf\\u00e9 } from './a';\n"),
            CheckOutcome::LiteRejected
        ));
        assert!(matches!(
            check_source("export {"),
            CheckOutcome::Failed(CompileError::Parse(_))
        ));
    }
}
