// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use oxc_diagnostics::OxcDiagnostic;
use oxc_span::Span;
use thiserror::Error;

use crate::module::{ModuleId, value::Value};

/// Malformed source text. Carries every diagnostic the parser produced.
#[derive(Debug)]
pub struct ParseFailure {
    pub diagnostics: Vec<OxcDiagnostic>,
}

impl ParseFailure {
    pub fn new(mut diagnostics: Vec<OxcDiagnostic>) -> Self {
        if diagnostics.is_empty() {
            diagnostics.push(OxcDiagnostic::error("Unexpected end of input"));
        }
        Self { diagnostics }
    }

    pub fn single(diagnostic: OxcDiagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diagnostics.as_slice() {
            [] => f.write_str("parse failure"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

impl std::error::Error for ParseFailure {}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseFailure),
    /// The module uses syntax the live-binding protocol cannot express.
    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct { construct: String, span: Span },
    /// An import names something its source module does not export.
    #[error("'{name}' is not exported by '{specifier}'")]
    UnresolvedBinding {
        specifier: String,
        name: String,
        span: Span,
    },
}

impl CompileError {
    pub(crate) fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        Self::UnsupportedConstruct {
            construct: construct.into(),
            span,
        }
    }

    /// Converts the error into diagnostics that can be rendered against the
    /// module's source text.
    pub fn into_diagnostics(self) -> Vec<OxcDiagnostic> {
        match self {
            CompileError::Parse(failure) => failure.diagnostics,
            CompileError::UnsupportedConstruct { construct, span } => {
                vec![OxcDiagnostic::error(format!("Unsupported construct: {construct}")).with_label(span)]
            }
            CompileError::UnresolvedBinding {
                specifier,
                name,
                span,
            } => vec![
                OxcDiagnostic::error(format!("'{name}' is not exported by '{specifier}'"))
                    .with_label(span),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The name was never installed, and no star export provides it.
    #[error("no binding named '{name}' is installed")]
    Missing { name: String },
    #[error("binding '{name}' is already installed")]
    AlreadyInstalled { name: String },
    /// Resolving the name leads back to itself through re-exports.
    #[error("binding '{name}' resolves circularly")]
    Circular { name: String },
}

#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("module '{0}' is not part of the module graph")]
    UnknownModule(ModuleId),
    #[error("module '{0}' is already part of the module graph")]
    DuplicateModule(ModuleId),
    /// Only modules the host registered can have their exports replaced by
    /// host-side slots.
    #[error("module '{0}' was not preloaded by the host and cannot be upgraded")]
    NotPreloaded(ModuleId),
    #[error("module '{module}' imports '{name}' from '{specifier}', which does not export it")]
    UnresolvedBinding {
        module: ModuleId,
        specifier: ModuleId,
        name: String,
    },
    #[error(transparent)]
    Binding(#[from] BindingError),
    /// A module body failed. Importers that were waiting on it fail with the
    /// same error.
    #[error("module '{module}' failed to evaluate: {source}")]
    Evaluation {
        module: ModuleId,
        source: Box<ExecutionError>,
    },
    #[error("Uncaught {0}")]
    Thrown(Value),
    #[error("cannot assign to import binding '{name}'")]
    ImportAssignment { name: String },
    #[error("module '{module}' has no binding named '{name}'")]
    UnknownLocal { module: ModuleId, name: String },
    #[error("{0} is not a function")]
    NotCallable(String),
}

impl ExecutionError {
    /// Throws `value` from a module body or native function.
    pub fn throw(value: impl Into<Value>) -> Self {
        Self::Thrown(value.into())
    }

    /// The module whose body failed, if this is an evaluation failure.
    pub fn failed_module(&self) -> Option<&ModuleId> {
        match self {
            ExecutionError::Evaluation { module, .. } => Some(module),
            _ => None,
        }
    }
}
