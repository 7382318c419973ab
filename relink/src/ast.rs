// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser-agnostic module tree.
//!
//! Every parser adapter lowers its own syntax tree into a [`ModuleTree`]: the
//! module's top-level items in source order, with import and export
//! declarations broken out and every other statement kept as a span of the
//! original source text. Statements carry the references they make to
//! imported bindings so that the rewriter never needs to look inside them.

use std::rc::Rc;

use oxc_span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleTree {
    pub source: Rc<str>,
    /// `#!` line at the very start of the file, if any.
    pub hashbang: Option<Span>,
    /// Offset of the first `await` outside of any function, including
    /// `for await`.
    pub top_level_await: Option<u32>,
    pub items: Vec<Item>,
}

impl ModuleTree {
    pub fn new(source: impl Into<Rc<str>>) -> Self {
        Self {
            source: source.into(),
            hashbang: None,
            top_level_await: None,
            items: Vec::new(),
        }
    }

    /// Source text covered by `span`.
    pub fn text(&self, span: Span) -> &str {
        &self.source[span.start as usize..span.end as usize]
    }

    /// Returns true if any top-level item is a raw import or export
    /// declaration.
    pub fn has_module_syntax(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, Item::Import(_) | Item::Export(_)))
    }

    /// Module specifiers requested by this tree, deduplicated, in the order
    /// they first appear.
    pub fn module_requests(&self) -> Vec<&str> {
        let mut requests: Vec<&str> = Vec::new();
        for item in &self.items {
            let specifier = match item {
                Item::Import(import) => import.source.as_str(),
                Item::Export(ExportDeclaration::From { source, .. })
                | Item::Export(ExportDeclaration::All { source, .. }) => source.as_str(),
                Item::Link(link) => link.source.as_str(),
                _ => continue,
            };
            if !requests.contains(&specifier) {
                requests.push(specifier);
            }
        }
        requests
    }

    /// Names this module exports directly, in declaration order. Names
    /// provided through `export * from` are not included.
    pub fn exported_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for item in &self.items {
            match item {
                Item::Export(export) => match export {
                    ExportDeclaration::Declaration { names: bound, .. } => {
                        names.extend(bound.iter().map(String::as_str))
                    }
                    ExportDeclaration::DefaultDeclaration { .. }
                    | ExportDeclaration::DefaultExpression { .. } => names.push("default"),
                    ExportDeclaration::Named { specifiers, .. } => {
                        names.extend(specifiers.iter().map(|s| s.exported.as_str()))
                    }
                    ExportDeclaration::From { specifiers, .. } => {
                        names.extend(specifiers.iter().map(|s| s.exported.as_str()))
                    }
                    ExportDeclaration::All { exported, .. } => {
                        if let Some(exported) = exported {
                            names.push(exported.as_str());
                        }
                    }
                },
                Item::InstallExports(install) => {
                    names.extend(install.accessors.iter().map(|a| a.exported.as_str()))
                }
                Item::Link(Link {
                    kind: LinkKind::Reexport(reexports),
                    ..
                }) => names.extend(reexports.iter().map(|r| r.exported.as_str())),
                _ => {}
            }
        }
        names
    }

    /// Sources of `export * from` declarations, in order.
    pub fn star_exports(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Export(ExportDeclaration::All {
                    source,
                    exported: None,
                    ..
                }) => Some(source.as_str()),
                Item::Link(Link {
                    kind: LinkKind::ReexportAll,
                    source,
                    ..
                }) => Some(source.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Import(ImportDeclaration),
    Export(ExportDeclaration),
    Statement(Statement),
    /// `module.export({ name: () => local, ... })`
    InstallExports(InstallExports),
    /// `var ns = module.import("./x")`, `module.reexport(...)` and friends.
    Link(Link),
    /// `var _default = <expression>;`
    DefaultValue(DefaultValue),
}

impl Item {
    /// The span and reference list of items whose code is kept as source
    /// text.
    pub(crate) fn reference_target(&mut self) -> Option<(Span, &mut Vec<Reference>)> {
        match self {
            Item::Statement(statement) => Some((statement.span, &mut statement.references)),
            Item::Export(ExportDeclaration::Declaration {
                span, references, ..
            })
            | Item::Export(ExportDeclaration::DefaultDeclaration {
                span, references, ..
            })
            | Item::Export(ExportDeclaration::DefaultExpression {
                span, references, ..
            }) => Some((*span, references)),
            _ => None,
        }
    }
}

/// The name an import binds to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportName {
    Name(String),
    /// `import * as ns` and `export * as ns`.
    Namespace,
}

impl ImportName {
    pub fn name(&self) -> Option<&str> {
        match self {
            ImportName::Name(name) => Some(name),
            ImportName::Namespace => None,
        }
    }
}

impl From<&str> for ImportName {
    fn from(value: &str) -> Self {
        ImportName::Name(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub span: Span,
    pub source: String,
    pub specifiers: Vec<ImportSpecifier>,
    /// `import defer`/`import source`.
    pub phase: Option<&'static str>,
    /// `with { type: "json" }`.
    pub attributes: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpecifier {
    pub imported: ImportName,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportDeclaration {
    /// `export var/let/const/function/class ...`
    Declaration {
        span: Span,
        /// From the start of the declaration to the end of the item.
        declaration: Span,
        names: Vec<String>,
        references: Vec<Reference>,
    },
    /// `export default function f() {}` and `export default class C {}`.
    DefaultDeclaration {
        span: Span,
        declaration: Span,
        name: String,
        references: Vec<Reference>,
    },
    /// Any other `export default`.
    DefaultExpression {
        span: Span,
        expression: Span,
        /// Start of the parameter list when the expression is an anonymous
        /// function or generator declaration. Those hoist like named ones.
        function_params: Option<u32>,
        references: Vec<Reference>,
    },
    /// `export { a, b as c }`
    Named {
        span: Span,
        specifiers: Vec<ExportSpecifier>,
    },
    /// `export { a, b as c } from "m"`
    From {
        span: Span,
        source: String,
        specifiers: Vec<ReexportSpecifier>,
        attributes: bool,
    },
    /// `export * from "m"` and `export * as ns from "m"`
    All {
        span: Span,
        source: String,
        exported: Option<String>,
        attributes: bool,
    },
}

impl ExportDeclaration {
    pub fn span(&self) -> Span {
        match self {
            ExportDeclaration::Declaration { span, .. }
            | ExportDeclaration::DefaultDeclaration { span, .. }
            | ExportDeclaration::DefaultExpression { span, .. }
            | ExportDeclaration::Named { span, .. }
            | ExportDeclaration::From { span, .. }
            | ExportDeclaration::All { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReexportSpecifier {
    pub imported: String,
    pub exported: String,
}

/// A top-level statement kept as source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub span: Span,
    pub references: Vec<Reference>,
    /// Replacements applied when printing, sorted and non-overlapping.
    pub edits: Vec<Edit>,
}

impl Statement {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            references: Vec::new(),
            edits: Vec::new(),
        }
    }
}

/// An identifier reference that resolves to a module-level import binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub name: String,
    pub span: Span,
    pub kind: ReferenceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Read,
    Write,
    /// `{ name }` in an object literal.
    ShorthandProperty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstallExports {
    pub runtime: String,
    pub accessors: Vec<ExportAccessor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportAccessor {
    pub exported: String,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub runtime: String,
    pub source: String,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkKind {
    /// Loads the module. The first binding holds its namespace and any
    /// further ones alias it.
    Import { bindings: Vec<String> },
    Reexport(Vec<ReexportName>),
    ReexportAll,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReexportName {
    pub exported: String,
    pub imported: ImportName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultValue {
    pub local: String,
    pub expression: Span,
    pub edits: Vec<Edit>,
    /// The expression is a function declaration named `local` by one of
    /// the edits, printed without a `var`.
    pub hoisted: bool,
}
