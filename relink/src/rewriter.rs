// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Import/export rewriter
//!
//! Lowers the raw import and export declarations of a [`ModuleTree`] into
//! the live-binding protocol:
//!
//! 1. One `InstallExports` item first, with an accessor for every local
//!    export. Accessors are installed before any of the module's own code
//!    runs, which is what lets cyclic importers find them.
//! 2. One link per requested module, in request order: a namespace binding
//!    for imports, followed by the module's re-exports.
//! 3. The module's statements in source order, with every reference to an
//!    imported binding replaced by a read through its namespace.

use ahash::{AHashMap, AHashSet};
use oxc_span::Span;
use tracing::debug;

use crate::{
    ast::{
        DefaultValue, Edit, ExportAccessor, ExportDeclaration, ImportName, InstallExports, Item,
        Link, LinkKind, ModuleTree, Reference, ReferenceKind, ReexportName, Statement,
    },
    codegen::{is_identifier_name, quote},
    error::CompileError,
};

/// Answers whether a module exports a name.
pub trait ResolveExports {
    /// Whether the module `specifier` exports `name`. Returns `None` for
    /// modules the resolver knows nothing about; imports from those are not
    /// checked.
    fn provides(&self, specifier: &str, name: &str) -> Option<bool>;
}

/// Export names of a set of parsed modules, keyed by the specifier other
/// modules import them with.
#[derive(Debug, Default)]
pub struct ExportTable {
    modules: AHashMap<String, TableEntry>,
}

#[derive(Debug, Default)]
struct TableEntry {
    names: AHashSet<String>,
    stars: Vec<String>,
}

impl ExportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the exports of `tree`. Sources of `export *` are kept as
    /// written and looked up in the same table.
    pub fn insert(&mut self, specifier: impl Into<String>, tree: &ModuleTree) {
        let entry = TableEntry {
            names: tree.exported_names().into_iter().map(String::from).collect(),
            stars: tree.star_exports().into_iter().map(String::from).collect(),
        };
        self.modules.insert(specifier.into(), entry);
    }

    /// Records a module that is not parsed, such as a host built-in.
    pub fn insert_names<I, S>(&mut self, specifier: impl Into<String>, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = TableEntry {
            names: names.into_iter().map(Into::into).collect(),
            stars: Vec::new(),
        };
        self.modules.insert(specifier.into(), entry);
    }

    pub fn contains(&self, specifier: &str) -> bool {
        self.modules.contains_key(specifier)
    }

    fn provides_inner<'a>(&'a self, specifier: &'a str, name: &str, visited: &mut Vec<&'a str>) -> bool {
        if visited.contains(&specifier) {
            return false;
        }
        visited.push(specifier);
        let Some(entry) = self.modules.get(specifier) else {
            return false;
        };
        entry.names.contains(name)
            || (name != "default"
                && entry
                    .stars
                    .iter()
                    .any(|star| self.provides_inner(star, name, visited)))
    }
}

impl ResolveExports for ExportTable {
    fn provides(&self, specifier: &str, name: &str) -> Option<bool> {
        if !self.contains(specifier) {
            return None;
        }
        Some(self.provides_inner(specifier, name, &mut Vec::new()))
    }
}

/// Per-source link state, in module request order.
#[derive(Debug, Default)]
struct SourceLinks {
    /// Whether an import declaration names this source.
    imported: bool,
    /// `import * as` locals, in source order.
    namespaces: Vec<String>,
    /// Generated binding that named imports are read through. Never a
    /// source name, so no inner scope can shadow it.
    reads: Option<String>,
    reexports: Vec<ReexportName>,
    reexport_all: bool,
}

pub(crate) struct Rewriter<'a> {
    runtime: &'a str,
    resolver: Option<&'a dyn ResolveExports>,
    /// Generated names, so that no two are alike.
    generated: AHashSet<String>,
}

impl<'a> Rewriter<'a> {
    pub(crate) fn new(runtime: &'a str, resolver: Option<&'a dyn ResolveExports>) -> Self {
        Self {
            runtime,
            resolver,
            generated: AHashSet::default(),
        }
    }

    pub(crate) fn rewrite(mut self, mut tree: ModuleTree) -> Result<ModuleTree, CompileError> {
        if let Some(offset) = tree.top_level_await {
            return Err(CompileError::unsupported(
                "top-level await",
                Span::new(offset, offset),
            ));
        }
        for item in &tree.items {
            if let Item::Statement(statement) = item
                && is_using_declaration(tree.text(statement.span))
            {
                return Err(CompileError::unsupported(
                    "`using` declaration",
                    statement.span,
                ));
            }
        }
        if !tree.has_module_syntax() {
            return Ok(tree);
        }
        self.check_declarations(&tree)?;

        // 1. Map every import local to where it comes from, and give each
        //    source with named imports a generated binding to read them
        //    through.
        let mut sources: Vec<(String, SourceLinks)> = tree
            .module_requests()
            .into_iter()
            .map(|specifier| (specifier.to_owned(), SourceLinks::default()))
            .collect();
        let source_index = |sources: &[(String, SourceLinks)], specifier: &str| {
            sources
                .iter()
                .position(|(source, _)| source == specifier)
                .unwrap_or_default()
        };
        let mut imports: AHashMap<String, (usize, ImportName)> = AHashMap::default();
        for item in &tree.items {
            let Item::Import(import) = item else {
                continue;
            };
            let index = source_index(&sources, &import.source);
            sources[index].1.imported = true;
            for specifier in &import.specifiers {
                if specifier.imported == ImportName::Namespace {
                    sources[index].1.namespaces.push(specifier.local.clone());
                }
                imports.insert(specifier.local.clone(), (index, specifier.imported.clone()));
            }
        }
        let named: AHashSet<usize> = imports
            .values()
            .filter(|(_, import)| import.name().is_some())
            .map(|(index, _)| *index)
            .collect();
        for (index, (specifier, links)) in sources.iter_mut().enumerate() {
            if named.contains(&index) {
                links.reads = Some(self.unique_name(&tree, &stem(specifier)));
            }
        }

        // 2. Collect exports and re-exports, rewrite the rest.
        let mut accessors = Vec::new();
        let mut body = Vec::new();
        let items = std::mem::take(&mut tree.items);
        for item in items {
            match item {
                Item::Import(_) => {}
                Item::Export(export) => match export {
                    ExportDeclaration::Declaration {
                        declaration,
                        names,
                        references,
                        ..
                    } => {
                        accessors.extend(names.into_iter().map(|name| ExportAccessor {
                            exported: name.clone(),
                            local: name,
                        }));
                        let edits = self.edits(&tree, &sources, &imports, &references)?;
                        body.push(Item::Statement(Statement {
                            span: declaration,
                            references,
                            edits,
                        }));
                    }
                    ExportDeclaration::DefaultDeclaration {
                        declaration,
                        name,
                        references,
                        ..
                    } => {
                        accessors.push(ExportAccessor {
                            exported: "default".into(),
                            local: name,
                        });
                        let edits = self.edits(&tree, &sources, &imports, &references)?;
                        body.push(Item::Statement(Statement {
                            span: declaration,
                            references,
                            edits,
                        }));
                    }
                    ExportDeclaration::DefaultExpression {
                        expression,
                        function_params,
                        references,
                        ..
                    } => {
                        let local = self.unique_name(&tree, "_default");
                        accessors.push(ExportAccessor {
                            exported: "default".into(),
                            local: local.clone(),
                        });
                        let mut edits = self.edits(&tree, &sources, &imports, &references)?;
                        // An anonymous function declaration keeps hoisting
                        // once it is named.
                        if let Some(params) = function_params {
                            let before = tree.source[..params as usize].chars().next_back();
                            let text = match before {
                                Some(c) if c == '$' || c == '_' || c.is_alphanumeric() => {
                                    format!(" {local}")
                                }
                                _ => local.clone(),
                            };
                            edits.insert(0, Edit {
                                span: Span::new(params, params),
                                text,
                            });
                        }
                        body.push(Item::DefaultValue(DefaultValue {
                            local,
                            expression,
                            edits,
                            hoisted: function_params.is_some(),
                        }));
                    }
                    ExportDeclaration::Named { specifiers, .. } => {
                        for specifier in specifiers {
                            match imports.get(&specifier.local) {
                                // Exporting a named import re-exports it.
                                Some((index, import @ ImportName::Name(_))) => {
                                    sources[*index].1.reexports.push(ReexportName {
                                        exported: specifier.exported,
                                        imported: import.clone(),
                                    });
                                }
                                Some((_, ImportName::Namespace)) | None => {
                                    accessors.push(ExportAccessor {
                                        exported: specifier.exported,
                                        local: specifier.local,
                                    });
                                }
                            }
                        }
                    }
                    ExportDeclaration::From {
                        source, specifiers, ..
                    } => {
                        let index = source_index(&sources, &source);
                        sources[index].1.reexports.extend(specifiers.into_iter().map(
                            |specifier| ReexportName {
                                exported: specifier.exported,
                                imported: ImportName::Name(specifier.imported),
                            },
                        ));
                    }
                    ExportDeclaration::All {
                        source, exported, ..
                    } => {
                        let index = source_index(&sources, &source);
                        match exported {
                            Some(exported) => sources[index].1.reexports.push(ReexportName {
                                exported,
                                imported: ImportName::Namespace,
                            }),
                            None => sources[index].1.reexport_all = true,
                        }
                    }
                },
                Item::Statement(mut statement) => {
                    statement.edits =
                        self.edits(&tree, &sources, &imports, &statement.references)?;
                    body.push(Item::Statement(statement));
                }
                item => body.push(item),
            }
        }

        // 3. Exports first, then links, then the body.
        let mut items = Vec::with_capacity(body.len() + sources.len() + 1);
        if !accessors.is_empty() {
            items.push(Item::InstallExports(InstallExports {
                runtime: self.runtime.to_owned(),
                accessors,
            }));
        }
        for (source, links) in sources {
            if links.imported {
                let mut bindings = links.namespaces;
                bindings.extend(links.reads);
                items.push(self.link(&source, LinkKind::Import { bindings }));
            }
            if !links.reexports.is_empty() {
                items.push(self.link(&source, LinkKind::Reexport(links.reexports)));
            }
            if links.reexport_all {
                items.push(self.link(&source, LinkKind::ReexportAll));
            }
        }
        items.extend(body);
        debug!(items = items.len(), "rewrote module");
        tree.items = items;
        Ok(tree)
    }

    fn link(&self, source: &str, kind: LinkKind) -> Item {
        Item::Link(Link {
            runtime: self.runtime.to_owned(),
            source: source.to_owned(),
            kind,
        })
    }

    /// Rejects declarations the protocol cannot express and imports the
    /// resolver knows to be missing.
    fn check_declarations(&self, tree: &ModuleTree) -> Result<(), CompileError> {
        for item in &tree.items {
            match item {
                Item::Import(import) => {
                    if let Some(phase) = import.phase {
                        return Err(CompileError::unsupported(format!("import {phase}"), import.span));
                    }
                    if import.attributes {
                        return Err(CompileError::unsupported("import attributes", import.span));
                    }
                    for specifier in &import.specifiers {
                        if let Some(name) = specifier.imported.name() {
                            self.check_provided(&import.source, name, import.span)?;
                        }
                    }
                }
                Item::Export(ExportDeclaration::From {
                    span,
                    source,
                    specifiers,
                    attributes,
                }) => {
                    if *attributes {
                        return Err(CompileError::unsupported("import attributes", *span));
                    }
                    for specifier in specifiers {
                        self.check_provided(source, &specifier.imported, *span)?;
                    }
                }
                Item::Export(ExportDeclaration::All {
                    span,
                    attributes: true,
                    ..
                }) => {
                    return Err(CompileError::unsupported("import attributes", *span));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_provided(&self, specifier: &str, name: &str, span: Span) -> Result<(), CompileError> {
        match self.resolver.and_then(|resolver| resolver.provides(specifier, name)) {
            Some(false) => Err(CompileError::UnresolvedBinding {
                specifier: specifier.to_owned(),
                name: name.to_owned(),
                span,
            }),
            _ => Ok(()),
        }
    }

    /// Replacement text for every import reference of an item.
    fn edits(
        &self,
        tree: &ModuleTree,
        sources: &[(String, SourceLinks)],
        imports: &AHashMap<String, (usize, ImportName)>,
        references: &[Reference],
    ) -> Result<Vec<Edit>, CompileError> {
        let mut edits = Vec::with_capacity(references.len());
        for reference in references {
            let Some((index, import)) = imports.get(&reference.name) else {
                continue;
            };
            if reference.kind == ReferenceKind::Write {
                return Err(CompileError::unsupported(
                    format!("assignment to imported binding '{}'", reference.name),
                    reference.span,
                ));
            }
            // Namespace locals are declared by their link and read as is.
            let (ImportName::Name(name), Some(reads)) = (import, &sources[*index].1.reads) else {
                continue;
            };
            let read = member(reads, name);
            let text = match reference.kind {
                ReferenceKind::ShorthandProperty => format!("{}: {read}", reference.name),
                _ if is_callee(tree, reference.span) => format!("(0, {read})"),
                _ => read,
            };
            edits.push(Edit {
                span: reference.span,
                text,
            });
        }
        Ok(edits)
    }

    /// `base`, or `base` with a numeric suffix, such that the name occurs
    /// nowhere in the source and was not generated before.
    fn unique_name(&mut self, tree: &ModuleTree, base: &str) -> String {
        let mut candidate = base.to_owned();
        let mut suffix = 1;
        while tree.source.contains(candidate.as_str()) || self.generated.contains(&candidate) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        self.generated.insert(candidate.clone());
        candidate
    }
}

/// `_name` for the last path segment of a specifier, without extension.
fn stem(specifier: &str) -> String {
    let segment = specifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(specifier);
    let segment = match segment.rfind('.') {
        Some(dot) if dot > 0 => &segment[..dot],
        _ => segment,
    };
    let mut name = String::with_capacity(segment.len() + 1);
    name.push('_');
    name.extend(segment.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            c
        } else {
            '_'
        }
    }));
    if name.chars().all(|c| c == '_') {
        name = "_module".to_owned();
    }
    name
}

fn member(object: &str, name: &str) -> String {
    if is_identifier_name(name) {
        format!("{object}.{name}")
    } else {
        format!("{object}[{}]", quote(name))
    }
}

/// Whether the reference at `span` is called or used as a template tag, in
/// which case reading it through the namespace must not bind `this`.
fn is_callee(tree: &ModuleTree, span: Span) -> bool {
    let rest = skip_trivia(&tree.source[span.end as usize..]);
    if let Some(rest) = rest.strip_prefix("?.") {
        return skip_trivia(rest).starts_with('(');
    }
    rest.starts_with('(') || rest.starts_with('`')
}

/// `text` without leading whitespace and comments.
fn skip_trivia(mut text: &str) -> &str {
    loop {
        text = text.trim_start();
        if let Some(rest) = text.strip_prefix("//") {
            text = rest
                .find(['\n', '\r', '\u{2028}', '\u{2029}'])
                .map_or("", |end| &rest[end..]);
        } else if let Some(rest) = text.strip_prefix("/*") {
            text = rest.find("*/").map_or("", |end| &rest[end + 2..]);
        } else {
            return text;
        }
    }
}

fn is_using_declaration(text: &str) -> bool {
    let text = text
        .strip_prefix("await")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map_or(text, str::trim_start);
    let Some(rest) = text.strip_prefix("using") else {
        return false;
    };
    let binding = rest.trim_start_matches([' ', '\t']);
    binding.len() < rest.len()
        && binding.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '$')
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{codegen::print, parsers::oxc::parse};

    fn rewrite(source: &str) -> Result<String, CompileError> {
        let tree = parse(source)?;
        Rewriter::new("module", None).rewrite(tree).map(|tree| print(&tree))
    }

    #[test]
    fn hoists_exports_and_links_imports() {
        let code = rewrite(
            "import { value, reset } from './live.js';\n\
             reset();\n\
             console.log(value, { value });\n\
             export let count = 1;\n\
             export default value + count;\n",
        )
        .unwrap();
        assert_eq!(
            code,
            "module.export({ count: () => count, default: () => _default });\n\
             var _live = module.import(\"./live.js\");\n\
             (0, _live.reset)();\n\
             console.log(_live.value, { value: _live.value });\n\
             let count = 1;\n\
             var _default = _live.value + count;\n"
        );
    }

    #[test]
    fn reexports_follow_their_links() {
        let code = rewrite(
            "import * as ns from './ns';\n\
             import { a } from './a';\n\
             export { a as b, ns };\n\
             export * from './all';\n\
             export { c as 'd-e' } from './a';\n",
        )
        .unwrap();
        assert_eq!(
            code,
            "module.export({ ns: () => ns });\n\
             var ns = module.import(\"./ns\");\n\
             var _a = module.import(\"./a\");\n\
             module.reexport(\"./a\", { b: \"a\", \"d-e\": \"c\" });\n\
             module.reexportAll(\"./all\");\n"
        );
    }

    #[test]
    fn named_imports_never_read_through_a_shadowable_name() {
        let code = rewrite(
            "import * as ns from './m';\n\
             import * as other from './m';\n\
             import { a } from './m';\n\
             export function f(ns, other) { return [a, ns, other]; }\n",
        )
        .unwrap();
        assert_eq!(
            code,
            "module.export({ f: () => f });\n\
             var ns = module.import(\"./m\"), other = ns, _m = ns;\n\
             function f(ns, other) { return [_m.a, ns, other]; }\n"
        );
    }

    #[test]
    fn anonymous_default_functions_stay_hoisted() {
        let code = rewrite(
            "import { x } from './x';\n\
             export default async function(a = x) { return a; }\n",
        )
        .unwrap();
        assert_eq!(
            code,
            "module.export({ default: () => _default });\n\
             var _x = module.import(\"./x\");\n\
             async function _default(a = _x.x) { return a; }\n"
        );
        let code = rewrite("export default function* () { yield 1; }\n").unwrap();
        assert!(code.ends_with("function* _default() { yield 1; }\n"));
        let code = rewrite("export default class {}\n").unwrap();
        assert!(code.ends_with("var _default = class {};\n"));
    }

    #[test]
    fn callees_are_found_past_comments() {
        let code = rewrite(
            "import { f } from './f';\n\
             f /* c */ (1);\n\
             f // c\n(2);\n\
             f?./* c */(3);\n\
             f /* ( */ + 1;\n",
        )
        .unwrap();
        assert_eq!(
            code,
            "var _f = module.import(\"./f\");\n\
             (0, _f.f) /* c */ (1);\n\
             (0, _f.f) // c\n(2);\n\
             (0, _f.f)?./* c */(3);\n\
             _f.f /* ( */ + 1;\n"
        );
    }

    #[test]
    fn generated_names_avoid_source_text() {
        let code = rewrite(
            "import { x } from './util';\n\
             const _util = 1;\n\
             export default x;\n\
             var _default1;\n",
        )
        .unwrap();
        assert!(code.contains("var _util1 = module.import(\"./util\");"));
        assert!(code.contains("var _default2 = _util1.x;"));
    }

    #[test]
    fn plain_scripts_are_untouched() {
        let tree = parse("let a = 1;\nfunction f() { return a; }\n").unwrap();
        let rewritten = Rewriter::new("module", None).rewrite(tree.clone()).unwrap();
        assert_eq!(rewritten, tree);
    }

    #[test]
    fn unsupported_constructs_are_rejected() {
        let unsupported = |source: &str| {
            let tree = crate::parsers::lite::parse(source).unwrap();
            matches!(
                Rewriter::new("module", None).rewrite(tree),
                Err(CompileError::UnsupportedConstruct { .. })
            )
        };
        assert!(unsupported("import { a } from './a';\na = 2;"));
        assert!(unsupported("import { a } from './a';\n[a] = [2];"));
        assert!(unsupported("const x = await fetch();"));
        assert!(unsupported("import data from './d.json' with { type: 'json' };"));
        assert!(!unsupported("function using(x) {}\nusing(1);"));
    }

    #[test]
    fn resolver_reports_missing_exports() {
        let mut table = ExportTable::new();
        table.insert("./a", &parse("export const a = 1;\nexport * from './b';").unwrap());
        table.insert("./b", &parse("export function b() {}").unwrap());
        table.insert_names("fs", ["readFile"]);

        let check = |source: &str| {
            Rewriter::new("module", Some(&table)).rewrite(parse(source).unwrap())
        };
        assert!(check("import { a, b } from './a';").is_ok());
        assert!(check("import { readFile } from 'fs';").is_ok());
        assert!(check("import { anything } from './unknown';").is_ok());
        assert!(matches!(
            check("import { c } from './a';"),
            Err(CompileError::UnresolvedBinding { ref name, .. }) if name == "c"
        ));
        assert_eq!(table.provides("./a", "default"), Some(false));
    }

    #[test]
    fn stems_are_identifiers() {
        assert_eq!(stem("./live.js"), "_live");
        assert_eq!(stem("lodash/fp"), "_fp");
        assert_eq!(stem("node:fs"), "_node_fs");
        assert_eq!(stem("./dir/"), "_dir");
        assert_eq!(stem("."), "_module");
    }
}
