// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adapter over `oxc_parser` and `oxc_semantic`.

use oxc_allocator::Allocator;
use oxc_ast::{AstKind, ast};
use oxc_diagnostics::OxcDiagnostic;
use oxc_ecmascript::BoundNames;
use oxc_parser::{Parser, ParserReturn};
use oxc_semantic::{SemanticBuilder, SemanticBuilderReturn, SymbolId};
use oxc_span::{GetSpan, SourceType, Span};

use super::attach_references;
use crate::{
    ast::{
        ExportDeclaration, ExportSpecifier, ImportDeclaration, ImportName, ImportSpecifier, Item,
        ModuleTree, Reference, ReferenceKind, ReexportSpecifier, Statement,
    },
    error::ParseFailure,
};

/// Parses `source_text` as an ECMAScript module.
pub fn parse(source_text: &str) -> Result<ModuleTree, ParseFailure> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true);
    let ParserReturn {
        program,
        errors,
        panicked,
        ..
    } = Parser::new(&allocator, source_text, source_type).parse();

    if panicked || !errors.is_empty() {
        return Err(ParseFailure::new(errors));
    }

    let SemanticBuilderReturn { semantic, errors, .. } = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .build(&program);

    if !errors.is_empty() {
        return Err(ParseFailure::new(errors));
    }

    let mut tree = ModuleTree::new(source_text);
    tree.hashbang = program.hashbang.as_ref().map(|hashbang| hashbang.span);

    // Directives are kept apart from the body by oxc but are plain
    // statements as far as the tree is concerned.
    for directive in program.directives.iter() {
        tree.items.push(Item::Statement(Statement::new(directive.span)));
    }

    let mut imported_symbols: Vec<(&str, SymbolId)> = Vec::new();
    for statement in program.body.iter() {
        let item = match statement.as_module_declaration() {
            Some(declaration) => module_declaration(declaration, &mut imported_symbols)?,
            None => match statement {
                ast::Statement::EmptyStatement(_) => continue,
                statement => Item::Statement(Statement::new(statement.span())),
            },
        };
        tree.items.push(item);
    }

    let scoping = semantic.scoping();
    let nodes = semantic.nodes();

    tree.top_level_await = nodes
        .iter()
        .filter_map(|node| match node.kind() {
            AstKind::AwaitExpression(expression) => Some((node, expression.span.start)),
            AstKind::ForOfStatement(statement) if statement.r#await => {
                Some((node, statement.span.start))
            }
            _ => None,
        })
        .filter(|(node, _)| {
            !scoping
                .scope_ancestors(node.scope_id())
                .any(|scope_id| scoping.scope_flags(scope_id).is_function())
        })
        .map(|(_, start)| start)
        .min();

    let mut references = Vec::new();
    for (name, symbol_id) in imported_symbols {
        for reference in scoping.get_resolved_references(symbol_id) {
            let node_id = reference.node_id();
            let kind = if reference.is_write() {
                ReferenceKind::Write
            } else if matches!(
                nodes.parent_kind(node_id),
                AstKind::ObjectProperty(property) if property.shorthand
            ) {
                ReferenceKind::ShorthandProperty
            } else {
                ReferenceKind::Read
            };
            references.push(Reference {
                name: name.to_owned(),
                span: nodes.get_node(node_id).kind().span(),
                kind,
            });
        }
    }
    attach_references(&mut tree.items, references);

    Ok(tree)
}

fn unsupported_typescript(span: Span) -> ParseFailure {
    ParseFailure::single(
        OxcDiagnostic::error("TypeScript module syntax is not supported").with_label(span),
    )
}

fn module_declaration<'s>(
    declaration: &'s ast::ModuleDeclaration<'_>,
    imported_symbols: &mut Vec<(&'s str, SymbolId)>,
) -> Result<Item, ParseFailure> {
    let item = match declaration {
        ast::ModuleDeclaration::ImportDeclaration(decl) => {
            let mut specifiers = Vec::new();
            for specifier in decl.specifiers.iter().flatten() {
                let (imported, local) = match specifier {
                    ast::ImportDeclarationSpecifier::ImportSpecifier(specifier) => (
                        ImportName::from(specifier.imported.name().as_str()),
                        &specifier.local,
                    ),
                    ast::ImportDeclarationSpecifier::ImportDefaultSpecifier(specifier) => {
                        (ImportName::from("default"), &specifier.local)
                    }
                    ast::ImportDeclarationSpecifier::ImportNamespaceSpecifier(specifier) => {
                        (ImportName::Namespace, &specifier.local)
                    }
                };
                imported_symbols.push((local.name.as_str(), local.symbol_id()));
                specifiers.push(ImportSpecifier {
                    imported,
                    local: local.name.to_string(),
                });
            }
            Item::Import(ImportDeclaration {
                span: decl.span,
                source: decl.source.value.to_string(),
                specifiers,
                phase: decl.phase.as_ref().map(|phase| match phase {
                    ast::ImportPhase::Source => "source",
                    ast::ImportPhase::Defer => "defer",
                }),
                attributes: decl.with_clause.is_some(),
            })
        }
        ast::ModuleDeclaration::ExportNamedDeclaration(decl) => {
            if let Some(source) = &decl.source {
                // export { a, b as c } from "source";
                Item::Export(ExportDeclaration::From {
                    span: decl.span,
                    source: source.value.to_string(),
                    specifiers: decl
                        .specifiers
                        .iter()
                        .map(|specifier| ReexportSpecifier {
                            imported: specifier.local.name().to_string(),
                            exported: specifier.exported.name().to_string(),
                        })
                        .collect(),
                    attributes: decl.with_clause.is_some(),
                })
            } else if let Some(declaration) = &decl.declaration {
                // export let e;
                // export function g() {}
                let mut names = Vec::new();
                declaration.bound_names(&mut |name| names.push(name.name.to_string()));
                Item::Export(ExportDeclaration::Declaration {
                    span: decl.span,
                    declaration: Span::new(declaration.span().start, decl.span.end),
                    names,
                    references: Vec::new(),
                })
            } else {
                // export { a, b as c };
                Item::Export(ExportDeclaration::Named {
                    span: decl.span,
                    specifiers: decl
                        .specifiers
                        .iter()
                        .map(|specifier| ExportSpecifier {
                            local: specifier.local.name().to_string(),
                            exported: specifier.exported.name().to_string(),
                        })
                        .collect(),
                })
            }
        }
        ast::ModuleDeclaration::ExportDefaultDeclaration(decl) => {
            let named = match &decl.declaration {
                ast::ExportDefaultDeclarationKind::FunctionDeclaration(function) => function
                    .id
                    .as_ref()
                    .map(|id| (function.span, id.name.to_string())),
                ast::ExportDefaultDeclarationKind::ClassDeclaration(class) => class
                    .id
                    .as_ref()
                    .map(|id| (class.span, id.name.to_string())),
                ast::ExportDefaultDeclarationKind::TSInterfaceDeclaration(interface) => {
                    return Err(unsupported_typescript(interface.span));
                }
                _ => None,
            };
            match named {
                // export default function f() {}
                Some((span, name)) => Item::Export(ExportDeclaration::DefaultDeclaration {
                    span: decl.span,
                    declaration: Span::new(span.start, decl.span.end),
                    name,
                    references: Vec::new(),
                }),
                // export default function () {}
                // export default <expression>;
                None => Item::Export(ExportDeclaration::DefaultExpression {
                    span: decl.span,
                    expression: decl.declaration.span(),
                    function_params: match &decl.declaration {
                        ast::ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                            Some(function.params.span.start)
                        }
                        _ => None,
                    },
                    references: Vec::new(),
                }),
            }
        }
        ast::ModuleDeclaration::ExportAllDeclaration(decl) => {
            Item::Export(ExportDeclaration::All {
                span: decl.span,
                source: decl.source.value.to_string(),
                exported: decl.exported.as_ref().map(|name| name.name().to_string()),
                attributes: decl.with_clause.is_some(),
            })
        }
        ast::ModuleDeclaration::TSExportAssignment(decl) => {
            return Err(unsupported_typescript(decl.span));
        }
        ast::ModuleDeclaration::TSNamespaceExportDeclaration(decl) => {
            return Err(unsupported_typescript(decl.span));
        }
    };
    Ok(item)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_module_items() {
        let source = "\"use strict\";\n\
                      import def, { a as b } from './a';\n\
                      ;\n\
                      export const { x, y: [z] } = obj;\n\
                      export default function () {}\n\
                      console.log(b);\n";
        let tree = parse(source).unwrap();
        assert_eq!(tree.items.len(), 5);
        let Item::Import(import) = &tree.items[1] else {
            panic!("expected import, got {:?}", tree.items[1]);
        };
        assert_eq!(import.source, "./a");
        assert_eq!(
            import.specifiers,
            [
                ImportSpecifier {
                    imported: ImportName::from("default"),
                    local: "def".into()
                },
                ImportSpecifier {
                    imported: ImportName::from("a"),
                    local: "b".into()
                },
            ]
        );
        let Item::Export(ExportDeclaration::Declaration {
            names, declaration, ..
        }) = &tree.items[2]
        else {
            panic!("expected export declaration");
        };
        assert_eq!(names, &["x", "z"]);
        assert_eq!(tree.text(*declaration), "const { x, y: [z] } = obj;");
        let Item::Export(ExportDeclaration::DefaultExpression {
            expression,
            function_params: Some(params),
            ..
        }) = &tree.items[3]
        else {
            panic!("expected anonymous default function");
        };
        assert_eq!(tree.text(*expression), "function () {}");
        assert_eq!(&tree.source[*params as usize..expression.end as usize], "() {}");
        let Item::Statement(statement) = &tree.items[4] else {
            panic!("expected statement");
        };
        assert_eq!(statement.references.len(), 1);
        assert_eq!(statement.references[0].name, "b");
        assert_eq!(tree.text(statement.references[0].span), "b");
    }

    #[test]
    fn classifies_references() {
        let source = "import { v } from './v';\n\
                      f({ v }, v);\n\
                      function g(v) { return v; }\n";
        let tree = parse(source).unwrap();
        let kinds = |index: usize| -> Vec<ReferenceKind> {
            let Item::Statement(statement) = &tree.items[index] else {
                panic!("expected statement");
            };
            statement.references.iter().map(|r| r.kind).collect()
        };
        assert_eq!(kinds(1), [ReferenceKind::ShorthandProperty, ReferenceKind::Read]);
        assert!(kinds(2).is_empty());
    }

    #[test]
    fn finds_top_level_await() {
        let tree = parse("async function f() { await g(); }\nconst x = await f();").unwrap();
        assert_eq!(tree.top_level_await, Some(44));
        let tree = parse("const f = async () => { for await (const x of y) {} };").unwrap();
        assert_eq!(tree.top_level_await, None);
    }

    #[test]
    fn syntax_errors_fail() {
        assert!(parse("import { from './a';").is_err());
        assert!(parse("export { missing };").is_err());
        assert!(parse("let a; let a;").is_err());
    }
}
