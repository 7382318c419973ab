// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hand-written recogniser for ECMAScript modules.
//!
//! The recogniser only keeps what a [`ModuleTree`] needs: where top-level
//! items start and end, the shape of import and export declarations, and the
//! identifier references that resolve to imported bindings. Everything else
//! is checked for well-formedness and skipped.
//!
//! Scoping is tracked with a stack of [`Scope`]s. References are resolved
//! lazily: a reference stays pending in the innermost scope until that scope
//! closes, at which point it either resolves to a declaration of the closing
//! scope or moves out to the parent. Whatever is left in the module scope
//! when parsing ends refers to a module-level binding or a global.

mod lexer;

use std::mem;

use ahash::AHashSet;
use oxc_diagnostics::OxcDiagnostic;
use oxc_span::Span;

use self::lexer::{Keyword, Lexer, Token, cook_string};
use super::attach_references;
use crate::{
    ast::{
        ExportDeclaration, ExportSpecifier, ImportDeclaration, ImportName, ImportSpecifier, Item,
        ModuleTree, Reference, ReferenceKind, ReexportSpecifier, Statement,
    },
    error::ParseFailure,
};

type ParseResult<T> = Result<T, OxcDiagnostic>;

/// Parses `source_text` as an ECMAScript module.
pub fn parse(source_text: &str) -> Result<ModuleTree, ParseFailure> {
    Parser::new(source_text)
        .parse_module()
        .map_err(ParseFailure::single)
}

fn error(message: impl Into<String>, span: Span) -> OxcDiagnostic {
    OxcDiagnostic::error(message.into()).with_label(span)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScopeKind {
    Module,
    Function,
    Block,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    lexical: AHashSet<String>,
    vars: AHashSet<String>,
    /// References not yet resolved to a declaration.
    pending: Vec<Reference>,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            lexical: AHashSet::default(),
            vars: AHashSet::default(),
            pending: Vec::new(),
        }
    }

    fn declares(&self, name: &str) -> bool {
        self.lexical.contains(name) || self.vars.contains(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BindingKind {
    Lexical,
    Var,
    /// Function declarations are var-scoped directly inside functions and
    /// block-scoped everywhere else.
    Function,
}

/// Where a function or class appears.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Form {
    Declaration,
    /// `export default function` and `export default class`, which may be
    /// anonymous.
    DefaultExport,
    Expression,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ExprKind {
    Identifier,
    Member,
    /// Array or object literal that is also a valid destructuring pattern.
    Pattern,
    /// `target = value` where the target can be destructured.
    PatternWithDefault,
    Other,
}

/// What the parser remembers about an expression: enough to reinterpret it
/// as an assignment target or as arrow function parameters.
#[derive(Debug)]
struct Expr {
    kind: ExprKind,
    /// Pending references of the current scope that are bound if the
    /// expression is reinterpreted as a pattern.
    targets: Vec<usize>,
    /// Whether the expression is also valid as a binding pattern.
    binds: bool,
}

impl Expr {
    fn other() -> Self {
        Self {
            kind: ExprKind::Other,
            targets: Vec::new(),
            binds: false,
        }
    }

    fn member() -> Self {
        Self {
            kind: ExprKind::Member,
            targets: Vec::new(),
            binds: false,
        }
    }

    fn is_simple_target(&self) -> bool {
        matches!(self.kind, ExprKind::Identifier | ExprKind::Member)
    }

    fn is_target(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Identifier | ExprKind::Member | ExprKind::Pattern
        )
    }

    fn is_pattern_element(&self) -> bool {
        self.is_target() || self.kind == ExprKind::PatternWithDefault
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    /// End of the last consumed token.
    prev_end: u32,
    scope: Scope,
    parents: Vec<Scope>,
    function_depth: u32,
    /// Functions and class elements, where `new.target` is allowed. Arrow
    /// functions see the enclosing one.
    new_target_depth: u32,
    imports: AHashSet<String>,
    exported: AHashSet<String>,
    /// Locals named in `export { ... }` lists. They may be declared after
    /// the export, so they are checked once the module is complete.
    exported_locals: Vec<(String, Span)>,
    top_level_await: Option<u32>,
}

impl<'a> Parser<'a> {
    fn new(source_text: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source_text),
            prev_end: 0,
            scope: Scope::new(ScopeKind::Module),
            parents: Vec::new(),
            function_depth: 0,
            new_target_depth: 0,
            imports: AHashSet::default(),
            exported: AHashSet::default(),
            exported_locals: Vec::new(),
            top_level_await: None,
        }
    }

    fn parse_module(mut self) -> ParseResult<ModuleTree> {
        let mut tree = ModuleTree::new(self.lexer.source());
        tree.hashbang = self.lexer.hashbang;
        self.lexer.next();
        while self.token() != Token::EOF {
            if let Some(item) = self.parse_module_item()? {
                tree.items.push(item);
            }
        }
        self.finish_module(&mut tree.items)?;
        tree.top_level_await = self.top_level_await;
        Ok(tree)
    }

    fn finish_module(&mut self, items: &mut [Item]) -> ParseResult<()> {
        for (name, span) in &self.exported_locals {
            if !self.scope.declares(name) {
                return Err(error(format!("Export '{name}' is not defined"), *span));
            }
        }
        let references = mem::take(&mut self.scope.pending)
            .into_iter()
            .filter(|reference| self.imports.contains(&reference.name))
            .collect();
        attach_references(items, references);
        Ok(())
    }

    // Token helpers

    fn token(&self) -> Token {
        self.lexer.token
    }

    fn start(&self) -> u32 {
        self.lexer.start as u32
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end)
    }

    fn advance(&mut self) {
        self.prev_end = self.lexer.index as u32;
        self.lexer.next();
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.token() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Contextual keywords such as `from`, `as` and `of` are plain
    /// identifiers as far as the lexer is concerned.
    fn at_contextual(&self, name: &str) -> bool {
        self.token() == Token::Identifier && self.lexer.text() == name
    }

    fn eat_contextual(&mut self, name: &str) -> bool {
        if self.at_contextual(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_contextual(&mut self, name: &str) -> ParseResult<()> {
        if self.eat_contextual(name) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn at_async_function(&self) -> bool {
        if !self.at_contextual("async") {
            return false;
        }
        let next = self.lexer.peek();
        next.token == Token::Keyword(Keyword::Function) && !next.has_newline_before
    }

    fn unexpected(&self) -> OxcDiagnostic {
        let message = match self.token() {
            Token::EOF => "Unexpected end of input".to_owned(),
            Token::InvalidStringLiteral => "Unterminated string".to_owned(),
            Token::InvalidNumberLiteral => "Invalid number literal".to_owned(),
            Token::InvalidTemplate => "Unterminated template".to_owned(),
            Token::InvalidRegExp => "Unterminated regular expression".to_owned(),
            Token::UnterminatedComment => "Unterminated multiline comment".to_owned(),
            _ => format!("Unexpected token `{}`", self.lexer.text()),
        };
        error(message, self.lexer.span())
    }

    fn consume_semicolon(&mut self) -> ParseResult<()> {
        if self.eat(Token::Semi)
            || matches!(self.token(), Token::RightBrace | Token::EOF)
            || self.lexer.has_newline_before
        {
            Ok(())
        } else {
            Err(error(
                "Expected a semicolon or an implicit semicolon after a statement, but found none",
                self.lexer.span(),
            ))
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.token(), Token::Semi | Token::RightBrace | Token::EOF)
            || self.lexer.has_newline_before
    }

    fn string_value(&self) -> ParseResult<String> {
        cook_string(self.lexer.text())
            .ok_or_else(|| error("Invalid escape sequence", self.lexer.span()))
    }

    // Scopes

    fn push_scope(&mut self, kind: ScopeKind) {
        let parent = mem::replace(&mut self.scope, Scope::new(kind));
        self.parents.push(parent);
    }

    fn pop_scope(&mut self) {
        let Some(parent) = self.parents.pop() else {
            return;
        };
        let mut closed = mem::replace(&mut self.scope, parent);
        for reference in mem::take(&mut closed.pending) {
            if !closed.declares(&reference.name) {
                self.scope.pending.push(reference);
            }
        }
    }

    fn declare(&mut self, name: &str, span: Span, kind: BindingKind) -> ParseResult<()> {
        let redeclared =
            || error(format!("Identifier `{name}` has already been declared"), span);
        let kind = match kind {
            BindingKind::Function if self.scope.kind == ScopeKind::Function => BindingKind::Var,
            BindingKind::Function => BindingKind::Lexical,
            kind => kind,
        };
        if kind == BindingKind::Lexical {
            if self.scope.declares(name) {
                return Err(redeclared());
            }
            self.scope.lexical.insert(name.to_owned());
            return Ok(());
        }
        // `var` hoists through blocks to the closest function or module.
        let scopes = std::iter::once(&mut self.scope).chain(self.parents.iter_mut().rev());
        for scope in scopes {
            if scope.lexical.contains(name) {
                return Err(redeclared());
            }
            scope.vars.insert(name.to_owned());
            if scope.kind != ScopeKind::Block {
                break;
            }
        }
        Ok(())
    }

    fn note_await(&mut self, start: u32) {
        let in_function = self.scope.kind == ScopeKind::Function
            || self.parents.iter().any(|scope| scope.kind == ScopeKind::Function);
        if !in_function && self.top_level_await.is_none() {
            self.top_level_await = Some(start);
        }
    }

    fn reference(&mut self, name: &str, span: Span, kind: ReferenceKind) -> usize {
        self.scope.pending.push(Reference {
            name: name.to_owned(),
            span,
            kind,
        });
        self.scope.pending.len() - 1
    }

    fn mark_written(&mut self, targets: &[usize]) {
        for &index in targets {
            if let Some(reference) = self.scope.pending.get_mut(index) {
                reference.kind = ReferenceKind::Write;
            }
        }
    }

    // Module items

    fn parse_module_item(&mut self) -> ParseResult<Option<Item>> {
        let start = self.start();
        match self.token() {
            Token::Semi => {
                self.advance();
                return Ok(None);
            }
            Token::Keyword(Keyword::Import)
                if !matches!(self.lexer.peek().token, Token::LeftParen | Token::Dot) =>
            {
                return self.parse_import_declaration().map(|d| Some(Item::Import(d)));
            }
            Token::Keyword(Keyword::Export) => {
                return self.parse_export_declaration().map(|d| Some(Item::Export(d)));
            }
            _ => {}
        }
        self.parse_statement()?;
        Ok(Some(Item::Statement(Statement::new(self.span_from(start)))))
    }

    fn parse_binding_identifier(&mut self) -> ParseResult<(String, Span)> {
        if self.token() != Token::Identifier {
            return Err(self.unexpected());
        }
        let binding = (self.lexer.text().to_owned(), self.lexer.span());
        self.advance();
        Ok(binding)
    }

    fn declare_import(&mut self, name: String, span: Span) -> ParseResult<String> {
        self.declare(&name, span, BindingKind::Lexical)?;
        self.imports.insert(name.clone());
        Ok(name)
    }

    /// Parses an IdentifierName or a string literal. The flag tells whether
    /// the name may also be used as a binding.
    fn parse_module_export_name(&mut self) -> ParseResult<(String, Span, bool)> {
        let span = self.lexer.span();
        let (name, bindable) = match self.token() {
            Token::Identifier => (self.lexer.text().to_owned(), true),
            Token::Keyword(_) => (self.lexer.text().to_owned(), false),
            Token::StringLiteral => (self.string_value()?, false),
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok((name, span, bindable))
    }

    fn parse_module_specifier(&mut self) -> ParseResult<String> {
        if self.token() != Token::StringLiteral {
            return Err(self.unexpected());
        }
        let specifier = self.string_value()?;
        self.advance();
        Ok(specifier)
    }

    /// `with { type: "json" }`
    fn parse_attributes(&mut self) -> ParseResult<bool> {
        if !self.eat(Token::Keyword(Keyword::With)) {
            return Ok(false);
        }
        self.expect(Token::LeftBrace)?;
        while !self.eat(Token::RightBrace) {
            match self.token() {
                Token::Identifier | Token::Keyword(_) | Token::StringLiteral => self.advance(),
                _ => return Err(self.unexpected()),
            }
            self.expect(Token::Colon)?;
            self.parse_module_specifier()?;
            if self.token() != Token::RightBrace {
                self.expect(Token::Comma)?;
            }
        }
        Ok(true)
    }

    fn add_export(&mut self, name: &str, span: Span) -> ParseResult<()> {
        if self.exported.insert(name.to_owned()) {
            Ok(())
        } else {
            Err(error(format!("Duplicated export '{name}'"), span))
        }
    }

    fn parse_import_declaration(&mut self) -> ParseResult<ImportDeclaration> {
        let start = self.start();
        self.advance();
        let mut specifiers = Vec::new();
        if self.token() != Token::StringLiteral {
            // import x from "m";
            if self.token() == Token::Identifier {
                let (name, span) = self.parse_binding_identifier()?;
                specifiers.push(ImportSpecifier {
                    imported: ImportName::from("default"),
                    local: self.declare_import(name, span)?,
                });
                if self.eat(Token::Comma)
                    && !matches!(self.token(), Token::Mul | Token::LeftBrace)
                {
                    return Err(self.unexpected());
                }
            }
            match self.token() {
                // import * as ns from "m";
                Token::Mul => {
                    self.advance();
                    self.expect_contextual("as")?;
                    let (name, span) = self.parse_binding_identifier()?;
                    specifiers.push(ImportSpecifier {
                        imported: ImportName::Namespace,
                        local: self.declare_import(name, span)?,
                    });
                }
                // import { a, b as c } from "m";
                Token::LeftBrace => {
                    self.advance();
                    while !self.eat(Token::RightBrace) {
                        let (imported, span, bindable) = self.parse_module_export_name()?;
                        let local = if self.eat_contextual("as") {
                            let (name, span) = self.parse_binding_identifier()?;
                            self.declare_import(name, span)?
                        } else if bindable {
                            self.declare_import(imported.clone(), span)?
                        } else {
                            return Err(self.unexpected());
                        };
                        specifiers.push(ImportSpecifier {
                            imported: ImportName::Name(imported),
                            local,
                        });
                        if self.token() != Token::RightBrace {
                            self.expect(Token::Comma)?;
                        }
                    }
                }
                _ => {}
            }
            self.expect_contextual("from")?;
        }
        let source = self.parse_module_specifier()?;
        let attributes = self.parse_attributes()?;
        self.consume_semicolon()?;
        Ok(ImportDeclaration {
            span: self.span_from(start),
            source,
            specifiers,
            phase: None,
            attributes,
        })
    }

    fn parse_export_declaration(&mut self) -> ParseResult<ExportDeclaration> {
        let start = self.start();
        self.advance();
        let export = match self.token() {
            // export * from "m";
            // export * as ns from "m";
            Token::Mul => {
                self.advance();
                let exported = if self.eat_contextual("as") {
                    let (name, span, _) = self.parse_module_export_name()?;
                    self.add_export(&name, span)?;
                    Some(name)
                } else {
                    None
                };
                self.expect_contextual("from")?;
                let source = self.parse_module_specifier()?;
                let attributes = self.parse_attributes()?;
                self.consume_semicolon()?;
                ExportDeclaration::All {
                    span: self.span_from(start),
                    source,
                    exported,
                    attributes,
                }
            }
            // export { a, b as c };
            // export { a, b as c } from "m";
            Token::LeftBrace => {
                self.advance();
                let mut list = Vec::new();
                while !self.eat(Token::RightBrace) {
                    let (local, local_span, bindable) = self.parse_module_export_name()?;
                    let exported = if self.eat_contextual("as") {
                        let (name, span, _) = self.parse_module_export_name()?;
                        self.add_export(&name, span)?;
                        name
                    } else {
                        self.add_export(&local, local_span)?;
                        local.clone()
                    };
                    list.push((local, local_span, bindable, exported));
                    if self.token() != Token::RightBrace {
                        self.expect(Token::Comma)?;
                    }
                }
                if self.eat_contextual("from") {
                    let source = self.parse_module_specifier()?;
                    let attributes = self.parse_attributes()?;
                    self.consume_semicolon()?;
                    ExportDeclaration::From {
                        span: self.span_from(start),
                        source,
                        specifiers: list
                            .into_iter()
                            .map(|(imported, _, _, exported)| ReexportSpecifier {
                                imported,
                                exported,
                            })
                            .collect(),
                        attributes,
                    }
                } else {
                    self.consume_semicolon()?;
                    let mut specifiers = Vec::with_capacity(list.len());
                    for (local, span, bindable, exported) in list {
                        if !bindable {
                            return Err(error(
                                "A string literal or reserved word cannot be used as an exported binding without `from`",
                                span,
                            ));
                        }
                        self.exported_locals.push((local.clone(), span));
                        specifiers.push(ExportSpecifier { local, exported });
                    }
                    ExportDeclaration::Named {
                        span: self.span_from(start),
                        specifiers,
                    }
                }
            }
            Token::Keyword(Keyword::Default) => {
                self.add_export("default", self.lexer.span())?;
                self.advance();
                let declaration_start = self.start();
                let mut function_params = None;
                let name = if self.at_async_function()
                    || self.token() == Token::Keyword(Keyword::Function)
                {
                    let (name, params) = self.parse_function_with_params(Form::DefaultExport)?;
                    function_params = Some(params);
                    Some(name)
                } else if self.token() == Token::Keyword(Keyword::Class) {
                    Some(self.parse_class(Form::DefaultExport)?)
                } else {
                    None
                };
                match name {
                    // export default function f() {}
                    Some(Some((name, _))) => ExportDeclaration::DefaultDeclaration {
                        span: self.span_from(start),
                        declaration: self.span_from(declaration_start),
                        name,
                        references: Vec::new(),
                    },
                    // export default function () {}
                    // export default class {}
                    Some(None) => ExportDeclaration::DefaultExpression {
                        span: self.span_from(start),
                        expression: self.span_from(declaration_start),
                        function_params,
                        references: Vec::new(),
                    },
                    // export default <expression>;
                    None => {
                        self.parse_assignment_expression(true)?;
                        let expression = self.span_from(declaration_start);
                        self.consume_semicolon()?;
                        ExportDeclaration::DefaultExpression {
                            span: self.span_from(start),
                            expression,
                            function_params: None,
                            references: Vec::new(),
                        }
                    }
                }
            }
            // export let e;
            // export function g() {}
            _ => {
                let declaration_start = self.start();
                let names = match self.token() {
                    Token::Keyword(Keyword::Var | Keyword::Let | Keyword::Const) => {
                        self.parse_variable_statement()?
                    }
                    Token::Keyword(Keyword::Function) => {
                        self.parse_function(Form::Declaration)?.into_iter().collect()
                    }
                    Token::Identifier if self.at_async_function() => {
                        self.parse_function(Form::Declaration)?.into_iter().collect()
                    }
                    Token::Keyword(Keyword::Class) => {
                        self.parse_class(Form::Declaration)?.into_iter().collect()
                    }
                    _ => return Err(self.unexpected()),
                };
                for (name, span) in &names {
                    self.add_export(name, *span)?;
                }
                ExportDeclaration::Declaration {
                    span: self.span_from(start),
                    declaration: self.span_from(declaration_start),
                    names: names.into_iter().map(|(name, _)| name).collect(),
                    references: Vec::new(),
                }
            }
        };
        Ok(export)
    }

    // Statements

    fn parse_statement(&mut self) -> ParseResult<()> {
        match self.token() {
            Token::LeftBrace => self.parse_block(),
            Token::Semi => {
                self.advance();
                Ok(())
            }
            Token::Keyword(Keyword::Var | Keyword::Let | Keyword::Const) => {
                self.parse_variable_statement().map(drop)
            }
            Token::Keyword(Keyword::Function) => self.parse_function(Form::Declaration).map(drop),
            Token::Identifier if self.at_async_function() => {
                self.parse_function(Form::Declaration).map(drop)
            }
            Token::Keyword(Keyword::Class) => self.parse_class(Form::Declaration).map(drop),
            // label: statement
            Token::Identifier if self.lexer.peek().token == Token::Colon => {
                self.advance();
                self.advance();
                self.parse_substatement()
            }
            Token::Keyword(Keyword::If) => {
                self.advance();
                self.parse_parenthesized_expression()?;
                self.parse_substatement()?;
                if self.eat(Token::Keyword(Keyword::Else)) {
                    self.parse_substatement()?;
                }
                Ok(())
            }
            Token::Keyword(Keyword::While) => {
                self.advance();
                self.parse_parenthesized_expression()?;
                self.parse_substatement()
            }
            Token::Keyword(Keyword::Do) => {
                self.advance();
                self.parse_substatement()?;
                self.expect(Token::Keyword(Keyword::While))?;
                self.parse_parenthesized_expression()?;
                self.eat(Token::Semi);
                Ok(())
            }
            Token::Keyword(Keyword::For) => self.parse_for_statement(),
            Token::Keyword(Keyword::Return) => {
                if self.function_depth == 0 {
                    return Err(error(
                        "A 'return' statement can only be used within a function body.",
                        self.lexer.span(),
                    ));
                }
                self.advance();
                if !self.at_statement_end() {
                    self.parse_expression(true)?;
                }
                self.consume_semicolon()
            }
            Token::Keyword(Keyword::Break | Keyword::Continue) => {
                self.advance();
                if self.token() == Token::Identifier && !self.lexer.has_newline_before {
                    self.advance();
                }
                self.consume_semicolon()
            }
            Token::Keyword(Keyword::Throw) => {
                self.advance();
                if self.lexer.has_newline_before {
                    return Err(error("Illegal newline after throw", self.lexer.span()));
                }
                self.parse_expression(true)?;
                self.consume_semicolon()
            }
            Token::Keyword(Keyword::Try) => self.parse_try_statement(),
            Token::Keyword(Keyword::Switch) => self.parse_switch_statement(),
            Token::Keyword(Keyword::Debugger) => {
                self.advance();
                self.consume_semicolon()
            }
            Token::Keyword(Keyword::With) => Err(error(
                "'with' statements are not allowed in strict mode",
                self.lexer.span(),
            )),
            Token::Keyword(keyword @ (Keyword::Import | Keyword::Export))
                if keyword == Keyword::Export
                    || !matches!(self.lexer.peek().token, Token::LeftParen | Token::Dot) =>
            {
                Err(error(
                    "'import' and 'export' may only appear at the top level",
                    self.lexer.span(),
                ))
            }
            _ => {
                self.parse_expression(true)?;
                self.consume_semicolon()
            }
        }
    }

    /// The body of `if`, loops and labels, where declarations are not
    /// allowed.
    fn parse_substatement(&mut self) -> ParseResult<()> {
        let declaration = match self.token() {
            Token::Keyword(Keyword::Function | Keyword::Class | Keyword::Let | Keyword::Const) => {
                true
            }
            Token::Identifier => self.at_async_function(),
            _ => false,
        };
        if declaration {
            return Err(error(
                "Declarations cannot appear in a single-statement context",
                self.lexer.span(),
            ));
        }
        self.parse_statement()
    }

    fn parse_block(&mut self) -> ParseResult<()> {
        self.expect(Token::LeftBrace)?;
        self.push_scope(ScopeKind::Block);
        while !self.eat(Token::RightBrace) {
            self.parse_statement()?;
        }
        self.pop_scope();
        Ok(())
    }

    fn parse_parenthesized_expression(&mut self) -> ParseResult<()> {
        self.expect(Token::LeftParen)?;
        self.parse_expression(true)?;
        self.expect(Token::RightParen)
    }

    /// Parses a `var`, `let` or `const` statement. Returns the bound names
    /// in source order.
    fn parse_variable_statement(&mut self) -> ParseResult<Vec<(String, Span)>> {
        let names = self.parse_variable_declarations(true)?;
        self.consume_semicolon()?;
        Ok(names)
    }

    fn parse_variable_declarations(&mut self, allow_in: bool) -> ParseResult<Vec<(String, Span)>> {
        let kind = if self.token() == Token::Keyword(Keyword::Var) {
            BindingKind::Var
        } else {
            BindingKind::Lexical
        };
        self.advance();
        let mut names = Vec::new();
        loop {
            self.parse_binding_target(kind, &mut names)?;
            if self.eat(Token::Equal) {
                self.parse_assignment_expression(allow_in)?;
            }
            if !self.eat(Token::Comma) {
                return Ok(names);
            }
        }
    }

    fn parse_binding_target(
        &mut self,
        kind: BindingKind,
        names: &mut Vec<(String, Span)>,
    ) -> ParseResult<()> {
        match self.token() {
            Token::Identifier => {
                let (name, span) = self.parse_binding_identifier()?;
                self.declare(&name, span, kind)?;
                names.push((name, span));
            }
            Token::LeftBrack => {
                self.advance();
                while !self.eat(Token::RightBrack) {
                    if self.eat(Token::Comma) {
                        continue;
                    }
                    if self.eat(Token::DotDotDot) {
                        self.parse_binding_target(kind, names)?;
                        self.expect(Token::RightBrack)?;
                        break;
                    }
                    self.parse_binding_element(kind, names)?;
                    if self.token() != Token::RightBrack {
                        self.expect(Token::Comma)?;
                    }
                }
            }
            Token::LeftBrace => {
                self.advance();
                while !self.eat(Token::RightBrace) {
                    if self.eat(Token::DotDotDot) {
                        let (name, span) = self.parse_binding_identifier()?;
                        self.declare(&name, span, kind)?;
                        names.push((name, span));
                        self.expect(Token::RightBrace)?;
                        break;
                    }
                    if self.token() == Token::Identifier
                        && self.lexer.peek().token != Token::Colon
                    {
                        self.parse_binding_element(kind, names)?;
                    } else {
                        self.parse_property_key()?;
                        self.expect(Token::Colon)?;
                        self.parse_binding_element(kind, names)?;
                    }
                    if self.token() != Token::RightBrace {
                        self.expect(Token::Comma)?;
                    }
                }
            }
            _ => return Err(self.unexpected()),
        }
        Ok(())
    }

    fn parse_binding_element(
        &mut self,
        kind: BindingKind,
        names: &mut Vec<(String, Span)>,
    ) -> ParseResult<()> {
        self.parse_binding_target(kind, names)?;
        if self.eat(Token::Equal) {
            self.parse_assignment_expression(true)?;
        }
        Ok(())
    }

    fn at_for_in_of(&self) -> bool {
        self.token() == Token::Keyword(Keyword::In) || self.at_contextual("of")
    }

    fn parse_for_statement(&mut self) -> ParseResult<()> {
        let start = self.start();
        self.advance();
        let is_await = self.eat(Token::Keyword(Keyword::Await));
        if is_await {
            self.note_await(start);
        }
        self.expect(Token::LeftParen)?;
        self.push_scope(ScopeKind::Block);
        let mut in_of = false;
        match self.token() {
            Token::Semi => {}
            Token::Keyword(Keyword::Var | Keyword::Let | Keyword::Const) => {
                self.parse_variable_declarations(false)?;
                in_of = self.at_for_in_of();
            }
            _ => {
                let start = self.start();
                let target = self.parse_expression(false)?;
                if self.at_for_in_of() {
                    if !target.is_target() {
                        return Err(error("Invalid left-hand side in for loop", self.span_from(start)));
                    }
                    self.mark_written(&target.targets);
                    in_of = true;
                }
            }
        }
        if in_of {
            let of = self.at_contextual("of");
            self.advance();
            if of {
                self.parse_assignment_expression(true)?;
            } else {
                self.parse_expression(true)?;
            }
        } else {
            if is_await {
                return Err(self.unexpected());
            }
            self.expect(Token::Semi)?;
            if self.token() != Token::Semi {
                self.parse_expression(true)?;
            }
            self.expect(Token::Semi)?;
            if self.token() != Token::RightParen {
                self.parse_expression(true)?;
            }
        }
        self.expect(Token::RightParen)?;
        self.parse_substatement()?;
        self.pop_scope();
        Ok(())
    }

    fn parse_try_statement(&mut self) -> ParseResult<()> {
        self.advance();
        self.parse_block()?;
        let mut handled = false;
        if self.eat(Token::Keyword(Keyword::Catch)) {
            handled = true;
            self.push_scope(ScopeKind::Block);
            if self.eat(Token::LeftParen) {
                self.parse_binding_target(BindingKind::Lexical, &mut Vec::new())?;
                self.expect(Token::RightParen)?;
            }
            self.parse_block()?;
            self.pop_scope();
        }
        if self.eat(Token::Keyword(Keyword::Finally)) {
            handled = true;
            self.parse_block()?;
        }
        if handled {
            Ok(())
        } else {
            Err(error("Missing catch or finally after try", self.lexer.span()))
        }
    }

    fn parse_switch_statement(&mut self) -> ParseResult<()> {
        self.advance();
        self.parse_parenthesized_expression()?;
        self.expect(Token::LeftBrace)?;
        self.push_scope(ScopeKind::Block);
        while !self.eat(Token::RightBrace) {
            if self.eat(Token::Keyword(Keyword::Case)) {
                self.parse_expression(true)?;
            } else {
                self.expect(Token::Keyword(Keyword::Default))?;
            }
            self.expect(Token::Colon)?;
            while !matches!(
                self.token(),
                Token::Keyword(Keyword::Case | Keyword::Default) | Token::RightBrace
            ) {
                self.parse_statement()?;
            }
        }
        self.pop_scope();
        Ok(())
    }

    // Functions and classes

    /// Parses a function and returns its name. Declarations declare the
    /// name in the enclosing scope.
    fn parse_function(&mut self, form: Form) -> ParseResult<Option<(String, Span)>> {
        self.parse_function_with_params(form).map(|(name, _)| name)
    }

    /// Also returns where the parameter list starts.
    fn parse_function_with_params(
        &mut self,
        form: Form,
    ) -> ParseResult<(Option<(String, Span)>, u32)> {
        self.eat_contextual("async");
        self.expect(Token::Keyword(Keyword::Function))?;
        self.eat(Token::Mul);
        let name = match self.token() {
            Token::Identifier => Some(self.parse_binding_identifier()?),
            _ if form == Form::Declaration => return Err(self.unexpected()),
            _ => None,
        };
        if let Some((name, span)) = &name
            && form != Form::Expression
        {
            self.declare(name, *span, BindingKind::Function)?;
        }
        self.push_scope(ScopeKind::Function);
        if let Some((name, span)) = &name
            && form == Form::Expression
        {
            self.declare(name, *span, BindingKind::Var)?;
        }
        let params = self.start();
        self.parse_function_rest()?;
        self.pop_scope();
        Ok((name, params))
    }

    /// Parameters and body, in the already pushed function scope.
    fn parse_function_rest(&mut self) -> ParseResult<()> {
        self.new_target_depth += 1;
        self.expect(Token::LeftParen)?;
        while !self.eat(Token::RightParen) {
            if self.eat(Token::DotDotDot) {
                self.parse_binding_target(BindingKind::Var, &mut Vec::new())?;
                self.expect(Token::RightParen)?;
                break;
            }
            self.parse_binding_element(BindingKind::Var, &mut Vec::new())?;
            if self.token() != Token::RightParen {
                self.expect(Token::Comma)?;
            }
        }
        self.parse_function_body()?;
        self.new_target_depth -= 1;
        Ok(())
    }

    fn parse_function_body(&mut self) -> ParseResult<()> {
        self.expect(Token::LeftBrace)?;
        self.function_depth += 1;
        while !self.eat(Token::RightBrace) {
            self.parse_statement()?;
        }
        self.function_depth -= 1;
        Ok(())
    }

    fn parse_method(&mut self) -> ParseResult<()> {
        self.push_scope(ScopeKind::Function);
        self.parse_function_rest()?;
        self.pop_scope();
        Ok(())
    }

    fn parse_class(&mut self, form: Form) -> ParseResult<Option<(String, Span)>> {
        self.expect(Token::Keyword(Keyword::Class))?;
        let name = match self.token() {
            Token::Identifier => Some(self.parse_binding_identifier()?),
            _ if form == Form::Declaration => return Err(self.unexpected()),
            _ => None,
        };
        if let Some((name, span)) = &name
            && form != Form::Expression
        {
            self.declare(name, *span, BindingKind::Lexical)?;
        }
        self.push_scope(ScopeKind::Block);
        if let Some((name, span)) = &name
            && form == Form::Expression
        {
            self.declare(name, *span, BindingKind::Lexical)?;
        }
        if self.eat(Token::Keyword(Keyword::Extends)) {
            self.parse_left_hand_side_expression()?;
        }
        self.expect(Token::LeftBrace)?;
        while !self.eat(Token::RightBrace) {
            self.parse_class_member()?;
        }
        self.pop_scope();
        Ok(name)
    }

    /// Returns true if the current token is a member name rather than a
    /// modifier like `static` or `get`.
    fn at_member_name_end(&self) -> bool {
        let next = self.lexer.peek();
        matches!(
            next.token,
            Token::LeftParen
                | Token::Equal
                | Token::Semi
                | Token::RightBrace
                | Token::Comma
                | Token::Colon
        )
    }

    /// Consumes `async`, `get`, `set` and `*`. Returns true if the member is
    /// a method.
    fn parse_method_modifiers(&mut self) -> bool {
        let mut method = false;
        if self.token() == Token::Identifier
            && matches!(self.lexer.text(), "async" | "get" | "set")
            && !self.at_member_name_end()
            && !(self.lexer.text() == "async" && self.lexer.peek().has_newline_before)
        {
            self.advance();
            method = true;
        }
        if self.eat(Token::Mul) {
            method = true;
        }
        method
    }

    fn parse_class_member(&mut self) -> ParseResult<()> {
        if self.eat(Token::Semi) {
            return Ok(());
        }
        if self.token() == Token::Keyword(Keyword::Static) && !self.at_member_name_end() {
            self.advance();
            // static { ... }
            if self.token() == Token::LeftBrace {
                self.push_scope(ScopeKind::Function);
                self.new_target_depth += 1;
                self.parse_block()?;
                self.new_target_depth -= 1;
                self.pop_scope();
                return Ok(());
            }
        }
        let method = self.parse_method_modifiers();
        self.parse_property_key()?;
        if method || self.token() == Token::LeftParen {
            return self.parse_method();
        }
        if self.eat(Token::Equal) {
            self.push_scope(ScopeKind::Function);
            self.new_target_depth += 1;
            self.parse_assignment_expression(true)?;
            self.new_target_depth -= 1;
            self.pop_scope();
        }
        self.consume_semicolon()
    }

    fn parse_property_key(&mut self) -> ParseResult<()> {
        match self.token() {
            Token::Identifier
            | Token::PrivateIdentifier
            | Token::Keyword(_)
            | Token::StringLiteral
            | Token::NumberLiteral
            | Token::BigIntLiteral => {
                self.advance();
                Ok(())
            }
            Token::LeftBrack => {
                self.advance();
                self.parse_assignment_expression(true)?;
                self.expect(Token::RightBrack)
            }
            _ => Err(self.unexpected()),
        }
    }

    // Expressions

    fn parse_expression(&mut self, allow_in: bool) -> ParseResult<Expr> {
        let first = self.parse_assignment_expression(allow_in)?;
        if self.token() != Token::Comma {
            return Ok(first);
        }
        while self.eat(Token::Comma) {
            self.parse_assignment_expression(allow_in)?;
        }
        Ok(Expr::other())
    }

    fn parse_assignment_expression(&mut self, allow_in: bool) -> ParseResult<Expr> {
        if self.eat(Token::Keyword(Keyword::Yield)) {
            let ends = matches!(
                self.token(),
                Token::RightParen
                    | Token::RightBrack
                    | Token::RightBrace
                    | Token::Comma
                    | Token::Semi
                    | Token::Colon
                    | Token::EOF
            );
            if !ends && !self.lexer.has_newline_before {
                self.eat(Token::Mul);
                self.parse_assignment_expression(allow_in)?;
            }
            return Ok(Expr::other());
        }
        let start = self.start();
        let target = self.parse_conditional_expression(allow_in)?;
        let operator = self.token();
        if !operator.is_assignment() {
            return Ok(target);
        }
        let valid = if operator == Token::Equal {
            target.is_target()
        } else {
            target.is_simple_target()
        };
        if !valid {
            return Err(error("Invalid assignment target", self.span_from(start)));
        }
        self.mark_written(&target.targets);
        self.advance();
        self.parse_assignment_expression(allow_in)?;
        if operator == Token::Equal {
            Ok(Expr {
                kind: ExprKind::PatternWithDefault,
                targets: target.targets,
                binds: target.binds,
            })
        } else {
            Ok(Expr::other())
        }
    }

    fn parse_conditional_expression(&mut self, allow_in: bool) -> ParseResult<Expr> {
        let test = self.parse_binary_expression(0, allow_in)?;
        if !self.eat(Token::Question) {
            return Ok(test);
        }
        self.parse_assignment_expression(true)?;
        self.expect(Token::Colon)?;
        self.parse_assignment_expression(allow_in)?;
        Ok(Expr::other())
    }

    fn parse_binary_expression(&mut self, min_bp: u8, allow_in: bool) -> ParseResult<Expr> {
        let mut left = self.parse_unary_expression()?;
        loop {
            let operator = self.token();
            let bp = operator.lbp();
            if bp == 0 || bp <= min_bp || (operator == Token::Keyword(Keyword::In) && !allow_in) {
                return Ok(left);
            }
            self.advance();
            // `**` is right-associative
            let next_bp = if operator == Token::Pow { bp - 1 } else { bp };
            self.parse_binary_expression(next_bp, allow_in)?;
            left = Expr::other();
        }
    }

    fn parse_unary_expression(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        match self.token() {
            Token::Not
            | Token::BitComplement
            | Token::Plus
            | Token::Minus
            | Token::Keyword(Keyword::Typeof | Keyword::Void | Keyword::Delete | Keyword::Await) => {
                if self.token() == Token::Keyword(Keyword::Await) {
                    self.note_await(start);
                }
                self.advance();
                self.parse_unary_expression()?;
                Ok(Expr::other())
            }
            Token::Increment | Token::Decrement => {
                self.advance();
                let target = self.parse_unary_expression()?;
                self.update(target, start)
            }
            _ => {
                let expression = self.parse_left_hand_side_expression()?;
                if matches!(self.token(), Token::Increment | Token::Decrement)
                    && !self.lexer.has_newline_before
                {
                    self.advance();
                    return self.update(expression, start);
                }
                Ok(expression)
            }
        }
    }

    fn update(&mut self, target: Expr, start: u32) -> ParseResult<Expr> {
        if !target.is_simple_target() {
            return Err(error(
                "Invalid left-hand side expression in update operation",
                self.span_from(start),
            ));
        }
        self.mark_written(&target.targets);
        Ok(Expr::other())
    }

    fn parse_left_hand_side_expression(&mut self) -> ParseResult<Expr> {
        let mut expression = if self.token() == Token::Keyword(Keyword::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        // Nothing in an optional chain can be assigned to.
        let mut optional = false;
        loop {
            match self.token() {
                Token::Dot => {
                    self.advance();
                    self.parse_member_name()?;
                    expression = if optional { Expr::other() } else { Expr::member() };
                }
                Token::LeftBrack => {
                    self.advance();
                    self.parse_expression(true)?;
                    self.expect(Token::RightBrack)?;
                    expression = if optional { Expr::other() } else { Expr::member() };
                }
                Token::QuestionDot => {
                    self.advance();
                    optional = true;
                    match self.token() {
                        Token::LeftParen => self.parse_arguments()?,
                        Token::LeftBrack => {
                            self.advance();
                            self.parse_expression(true)?;
                            self.expect(Token::RightBrack)?;
                        }
                        _ => self.parse_member_name()?,
                    }
                    expression = Expr::other();
                }
                Token::LeftParen => {
                    self.parse_arguments()?;
                    expression = Expr::other();
                }
                Token::NoSubstitutionTemplate | Token::TemplateHead => {
                    self.parse_template()?;
                    expression = Expr::other();
                }
                _ => return Ok(expression),
            }
        }
    }

    fn parse_new_expression(&mut self) -> ParseResult<Expr> {
        let start = self.start();
        self.advance();
        // new.target
        if self.eat(Token::Dot) {
            self.expect_contextual("target")?;
            if self.new_target_depth == 0 {
                return Err(error(
                    "new.target expression is not allowed here",
                    self.span_from(start),
                ));
            }
            return Ok(Expr::other());
        }
        if self.token() == Token::Keyword(Keyword::New) {
            self.parse_new_expression()?;
        } else {
            self.parse_primary_expression()?;
        }
        loop {
            match self.token() {
                Token::Dot => {
                    self.advance();
                    self.parse_member_name()?;
                }
                Token::LeftBrack => {
                    self.advance();
                    self.parse_expression(true)?;
                    self.expect(Token::RightBrack)?;
                }
                Token::NoSubstitutionTemplate | Token::TemplateHead => self.parse_template()?,
                _ => break,
            }
        }
        if self.token() == Token::LeftParen {
            self.parse_arguments()?;
        }
        Ok(Expr::other())
    }

    fn parse_member_name(&mut self) -> ParseResult<()> {
        match self.token() {
            Token::Identifier | Token::PrivateIdentifier | Token::Keyword(_) => {
                self.advance();
                Ok(())
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_arguments(&mut self) -> ParseResult<()> {
        self.expect(Token::LeftParen)?;
        while !self.eat(Token::RightParen) {
            self.eat(Token::DotDotDot);
            self.parse_assignment_expression(true)?;
            if self.token() != Token::RightParen {
                self.expect(Token::Comma)?;
            }
        }
        Ok(())
    }

    fn parse_template(&mut self) -> ParseResult<()> {
        if self.eat(Token::NoSubstitutionTemplate) {
            return Ok(());
        }
        self.expect(Token::TemplateHead)?;
        loop {
            self.parse_expression(true)?;
            if self.token() != Token::RightBrace {
                return Err(self.unexpected());
            }
            self.lexer.continue_template();
            match self.token() {
                Token::TemplateMiddle => self.advance(),
                Token::TemplateTail => {
                    self.advance();
                    return Ok(());
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_primary_expression(&mut self) -> ParseResult<Expr> {
        match self.token() {
            Token::Identifier => self.parse_identifier_expression(),
            Token::Keyword(
                Keyword::This | Keyword::Super | Keyword::Null | Keyword::True | Keyword::False,
            )
            | Token::NumberLiteral
            | Token::BigIntLiteral
            | Token::StringLiteral => {
                self.advance();
                Ok(Expr::other())
            }
            Token::NoSubstitutionTemplate | Token::TemplateHead => {
                self.parse_template()?;
                Ok(Expr::other())
            }
            Token::Div | Token::DivAssign => {
                self.lexer.rescan_regex();
                self.expect(Token::RegExpLiteral)?;
                Ok(Expr::other())
            }
            // import.meta and import(...)
            Token::Keyword(Keyword::Import) => {
                self.advance();
                if self.eat(Token::Dot) {
                    self.expect_contextual("meta")?;
                } else {
                    self.parse_arguments()?;
                }
                Ok(Expr::other())
            }
            Token::Keyword(Keyword::Function) => {
                self.parse_function(Form::Expression)?;
                Ok(Expr::other())
            }
            Token::Keyword(Keyword::Class) => {
                self.parse_class(Form::Expression)?;
                Ok(Expr::other())
            }
            Token::LeftBrack => self.parse_array_literal(),
            Token::LeftBrace => self.parse_object_literal(),
            Token::LeftParen => self.parse_parenthesized(None),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_identifier_expression(&mut self) -> ParseResult<Expr> {
        let name = self.lexer.text();
        let span = self.lexer.span();
        if name == "async" {
            let next = self.lexer.peek();
            if !next.has_newline_before {
                match next.token {
                    Token::Keyword(Keyword::Function) => {
                        self.parse_function(Form::Expression)?;
                        return Ok(Expr::other());
                    }
                    // async x => ...
                    Token::Identifier => {
                        self.advance();
                        let param_span = self.lexer.span();
                        let param = self.reference(self.lexer.text(), param_span, ReferenceKind::Read);
                        self.advance();
                        if self.token() != Token::Arrow || self.lexer.has_newline_before {
                            return Err(self.unexpected());
                        }
                        return self.parse_arrow_function(param, vec![param]);
                    }
                    // async (...) => ... or a call to `async`
                    Token::LeftParen => {
                        self.advance();
                        return self.parse_parenthesized(Some(span));
                    }
                    _ => {}
                }
            }
        }
        self.advance();
        let index = self.reference(name, span, ReferenceKind::Read);
        if self.token() == Token::Arrow && !self.lexer.has_newline_before {
            return self.parse_arrow_function(index, vec![index]);
        }
        Ok(Expr {
            kind: ExprKind::Identifier,
            targets: vec![index],
            binds: true,
        })
    }

    /// Parses a parenthesized expression, or the parameter list of an arrow
    /// function if the closing parenthesis is followed by `=>`.
    fn parse_parenthesized(&mut self, async_span: Option<Span>) -> ParseResult<Expr> {
        let mark = self.scope.pending.len();
        self.expect(Token::LeftParen)?;
        let mut targets = Vec::new();
        let mut params = true;
        let mut elements = Vec::new();
        let mut rest = false;
        let mut trailing_comma = false;
        while !self.eat(Token::RightParen) {
            if rest {
                params = false;
            }
            rest = self.eat(Token::DotDotDot);
            let element = self.parse_assignment_expression(true)?;
            params &= element.binds
                && (!rest || matches!(element.kind, ExprKind::Identifier | ExprKind::Pattern));
            targets.extend_from_slice(&element.targets);
            elements.push(element);
            trailing_comma = false;
            if self.token() != Token::RightParen {
                self.expect(Token::Comma)?;
                trailing_comma = true;
            }
        }
        if self.token() == Token::Arrow && !self.lexer.has_newline_before {
            if !params || (rest && trailing_comma) {
                return Err(error("Invalid arrow function parameters", self.lexer.span()));
            }
            return self.parse_arrow_function(mark, targets);
        }
        if let Some(span) = async_span {
            // a call to a function named `async`
            self.reference("async", span, ReferenceKind::Read);
            return Ok(Expr::other());
        }
        if elements.is_empty() || rest || trailing_comma {
            return Err(self.unexpected());
        }
        match elements.pop() {
            Some(element) if elements.is_empty() && element.is_simple_target() => Ok(Expr {
                binds: false,
                ..element
            }),
            _ => Ok(Expr::other()),
        }
    }

    /// Parses `=> body`. References recorded since `mark` move into the
    /// arrow function's scope, and those listed in `params` become its
    /// parameters.
    fn parse_arrow_function(&mut self, mark: usize, params: Vec<usize>) -> ParseResult<Expr> {
        let recorded = self.scope.pending.split_off(mark);
        self.push_scope(ScopeKind::Function);
        for (offset, reference) in recorded.into_iter().enumerate() {
            if params.contains(&(mark + offset)) {
                self.scope.vars.insert(reference.name);
            } else {
                self.scope.pending.push(reference);
            }
        }
        self.expect(Token::Arrow)?;
        if self.token() == Token::LeftBrace {
            self.parse_function_body()?;
        } else {
            self.parse_assignment_expression(true)?;
        }
        self.pop_scope();
        Ok(Expr::other())
    }

    fn parse_array_literal(&mut self) -> ParseResult<Expr> {
        self.advance();
        let mut targets = Vec::new();
        let mut pattern = true;
        let mut binds = true;
        while !self.eat(Token::RightBrack) {
            if self.eat(Token::Comma) {
                continue;
            }
            let spread = self.eat(Token::DotDotDot);
            let element = self.parse_assignment_expression(true)?;
            pattern &= if spread {
                element.is_target()
            } else {
                element.is_pattern_element()
            };
            binds &= element.binds;
            targets.extend(element.targets);
            if self.token() != Token::RightBrack {
                self.expect(Token::Comma)?;
            }
        }
        Ok(Expr {
            kind: if pattern { ExprKind::Pattern } else { ExprKind::Other },
            targets,
            binds: pattern && binds,
        })
    }

    fn parse_object_literal(&mut self) -> ParseResult<Expr> {
        self.advance();
        let mut targets = Vec::new();
        let mut pattern = true;
        let mut binds = true;
        while !self.eat(Token::RightBrace) {
            if self.eat(Token::DotDotDot) {
                let element = self.parse_assignment_expression(true)?;
                pattern &= element.is_simple_target();
                binds &= element.kind == ExprKind::Identifier;
                targets.extend(element.targets);
            } else if self.token() == Token::Identifier
                && matches!(
                    self.lexer.peek().token,
                    Token::Comma | Token::RightBrace | Token::Equal
                )
            {
                // { name } and { name = value }
                let span = self.lexer.span();
                let index = self.reference(self.lexer.text(), span, ReferenceKind::ShorthandProperty);
                self.advance();
                if self.eat(Token::Equal) {
                    self.parse_assignment_expression(true)?;
                }
                targets.push(index);
            } else {
                let method = self.parse_method_modifiers();
                self.parse_property_key()?;
                if method || self.token() == Token::LeftParen {
                    self.parse_method()?;
                    pattern = false;
                } else {
                    self.expect(Token::Colon)?;
                    let value = self.parse_assignment_expression(true)?;
                    pattern &= value.is_pattern_element();
                    binds &= value.binds;
                    targets.extend(value.targets);
                }
            }
            if self.token() != Token::RightBrace {
                self.expect(Token::Comma)?;
            }
        }
        Ok(Expr {
            kind: if pattern { ExprKind::Pattern } else { ExprKind::Other },
            targets,
            binds: pattern && binds,
        })
    }
}
