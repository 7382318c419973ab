// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prints a [`ModuleTree`] back to source text, one top-level item per line.

use std::fmt::Write;

use boa_unicode::UnicodeProperties;
use oxc_span::Span;

use crate::ast::{
    Edit, ExportAccessor, ImportName, InstallExports, Item, Link, LinkKind, ModuleTree,
    ReexportName,
};

pub fn print(tree: &ModuleTree) -> String {
    let mut out = String::with_capacity(tree.source.len() + 64);
    if let Some(hashbang) = tree.hashbang {
        out.push_str(tree.text(hashbang));
        out.push('\n');
    }
    for item in &tree.items {
        print_item(tree, item, &mut out);
        out.push('\n');
    }
    out
}

fn print_item(tree: &ModuleTree, item: &Item, out: &mut String) {
    match item {
        Item::Import(import) => out.push_str(tree.text(import.span)),
        Item::Export(export) => out.push_str(tree.text(export.span())),
        Item::Statement(statement) => print_with_edits(tree, statement.span, &statement.edits, out),
        Item::InstallExports(InstallExports { runtime, accessors }) => {
            let _ = write!(out, "{runtime}.export({{");
            for (index, ExportAccessor { exported, local }) in accessors.iter().enumerate() {
                out.push_str(if index == 0 { " " } else { ", " });
                print_property_key(exported, out);
                let _ = write!(out, ": () => {local}");
            }
            out.push_str(if accessors.is_empty() { "});" } else { " });" });
        }
        Item::Link(Link {
            runtime,
            source,
            kind,
        }) => match kind {
            LinkKind::Import { bindings } => match bindings.split_first() {
                Some((first, aliases)) => {
                    let _ = write!(out, "var {first} = {runtime}.import({})", quote(source));
                    for alias in aliases {
                        let _ = write!(out, ", {alias} = {first}");
                    }
                    out.push(';');
                }
                None => {
                    let _ = write!(out, "{runtime}.import({});", quote(source));
                }
            },
            LinkKind::Reexport(names) => {
                let _ = write!(out, "{runtime}.reexport({}, {{", quote(source));
                for (index, ReexportName { exported, imported }) in names.iter().enumerate() {
                    out.push_str(if index == 0 { " " } else { ", " });
                    print_property_key(exported, out);
                    out.push_str(": ");
                    match imported {
                        ImportName::Name(name) => out.push_str(&quote(name)),
                        ImportName::Namespace => out.push_str("\"*\""),
                    }
                }
                out.push_str(" });");
            }
            LinkKind::ReexportAll => {
                let _ = write!(out, "{runtime}.reexportAll({});", quote(source));
            }
        },
        Item::DefaultValue(value) if value.hoisted => {
            print_with_edits(tree, value.expression, &value.edits, out);
        }
        Item::DefaultValue(value) => {
            let _ = write!(out, "var {} = ", value.local);
            print_with_edits(tree, value.expression, &value.edits, out);
            out.push(';');
        }
    }
}

/// Source text of `span` with `edits` applied. Edits are sorted and lie
/// within `span`.
fn print_with_edits(tree: &ModuleTree, span: Span, edits: &[Edit], out: &mut String) {
    let mut position = span.start;
    for edit in edits {
        out.push_str(tree.text(Span::new(position, edit.span.start)));
        out.push_str(&edit.text);
        position = edit.span.end;
    }
    out.push_str(tree.text(Span::new(position, span.end)));
}

fn print_property_key(name: &str, out: &mut String) {
    if is_identifier_name(name) {
        out.push_str(name);
    } else {
        out.push_str(&quote(name));
    }
}

/// Whether `name` can be written as a property name without quotes.
pub(crate) fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '$' || first == '_' || first.is_ascii_alphabetic() || first.is_id_start())
        && chars.all(|c| c == '$' || c == '_' || c.is_ascii_alphanumeric() || c.is_id_continue())
}

/// Double-quoted string literal for `value`.
pub(crate) fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{2028}' => quoted.push_str("\\u2028"),
            '\u{2029}' => quoted.push_str("\\u2029"),
            c if c < ' ' => {
                let _ = write!(quoted, "\\u{:04x}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
