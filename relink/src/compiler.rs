// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compiler entry points: parse, rewrite and print.

use std::fmt;

use tracing::debug;

use crate::{
    ast::ModuleTree,
    codegen::print,
    error::CompileError,
    parsers::{ParseFn, oxc},
    rewriter::{ResolveExports, Rewriter},
};

/// Options for [`compile`] and [`transform`].
#[derive(Clone)]
pub struct CompileOptions<'a> {
    /// Return the rewritten tree alongside the code.
    pub ast: bool,
    /// The parser adapter used by [`compile`].
    pub parse: ParseFn,
    /// Name of the runtime object the emitted code calls into.
    pub runtime_alias: String,
    /// When set, every imported or re-exported name is checked against it.
    pub resolver: Option<&'a dyn ResolveExports>,
}

impl Default for CompileOptions<'_> {
    fn default() -> Self {
        Self {
            ast: false,
            parse: oxc::parse,
            runtime_alias: "module".to_owned(),
            resolver: None,
        }
    }
}

impl fmt::Debug for CompileOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("ast", &self.ast)
            .field("runtime_alias", &self.runtime_alias)
            .field("resolver", &self.resolver.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub code: String,
    /// The rewritten tree, if [`CompileOptions::ast`] was set.
    pub ast: Option<ModuleTree>,
}

/// Rewrites `tree` with the default options.
pub fn rewrite(tree: ModuleTree) -> Result<ModuleTree, CompileError> {
    transform(tree, &CompileOptions::default())
}

/// Rewrites the import and export items of `tree` into runtime calls.
/// Trees without module syntax are returned unchanged.
pub fn transform(tree: ModuleTree, options: &CompileOptions) -> Result<ModuleTree, CompileError> {
    Rewriter::new(&options.runtime_alias, options.resolver).rewrite(tree)
}

/// Parses, rewrites and prints `source_text`.
pub fn compile(source_text: &str, options: &CompileOptions) -> Result<CompileOutput, CompileError> {
    let tree = (options.parse)(source_text)?;
    debug!(items = tree.items.len(), "parsed module");
    let tree = transform(tree, options)?;
    let code = print(&tree);
    Ok(CompileOutput {
        code,
        ast: options.ast.then_some(tree),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{parsers::lite, rewriter::ExportTable};

    const SOURCE: &str = "import { a } from './a';\nexport const b = a + 1;\n";

    #[test]
    fn compile_matches_transform_of_parse() {
        let options = CompileOptions {
            ast: true,
            ..Default::default()
        };
        let output = compile(SOURCE, &options).unwrap();
        let tree = transform(oxc::parse(SOURCE).unwrap(), &options).unwrap();
        assert_eq!(output.ast.as_ref(), Some(&tree));
        assert_eq!(output.code, print(&tree));
        assert_eq!(
            output.code,
            "module.export({ b: () => b });\n\
             var _a = module.import(\"./a\");\n\
             const b = _a.a + 1;\n"
        );
    }

    #[test]
    fn ast_is_only_returned_on_request() {
        let output = compile(SOURCE, &CompileOptions::default()).unwrap();
        assert!(output.ast.is_none());
    }

    #[test]
    fn runtime_alias_is_configurable() {
        let options = CompileOptions {
            runtime_alias: "__rt".into(),
            parse: lite::parse,
            ..Default::default()
        };
        let output = compile("export default 1;", &options).unwrap();
        assert_eq!(
            output.code,
            "__rt.export({ default: () => _default });\nvar _default = 1;\n"
        );
    }

    #[test]
    fn compiling_compiled_code_is_a_no_op() {
        let first = compile(SOURCE, &CompileOptions::default()).unwrap().code;
        let second = compile(&first, &CompileOptions::default()).unwrap().code;
        assert_eq!(first, second);
        let tree = rewrite(oxc::parse(&first).unwrap()).unwrap();
        assert_eq!(tree, oxc::parse(&first).unwrap());
    }

    #[test]
    fn resolver_is_consulted() {
        let mut table = ExportTable::new();
        table.insert_names("./a", ["c"]);
        let options = CompileOptions {
            resolver: Some(&table),
            ..Default::default()
        };
        assert!(matches!(
            compile(SOURCE, &options),
            Err(CompileError::UnresolvedBinding { name, .. }) if name == "a"
        ));
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(matches!(
            compile("export {", &CompileOptions::default()),
            Err(CompileError::Parse(_))
        ));
    }
}
