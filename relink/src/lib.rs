// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # relink
//!
//! Rewrites ECMAScript module `import`/`export` syntax into an explicit
//! live-binding protocol, and defines the in-process execution order a host
//! must honour when running the rewritten modules.
//!
//! The crate is split in two halves:
//!
//! - the compile side ([`parsers`], [`rewriter`], [`codegen`],
//!   [`compiler`]) turns module source text into code that installs export
//!   accessors up front and reads imports through a namespace at every use
//!   site;
//! - the runtime side ([`module`]) models the same protocol in Rust: binding
//!   registries, a module graph that may contain cycles, and the depth-first
//!   scheduler that runs every module body exactly once.

pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod module;
pub mod parsers;
pub mod rewriter;

pub use ast::ModuleTree;
pub use codegen::print;
pub use compiler::{CompileOptions, CompileOutput, compile, rewrite, transform};
pub use error::{BindingError, CompileError, ExecutionError, ParseFailure};
pub use module::{
    Module, ModuleBuilder, ModuleId,
    graph::ModuleGraph,
    host::{HostLoader, HostModule, PreloadedModule, notify_already_loaded},
    registry::BindingRegistry,
    scheduler::execute_all,
    scope::ModuleScope,
    value::Value,
};
pub use parsers::{ParseFn, ParserKind};
pub use rewriter::{ExportTable, ResolveExports};
