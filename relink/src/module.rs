// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Module records
//!
//! A [`Module`] is the runtime counterpart of one compiled module: its import
//! and export entries, the slots backing its local bindings, its registry and
//! the body that the [scheduler](scheduler) runs at most once.

pub mod graph;
pub mod host;
pub mod registry;
pub mod scheduler;
pub mod scope;
pub mod value;

use std::{cell::RefCell, fmt, ops::Deref, rc::Rc};

use ahash::AHashMap;

use crate::{
    ast::{ExportDeclaration, ImportName, Item, ModuleTree},
    error::ExecutionError,
};
use registry::BindingRegistry;
use scope::{LiveImport, ModuleScope};
use value::{Function, Value};

/// Resolved module identity, such as a canonical path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Rc<str>);

impl ModuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ModuleId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for ModuleId {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl std::borrow::Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Mutable storage behind a module-level binding.
#[derive(Debug, Clone, Default)]
pub struct Slot(Rc<RefCell<Value>>);

impl Slot {
    pub fn new(value: Value) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: impl Into<Value>) {
        *self.0.borrow_mut() = value.into();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportEntry {
    pub specifier: ModuleId,
    pub import: ImportName,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportEntry {
    /// Accessor over one of the module's own slots.
    Local { exported: String, local: String },
    /// A name or namespace of another module, re-exported under `exported`.
    Indirect {
        exported: String,
        specifier: ModuleId,
        import: ImportName,
    },
    /// `export * from "specifier"`
    Star { specifier: ModuleId },
}

/// Where a module is in its single pass Unstarted, Running, Done.
///
/// A module that fails to link, or that depends on one, passes through
/// Running without its body ever being called and ends Done with the
/// linking error cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStatus {
    #[default]
    Unstarted,
    Running,
    Done,
}

pub type ModuleBody = Box<dyn FnOnce(&mut ModuleScope<'_>) -> Result<(), ExecutionError>>;

pub struct Module {
    id: ModuleId,
    /// Modules this module depends on, in source order of their first
    /// request.
    requested: Vec<ModuleId>,
    imports: Vec<ImportEntry>,
    exports: Vec<ExportEntry>,
    locals: AHashMap<String, Slot>,
    body: Option<ModuleBody>,
    status: ExecutionStatus,
    /// ### \[\[EvaluationError]]
    ///
    /// The error the module failed with. Only set once `status` is `Done`.
    evaluation_error: Option<ExecutionError>,
    /// Whether exports were installed and imports resolved.
    linked: bool,
    linked_imports: AHashMap<String, LiveImport>,
    registry: BindingRegistry,
    /// Registered by the host with plain values rather than compiled.
    preloaded: bool,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("requested", &self.requested)
            .field("imports", &self.imports)
            .field("exports", &self.exports)
            .field("status", &self.status)
            .field("evaluation_error", &self.evaluation_error)
            .finish_non_exhaustive()
    }
}

impl Module {
    pub fn builder(id: impl Into<ModuleId>) -> ModuleBuilder {
        ModuleBuilder::new(id.into())
    }

    /// Builds a module record from a parsed module tree. `resolve` maps each
    /// module specifier to the id of the module it refers to. The module has
    /// no body until one is attached with [`Module::with_body`].
    ///
    /// An anonymous default export is backed by the `*default*` local. Like
    /// any function declaration, its value is supplied with
    /// [`Module::with_hoisted`].
    pub fn from_tree(
        id: impl Into<ModuleId>,
        tree: &ModuleTree,
        mut resolve: impl FnMut(&str) -> ModuleId,
    ) -> Module {
        let import_locals: Vec<&str> = tree
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Import(import) => Some(import),
                _ => None,
            })
            .flat_map(|import| import.specifiers.iter().map(|s| s.local.as_str()))
            .collect();
        let mut builder = Module::builder(id);
        for item in &tree.items {
            match item {
                Item::Import(import) => {
                    let specifier = resolve(&import.source);
                    builder = builder.request(specifier.clone());
                    for specifier_entry in &import.specifiers {
                        builder.push_import(
                            specifier.clone(),
                            specifier_entry.imported.clone(),
                            &specifier_entry.local,
                        );
                    }
                }
                Item::Export(export) => match export {
                    ExportDeclaration::Declaration { names, .. } => {
                        for name in names {
                            builder = builder.export(name);
                        }
                    }
                    ExportDeclaration::DefaultDeclaration { name, .. } => {
                        builder = builder.local(name).export_as(name, "default");
                    }
                    ExportDeclaration::DefaultExpression { .. } => {
                        builder = builder.local("*default*").export_as("*default*", "default");
                    }
                    ExportDeclaration::Named { specifiers, .. } => {
                        for specifier in specifiers {
                            if !import_locals.contains(&specifier.local.as_str()) {
                                builder = builder.local(&specifier.local);
                            }
                            builder = builder.export_as(&specifier.local, &specifier.exported);
                        }
                    }
                    ExportDeclaration::From {
                        source, specifiers, ..
                    } => {
                        let source = resolve(source);
                        builder = builder.request(source.clone());
                        for specifier in specifiers {
                            builder = builder.reexport(
                                source.clone(),
                                &specifier.imported,
                                &specifier.exported,
                            );
                        }
                    }
                    ExportDeclaration::All {
                        source, exported, ..
                    } => {
                        let source = resolve(source);
                        builder = match exported {
                            Some(exported) => builder.reexport_namespace(source, exported),
                            None => builder.reexport_all(source),
                        };
                    }
                },
                _ => {}
            }
        }
        builder.build()
    }

    /// Sets the value of a function declaration, visible to importers as
    /// soon as the module is linked and before any body runs.
    pub fn with_hoisted(mut self, local: &str, function: Function) -> Self {
        self.locals.insert(local.to_owned(), Slot::new(function.into()));
        self
    }

    /// Replaces the module body.
    pub fn with_body(
        mut self,
        body: impl FnOnce(&mut ModuleScope<'_>) -> Result<(), ExecutionError> + 'static,
    ) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn requested_modules(&self) -> &[ModuleId] {
        &self.requested
    }

    pub fn imports(&self) -> &[ImportEntry] {
        &self.imports
    }

    pub fn exports(&self) -> &[ExportEntry] {
        &self.exports
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn evaluation_error(&self) -> Option<&ExecutionError> {
        self.evaluation_error.as_ref()
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    /// Whether the host registered this module instead of compiling it.
    pub fn is_preloaded(&self) -> bool {
        self.preloaded
    }

    pub fn slot(&self, local: &str) -> Option<&Slot> {
        self.locals.get(local)
    }

    pub(crate) fn is_linked(&self) -> bool {
        self.linked
    }

    pub(crate) fn set_linked(&mut self, imports: AHashMap<String, LiveImport>) {
        self.linked = true;
        self.linked_imports = imports;
    }

    pub(crate) fn linked_imports(&self) -> &AHashMap<String, LiveImport> {
        &self.linked_imports
    }

    pub(crate) fn locals(&self) -> &AHashMap<String, Slot> {
        &self.locals
    }

    pub(crate) fn take_body(&mut self) -> Option<ModuleBody> {
        self.body.take()
    }

    pub(crate) fn set_running(&mut self) {
        debug_assert_eq!(self.status, ExecutionStatus::Unstarted);
        self.status = ExecutionStatus::Running;
    }

    pub(crate) fn set_done(&mut self, error: Option<ExecutionError>) {
        debug_assert_ne!(self.status, ExecutionStatus::Done);
        self.status = ExecutionStatus::Done;
        self.evaluation_error = error;
    }

    /// Fails a module before its body could run.
    pub(crate) fn set_link_failed(&mut self, error: ExecutionError) {
        if self.status == ExecutionStatus::Unstarted {
            self.status = ExecutionStatus::Running;
        }
        self.set_done(Some(error));
    }

    /// A module provided by the host: already evaluated, exports installed
    /// directly on its registry.
    pub(crate) fn preloaded(id: ModuleId) -> Module {
        let mut module = ModuleBuilder::new(id).build();
        module.status = ExecutionStatus::Done;
        module.linked = true;
        module.preloaded = true;
        module
    }
}

/// Declares a module's bindings and body.
///
/// ```
/// use relink::{Module, Value};
///
/// let counter = Module::builder("./counter")
///     .export("count")
///     .body(|scope| scope.assign("count", Value::from(0)))
///     .build();
/// assert_eq!(counter.exports().len(), 1);
/// ```
pub struct ModuleBuilder {
    id: ModuleId,
    requested: Vec<ModuleId>,
    imports: Vec<ImportEntry>,
    exports: Vec<ExportEntry>,
    locals: AHashMap<String, Slot>,
    body: Option<ModuleBody>,
}

impl ModuleBuilder {
    fn new(id: ModuleId) -> Self {
        Self {
            id,
            requested: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            locals: AHashMap::default(),
            body: None,
        }
    }

    /// `import "specifier"`
    pub fn request(mut self, specifier: impl Into<ModuleId>) -> Self {
        let specifier = specifier.into();
        if !self.requested.contains(&specifier) {
            self.requested.push(specifier);
        }
        self
    }

    fn push_import(&mut self, specifier: ModuleId, import: ImportName, local: &str) {
        if !self.requested.contains(&specifier) {
            self.requested.push(specifier.clone());
        }
        self.imports.push(ImportEntry {
            specifier,
            import,
            local: local.to_owned(),
        });
    }

    /// `import { name as local } from "specifier"`
    pub fn import(mut self, specifier: impl Into<ModuleId>, name: &str, local: &str) -> Self {
        self.push_import(specifier.into(), ImportName::from(name), local);
        self
    }

    /// `import * as local from "specifier"`
    pub fn import_namespace(mut self, specifier: impl Into<ModuleId>, local: &str) -> Self {
        self.push_import(specifier.into(), ImportName::Namespace, local);
        self
    }

    /// Declares a local binding, initially `undefined`.
    pub fn local(mut self, name: &str) -> Self {
        self.locals.entry(name.to_owned()).or_default();
        self
    }

    /// Declares a local binding with a value available before the body runs,
    /// such as a function declaration.
    pub fn hoisted(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.locals.insert(name.to_owned(), Slot::new(value.into()));
        self
    }

    /// `export let name`
    pub fn export(self, name: &str) -> Self {
        self.local(name).export_as(name, name)
    }

    /// `export function name() {}`
    pub fn export_function(self, function: Function) -> Self {
        let name = function.name().to_owned();
        self.hoisted(&name, function).export_as(&name, &name)
    }

    /// `export { local as exported }`
    pub fn export_as(mut self, local: &str, exported: &str) -> Self {
        self.exports.push(ExportEntry::Local {
            exported: exported.to_owned(),
            local: local.to_owned(),
        });
        self
    }

    /// `export { name as exported } from "specifier"`
    pub fn reexport(mut self, specifier: impl Into<ModuleId>, name: &str, exported: &str) -> Self {
        let specifier = specifier.into();
        self = self.request(specifier.clone());
        self.exports.push(ExportEntry::Indirect {
            exported: exported.to_owned(),
            specifier,
            import: ImportName::from(name),
        });
        self
    }

    /// `export * as exported from "specifier"`
    pub fn reexport_namespace(mut self, specifier: impl Into<ModuleId>, exported: &str) -> Self {
        let specifier = specifier.into();
        self = self.request(specifier.clone());
        self.exports.push(ExportEntry::Indirect {
            exported: exported.to_owned(),
            specifier,
            import: ImportName::Namespace,
        });
        self
    }

    /// `export * from "specifier"`
    pub fn reexport_all(mut self, specifier: impl Into<ModuleId>) -> Self {
        let specifier = specifier.into();
        self = self.request(specifier.clone());
        self.exports.push(ExportEntry::Star { specifier });
        self
    }

    pub fn body(
        mut self,
        body: impl FnOnce(&mut ModuleScope<'_>) -> Result<(), ExecutionError> + 'static,
    ) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    pub fn build(self) -> Module {
        let registry = BindingRegistry::new(self.id.clone());
        Module {
            id: self.id,
            requested: self.requested,
            imports: self.imports,
            exports: self.exports,
            locals: self.locals,
            body: self.body,
            status: ExecutionStatus::Unstarted,
            evaluation_error: None,
            linked: false,
            linked_imports: AHashMap::default(),
            registry,
            preloaded: false,
        }
    }
}
