// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! What a module body sees while it runs.

use super::{Module, ModuleId, Slot, registry::BindingRegistry, value::Value};
use crate::{ast::ImportName, error::ExecutionError};

/// An import resolved during linking. Reading it always goes through the
/// source module's registry, so the value is never a snapshot.
#[derive(Debug, Clone)]
pub struct LiveImport {
    registry: BindingRegistry,
    import: ImportName,
}

impl LiveImport {
    pub(crate) fn new(registry: BindingRegistry, import: ImportName) -> Self {
        Self { registry, import }
    }

    pub fn read(&self) -> Result<Value, ExecutionError> {
        match &self.import {
            ImportName::Name(name) => Ok(self.registry.read(name)?),
            ImportName::Namespace => Ok(Value::Namespace(self.registry.clone())),
        }
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }
}

pub struct ModuleScope<'m> {
    module: &'m Module,
}

impl<'m> ModuleScope<'m> {
    pub(crate) fn new(module: &'m Module) -> Self {
        Self { module }
    }

    pub fn id(&self) -> &ModuleId {
        self.module.id()
    }

    fn unknown(&self, name: &str) -> ExecutionError {
        ExecutionError::UnknownLocal {
            module: self.module.id().clone(),
            name: name.to_owned(),
        }
    }

    /// Reads a local binding or an import.
    pub fn read(&self, name: &str) -> Result<Value, ExecutionError> {
        if let Some(slot) = self.module.locals().get(name) {
            return Ok(slot.get());
        }
        match self.module.linked_imports().get(name) {
            Some(import) => import.read(),
            None => Err(self.unknown(name)),
        }
    }

    /// Writes a local binding. Imports are read-only.
    pub fn assign(&self, name: &str, value: impl Into<Value>) -> Result<(), ExecutionError> {
        if let Some(slot) = self.module.locals().get(name) {
            slot.set(value);
            return Ok(());
        }
        if self.module.linked_imports().contains_key(name) {
            return Err(ExecutionError::ImportAssignment {
                name: name.to_owned(),
            });
        }
        Err(self.unknown(name))
    }

    /// Calls the function held by a local binding or import.
    pub fn call(&self, name: &str, arguments: &[Value]) -> Result<Value, ExecutionError> {
        self.read(name)?.call(arguments)
    }

    /// The slot behind a local binding, for closures that outlive the body.
    pub fn slot(&self, name: &str) -> Result<Slot, ExecutionError> {
        self.module
            .locals()
            .get(name)
            .cloned()
            .ok_or_else(|| self.unknown(name))
    }

    /// An import binding, for closures that outlive the body.
    pub fn import(&self, name: &str) -> Result<LiveImport, ExecutionError> {
        self.module
            .linked_imports()
            .get(name)
            .cloned()
            .ok_or_else(|| self.unknown(name))
    }

    /// The registry behind `import * as name`.
    pub fn namespace(&self, name: &str) -> Result<BindingRegistry, ExecutionError> {
        match self.read(name)? {
            Value::Namespace(registry) => Ok(registry),
            _ => Err(self.unknown(name)),
        }
    }
}
