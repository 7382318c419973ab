// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::{Index, IndexMut};

use ahash::AHashMap;

use super::{ExportEntry, Module, ModuleId, value::Value};
use crate::{error::ExecutionError, rewriter::ResolveExports};

/// Modules connected by their import edges. Edges come from each module's
/// requested modules and may form cycles.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    ids: AHashMap<ModuleId, usize>,
    /// Modules whose bodies were started, in order.
    execution_order: Vec<ModuleId>,
}

/// Index of a module inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleIndex(usize);

impl Index<ModuleIndex> for ModuleGraph {
    type Output = Module;

    fn index(&self, index: ModuleIndex) -> &Self::Output {
        &self.modules[index.0]
    }
}

impl IndexMut<ModuleIndex> for ModuleGraph {
    fn index_mut(&mut self, index: ModuleIndex) -> &mut Self::Output {
        &mut self.modules[index.0]
    }
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: Module) -> Result<(), ExecutionError> {
        if self.ids.contains_key(module.id()) {
            return Err(ExecutionError::DuplicateModule(module.id().clone()));
        }
        self.ids.insert(module.id().clone(), self.modules.len());
        self.modules.push(module);
        Ok(())
    }

    /// Records a module the host loaded before the graph existed. Its
    /// exports are installed as plain values until the host upgrades them
    /// through [`notify_already_loaded`](super::host::notify_already_loaded).
    pub fn register_preloaded(
        &mut self,
        id: impl Into<ModuleId>,
        snapshot: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<(), ExecutionError> {
        let module = Module::preloaded(id.into());
        for (name, value) in snapshot {
            module.registry().install_plain(&name, value)?;
        }
        self.insert(module)
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.ids.get(id).map(|&index| &self.modules[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    /// Modules in the order their bodies started running.
    pub fn execution_order(&self) -> &[ModuleId] {
        &self.execution_order
    }

    /// Reads export `name` of module `id` through its registry.
    pub fn read(&self, id: &str, name: &str) -> Result<Value, ExecutionError> {
        let index = self.index_of(id)?;
        Ok(self[index].registry().read(name)?)
    }

    pub(crate) fn index_of(&self, id: &str) -> Result<ModuleIndex, ExecutionError> {
        self.ids
            .get(id)
            .map(|&index| ModuleIndex(index))
            .ok_or_else(|| ExecutionError::UnknownModule(ModuleId::from(id)))
    }

    pub(crate) fn record_execution(&mut self, id: ModuleId) {
        self.execution_order.push(id);
    }

    /// Whether module `id` exports `name`, judged from its export entries
    /// and anything already installed on its registry. Returns `None` for
    /// modules outside the graph.
    pub fn provides(&self, id: &str, name: &str) -> Option<bool> {
        let index = self.index_of(id).ok()?;
        Some(self.provides_inner(index, name, &mut Vec::new()))
    }

    fn provides_inner(&self, index: ModuleIndex, name: &str, visited: &mut Vec<ModuleIndex>) -> bool {
        if visited.contains(&index) {
            return false;
        }
        visited.push(index);
        let module = &self[index];
        if module.registry().provides(name) {
            return true;
        }
        module.exports().iter().any(|entry| match entry {
            ExportEntry::Local { exported, .. } | ExportEntry::Indirect { exported, .. } => {
                exported == name
            }
            ExportEntry::Star { specifier } => {
                name != "default"
                    && self
                        .index_of(specifier)
                        .is_ok_and(|star| self.provides_inner(star, name, visited))
            }
        })
    }
}

impl ResolveExports for ModuleGraph {
    fn provides(&self, specifier: &str, name: &str) -> Option<bool> {
        ModuleGraph::provides(self, specifier, name)
    }
}
