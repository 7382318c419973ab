// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Host loader interface
//!
//! Hosts usually have some modules loaded before any module graph exists,
//! such as runtime built-ins. Those start out in the graph as plain values
//! and are upgraded to live bindings once the host hands them over, so that
//! later changes on the host side reach every importer.

use std::rc::Rc;

use ahash::AHashMap;
use tracing::debug;

use super::{ModuleId, Slot, graph::ModuleGraph, value::Value};
use crate::error::ExecutionError;

/// A module the host loaded on its own, with the values of its exports at
/// the time it was handed over.
#[derive(Debug, Clone)]
pub struct PreloadedModule {
    pub id: ModuleId,
    pub exports: Vec<(String, Value)>,
}

pub trait HostLoader {
    /// Modules that were loaded before the module graph existed.
    fn already_loaded(&self) -> Vec<PreloadedModule>;
}

/// Host-side handle to an upgraded module. Setting an export through it is
/// visible to every importer that reads through the registry.
#[derive(Debug)]
pub struct HostModule {
    id: ModuleId,
    slots: AHashMap<String, Slot>,
}

impl HostModule {
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.slots.get(name).map(Slot::get)
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), ExecutionError> {
        let Some(slot) = self.slots.get(name) else {
            return Err(ExecutionError::UnknownLocal {
                module: self.id.clone(),
                name: name.to_owned(),
            });
        };
        slot.set(value);
        Ok(())
    }
}

/// Upgrades every export in `snapshot` to a live accessor over a fresh
/// slot seeded with the snapshot's value. A module the graph does not know
/// yet is registered first.
///
/// Fails for modules that were not preloaded: their exports already read
/// their own slots.
pub fn notify_already_loaded(
    graph: &mut ModuleGraph,
    id: impl Into<ModuleId>,
    snapshot: impl IntoIterator<Item = (String, Value)>,
) -> Result<HostModule, ExecutionError> {
    let id = id.into();
    if !graph.contains(&id) {
        graph.register_preloaded(id.clone(), [])?;
    }
    let index = graph.index_of(&id)?;
    if !graph[index].is_preloaded() {
        return Err(ExecutionError::NotPreloaded(id));
    }
    let registry = graph[index].registry().clone();
    let mut slots = AHashMap::default();
    for (name, value) in snapshot {
        let slot = Slot::new(value);
        let reader = slot.clone();
        let accessor = Rc::new(move || reader.get());
        if registry.contains(&name) {
            registry.upgrade(&name, accessor)?;
        } else {
            registry.install(&name, accessor)?;
        }
        slots.insert(name, slot);
    }
    debug!(module = %id, exports = slots.len(), "upgraded host module");
    Ok(HostModule { id, slots })
}

impl ModuleGraph {
    /// Registers and upgrades every module the host already loaded.
    pub fn adopt_host(&mut self, host: &dyn HostLoader) -> Result<Vec<HostModule>, ExecutionError> {
        host.already_loaded()
            .into_iter()
            .map(|module| notify_already_loaded(self, module.id, module.exports))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn upgrade_keeps_names_and_goes_live() {
        let mut graph = ModuleGraph::new();
        graph
            .register_preloaded("fs", [("sep".to_owned(), Value::from("/"))])
            .unwrap();
        let registry = graph.get("fs").unwrap().registry().clone();
        assert!(!registry.is_live("sep"));

        let host = notify_already_loaded(&mut graph, "fs", [("sep".to_owned(), Value::from("/"))])
            .unwrap();
        assert!(registry.is_live("sep"));
        host.set("sep", "\\").unwrap();
        assert_eq!(graph.read("fs", "sep").unwrap(), Value::from("\\"));
        assert!(host.set("missing", 1).is_err());
    }

    #[test]
    fn compiled_modules_are_never_upgraded() {
        use crate::{Module, execute_all};

        let mut graph = ModuleGraph::new();
        graph
            .insert(
                Module::builder("counter")
                    .export("count")
                    .body(|scope| scope.assign("count", 1))
                    .build(),
            )
            .unwrap();
        execute_all(&mut graph, "counter").unwrap();

        let error =
            notify_already_loaded(&mut graph, "counter", [("count".to_owned(), Value::from(1))])
                .unwrap_err();
        assert!(matches!(error, ExecutionError::NotPreloaded(ref id) if id.as_str() == "counter"));

        graph.get("counter").unwrap().slot("count").unwrap().set(42);
        assert_eq!(graph.read("counter", "count").unwrap(), Value::from(42));
    }

    #[test]
    fn unknown_modules_are_registered() {
        let mut graph = ModuleGraph::new();
        let host = notify_already_loaded(&mut graph, "os", [("eol".to_owned(), Value::from("\n"))])
            .unwrap();
        assert_eq!(host.get("eol"), Some(Value::from("\n")));
        assert_eq!(graph.read("os", "eol").unwrap(), Value::from("\n"));
    }
}
