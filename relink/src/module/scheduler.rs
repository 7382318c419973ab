// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## Execution scheduler
//!
//! Runs every module reachable from an entry module exactly once. Execution
//! happens in two depth-first passes over the requested modules, in
//! declaration order:
//!
//! 1. Linking installs every module's exports on its registry and resolves
//!    its imports. After this pass any module may read any other module's
//!    exports, so cyclic partners never see a missing binding, only a value
//!    that has not been assigned yet.
//! 2. Evaluation runs a module's body right after the bodies of its
//!    dependencies. A dependency that is still running is a back edge and is
//!    skipped.

use std::rc::Rc;

use ahash::AHashMap;
use tracing::{debug, trace, warn};

use super::{
    ExecutionStatus, ExportEntry, ModuleId,
    graph::{ModuleGraph, ModuleIndex},
    scope::{LiveImport, ModuleScope},
};
use crate::{ast::ImportName, error::ExecutionError};

/// Links and evaluates `entry` and everything it depends on.
pub fn execute_all(graph: &mut ModuleGraph, entry: &str) -> Result<(), ExecutionError> {
    let entry = graph.index_of(entry)?;
    debug!(entry = %graph[entry].id(), "linking module graph");
    inner_module_linking(graph, entry)?;
    debug!(entry = %graph[entry].id(), "evaluating module graph");
    inner_module_evaluation(graph, entry)
}

fn inner_module_linking(graph: &mut ModuleGraph, index: ModuleIndex) -> Result<(), ExecutionError> {
    // 1. If module failed before, return its error.
    if let Some(error) = graph[index].evaluation_error() {
        return Err(error.clone());
    }
    // 2. If module is already linked, or is being linked further up the
    //    stack, return.
    if graph[index].is_linked() {
        return Ok(());
    }
    // 3. Install the exports and resolve the imports before descending, so
    //    that cycles find this module linked.
    let imports = match initialize_environment(graph, index) {
        Ok(imports) => imports,
        Err(error) => {
            graph[index].set_link_failed(error.clone());
            return Err(error);
        }
    };
    graph[index].set_linked(imports);
    trace!(module = %graph[index].id(), "linked");
    // 4. For each requested module, link it.
    let requested = graph[index].requested_modules().to_vec();
    for specifier in requested {
        let result = graph
            .index_of(&specifier)
            .and_then(|required| inner_module_linking(graph, required));
        if let Err(error) = result {
            if graph[index].status() != ExecutionStatus::Done {
                graph[index].set_link_failed(error.clone());
            }
            return Err(error);
        }
    }
    Ok(())
}

/// Installs the module's exports on its registry and resolves its imports
/// against the registries of the modules they come from.
fn initialize_environment(
    graph: &ModuleGraph,
    index: ModuleIndex,
) -> Result<AHashMap<String, LiveImport>, ExecutionError> {
    let module = &graph[index];
    let registry = module.registry();
    let source_registry = |specifier: &ModuleId| {
        graph
            .index_of(specifier)
            .map(|source| graph[source].registry().clone())
    };

    // 1. For each ExportEntry e of module.[[ExportEntries]], do
    for entry in module.exports() {
        match entry {
            ExportEntry::Local { exported, local } => {
                // a. A local binding is read through its slot.
                if let Some(slot) = module.slot(local) {
                    let slot = slot.clone();
                    registry.install(exported, Rc::new(move || slot.get()))?;
                    continue;
                }
                // b. Exporting an imported binding re-exports it.
                let Some(import) = module.imports().iter().find(|import| import.local == *local)
                else {
                    return Err(ExecutionError::UnknownLocal {
                        module: module.id().clone(),
                        name: local.clone(),
                    });
                };
                let source = source_registry(&import.specifier)?;
                match &import.import {
                    ImportName::Name(name) => registry.install_indirect(exported, &source, name)?,
                    ImportName::Namespace => registry.install_namespace(exported, &source)?,
                }
            }
            ExportEntry::Indirect {
                exported,
                specifier,
                import,
            } => {
                let source = source_registry(specifier)?;
                match import {
                    ImportName::Name(name) => registry.install_indirect(exported, &source, name)?,
                    ImportName::Namespace => registry.install_namespace(exported, &source)?,
                }
            }
            ExportEntry::Star { specifier } => {
                registry.add_star_source(&source_registry(specifier)?);
            }
        }
    }

    // 2. For each ImportEntry in of module.[[ImportEntries]], do
    let mut imports = AHashMap::with_capacity(module.imports().len());
    for import in module.imports() {
        let source = graph.index_of(&import.specifier)?;
        // a. A named import must be provided by its source module.
        if let ImportName::Name(name) = &import.import
            && graph.provides(&import.specifier, name) != Some(true)
        {
            return Err(ExecutionError::UnresolvedBinding {
                module: module.id().clone(),
                specifier: import.specifier.clone(),
                name: name.clone(),
            });
        }
        imports.insert(
            import.local.clone(),
            LiveImport::new(graph[source].registry().clone(), import.import.clone()),
        );
    }
    Ok(imports)
}

fn inner_module_evaluation(
    graph: &mut ModuleGraph,
    index: ModuleIndex,
) -> Result<(), ExecutionError> {
    match graph[index].status() {
        // 1. If module is done, return its evaluation error, if any.
        ExecutionStatus::Done => {
            return match graph[index].evaluation_error() {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            };
        }
        // 2. If module is running, this is a back edge.
        ExecutionStatus::Running => {
            trace!(module = %graph[index].id(), "skipping running module");
            return Ok(());
        }
        ExecutionStatus::Unstarted => {}
    }
    // 3. Set module's status to running.
    graph[index].set_running();
    // 4. For each requested module, evaluate it first.
    let requested = graph[index].requested_modules().to_vec();
    for specifier in requested {
        let result = graph
            .index_of(&specifier)
            .and_then(|required| inner_module_evaluation(graph, required));
        // a. A failed dependency fails this module too; its body never runs.
        if let Err(error) = result {
            graph[index].set_done(Some(error.clone()));
            return Err(error);
        }
    }
    // 5. Run the body and record the outcome.
    let result = execute_module(graph, index);
    graph[index].set_done(result.as_ref().err().cloned());
    result
}

fn execute_module(graph: &mut ModuleGraph, index: ModuleIndex) -> Result<(), ExecutionError> {
    let id = graph[index].id().clone();
    graph.record_execution(id.clone());
    let Some(body) = graph[index].take_body() else {
        debug!(module = %id, "module has no body");
        return Ok(());
    };
    debug!(module = %id, "running module body");
    let mut scope = ModuleScope::new(&graph[index]);
    body(&mut scope).map_err(|error| {
        warn!(module = %id, %error, "module body failed");
        ExecutionError::Evaluation {
            module: id,
            source: Box::new(error),
        }
    })
}
