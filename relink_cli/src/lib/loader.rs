// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loads a module and its relative imports from disk into a module graph.

use std::{
    collections::VecDeque,
    io,
    path::{Component, Path, PathBuf},
};

use ahash::{AHashMap, AHashSet};
use relink::{
    ExecutionError, Module, ModuleGraph, ModuleId, ModuleTree, ParseFailure, ParseFn, Value,
    ast::{ExportDeclaration, Item},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("cannot resolve '{specifier}' from '{}'", referrer.display())]
    NotFound { specifier: String, referrer: PathBuf },
    #[error("'{}' has syntax errors", path.display())]
    Parse {
        path: PathBuf,
        source_text: String,
        failure: ParseFailure,
    },
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Every module reachable from an entry file.
pub struct LoadedGraph {
    pub entry: ModuleId,
    pub graph: ModuleGraph,
    /// Bare specifiers, registered as host modules without a body.
    pub external: Vec<ModuleId>,
}

pub struct DiskLoader {
    root: PathBuf,
    parse: ParseFn,
}

impl DiskLoader {
    pub fn new(root: impl Into<PathBuf>, parse: ParseFn) -> Self {
        Self {
            root: normalize(&root.into()),
            parse,
        }
    }

    /// Module id of a file: its path relative to the root.
    pub fn id_of(&self, path: &Path) -> ModuleId {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let mut id = String::from(".");
        for component in relative.components() {
            id.push('/');
            id.push_str(&component.as_os_str().to_string_lossy());
        }
        ModuleId::from(id)
    }

    /// Resolves a relative or absolute specifier against the file importing
    /// it. Bare specifiers resolve to `None`.
    pub fn resolve(&self, referrer: &Path, specifier: &str) -> Result<Option<PathBuf>, LoadError> {
        if !(specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/'))
        {
            return Ok(None);
        }
        let base = referrer.parent().unwrap_or(&self.root);
        let joined = normalize(&base.join(specifier));
        let candidates = [
            joined.clone(),
            joined.with_extension("js"),
            joined.with_extension("mjs"),
            joined.join("index.js"),
        ];
        candidates
            .into_iter()
            .find(|candidate| candidate.is_file())
            .map(Some)
            .ok_or_else(|| LoadError::NotFound {
                specifier: specifier.to_owned(),
                referrer: referrer.to_owned(),
            })
    }

    /// Loads `entry` and, transitively, every relative module it requests.
    pub fn load(&self, entry: &Path) -> Result<LoadedGraph, LoadError> {
        let entry = normalize(&self.root.join(entry));
        let entry_id = self.id_of(&entry);
        let mut graph = ModuleGraph::new();
        let mut seen: AHashSet<PathBuf> = AHashSet::default();
        // Names requested from each bare specifier.
        let mut external: AHashMap<String, Vec<String>> = AHashMap::default();
        let mut external_order: Vec<String> = Vec::new();
        let mut queue = VecDeque::from([entry.clone()]);
        seen.insert(entry);

        while let Some(path) = queue.pop_front() {
            let source_text = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let tree = (self.parse)(&source_text).map_err(|failure| LoadError::Parse {
                path: path.clone(),
                source_text: source_text.clone(),
                failure,
            })?;

            let mut resolved: AHashMap<String, ModuleId> = AHashMap::default();
            for specifier in tree.module_requests() {
                match self.resolve(&path, specifier)? {
                    Some(target) => {
                        resolved.insert(specifier.to_owned(), self.id_of(&target));
                        if seen.insert(target.clone()) {
                            queue.push_back(target);
                        }
                    }
                    None => {
                        resolved.insert(specifier.to_owned(), ModuleId::from(specifier));
                        if !external.contains_key(specifier) {
                            external_order.push(specifier.to_owned());
                        }
                        let names = external.entry(specifier.to_owned()).or_default();
                        for name in requested_names(&tree, specifier) {
                            if !names.contains(&name) {
                                names.push(name);
                            }
                        }
                    }
                }
            }

            let id = self.id_of(&path);
            debug!(module = %id, requests = resolved.len(), "loaded module");
            let module = Module::from_tree(id, &tree, |specifier| {
                resolved
                    .get(specifier)
                    .cloned()
                    .unwrap_or_else(|| ModuleId::from(specifier))
            });
            graph.insert(module)?;
        }

        let mut externals = Vec::with_capacity(external_order.len());
        for specifier in external_order {
            let names = external.remove(&specifier).unwrap_or_default();
            graph.register_preloaded(
                specifier.as_str(),
                names.into_iter().map(|name| (name, Value::Undefined)),
            )?;
            externals.push(ModuleId::from(specifier));
        }

        Ok(LoadedGraph {
            entry: entry_id,
            graph,
            external: externals,
        })
    }
}

impl LoadedGraph {
    /// Runs the graph from its entry and returns the order in which module
    /// bodies started.
    pub fn execution_order(&mut self) -> Result<Vec<ModuleId>, LoadError> {
        relink::execute_all(&mut self.graph, &self.entry)?;
        Ok(self.graph.execution_order().to_vec())
    }
}

/// Names `tree` imports or re-exports from `specifier`.
fn requested_names(tree: &ModuleTree, specifier: &str) -> Vec<String> {
    let mut names = Vec::new();
    for item in &tree.items {
        match item {
            Item::Import(import) if import.source == specifier => names.extend(
                import
                    .specifiers
                    .iter()
                    .filter_map(|s| s.imported.name().map(str::to_owned)),
            ),
            Item::Export(ExportDeclaration::From {
                source, specifiers, ..
            }) if source == specifier => {
                names.extend(specifiers.iter().map(|s| s.imported.clone()))
            }
            _ => {}
        }
    }
    names
}

/// Removes `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalize_drops_dot_components() {
        assert_eq!(
            normalize(Path::new("/a/./b/../c.js")),
            PathBuf::from("/a/c.js")
        );
    }

    #[test]
    fn ids_are_root_relative() {
        let loader = DiskLoader::new("/project", relink::parsers::oxc::parse);
        assert_eq!(
            loader.id_of(Path::new("/project/src/a.js")).as_str(),
            "./src/a.js"
        );
    }

    #[test]
    fn bare_specifiers_are_external() {
        let loader = DiskLoader::new("/project", relink::parsers::oxc::parse);
        assert!(matches!(
            loader.resolve(Path::new("/project/a.js"), "node:fs"),
            Ok(None)
        ));
        assert!(matches!(
            loader.resolve(Path::new("/project/a.js"), "./missing"),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn loads_the_fixture_cycle() {
        let root: PathBuf = [env!("CARGO_MANIFEST_DIR"), "..", "relink", "tests", "fixtures"]
            .iter()
            .collect();
        let loader = DiskLoader::new(root, relink::parsers::oxc::parse);
        let mut loaded = loader.load(Path::new("cycle_a.js")).unwrap();
        let order: Vec<String> = loaded
            .execution_order()
            .unwrap()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(order, ["./cycle_b.js", "./cycle_a.js"]);
        assert!(loaded.external.is_empty());
    }
}
