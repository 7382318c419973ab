// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{cell::RefCell, rc::Rc};

use relink::{Module, ModuleGraph, ModuleId, execute_all, parsers::oxc::parse};

type Log = Rc<RefCell<Vec<String>>>;

/// Builds a graph from `(id, source)` pairs. Every body logs its module id.
fn graph_of(sources: &[(&str, &str)], log: &Log) -> ModuleGraph {
    let mut graph = ModuleGraph::new();
    for (id, source) in sources {
        let tree = parse(source).unwrap();
        let log = log.clone();
        let name = id.to_string();
        let module = Module::from_tree(*id, &tree, |specifier| ModuleId::from(specifier))
            .with_body(move |_| {
                log.borrow_mut().push(name);
                Ok(())
            });
        graph.insert(module).unwrap();
    }
    graph
}

const CHAIN: &[(&str, &str)] = &[
    ("a", "console.log('a');"),
    ("b", "import 'a';\nconsole.log('b');"),
    ("c", "import 'b';\nconsole.log('c');"),
];

#[test]
fn chain_runs_dependencies_first() {
    let log = Log::default();
    let mut graph = graph_of(CHAIN, &log);
    execute_all(&mut graph, "c").unwrap();
    assert_eq!(*log.borrow(), ["a", "b", "c"]);
}

#[test]
fn every_entry_reaching_c_sees_the_same_order() {
    let entries: &[(&str, &str)] = &[
        ("main", "import 'c';"),
        ("other", "import { x } from 'dep';\nimport 'c';"),
        ("dep", "export const x = 1;"),
    ];
    for entry in ["main", "other"] {
        let log = Log::default();
        let sources: Vec<(&str, &str)> = CHAIN.iter().chain(entries).copied().collect();
        let mut graph = graph_of(&sources, &log);
        execute_all(&mut graph, entry).unwrap();
        let order: Vec<String> = log.borrow().iter().filter(|id| id.len() == 1).cloned().collect();
        assert_eq!(order, ["a", "b", "c"]);
        assert_eq!(log.borrow().last().map(String::as_str), Some(entry));
    }
}

#[test]
fn each_module_runs_once_across_entries() {
    let log = Log::default();
    let sources: Vec<(&str, &str)> = CHAIN
        .iter()
        .copied()
        .chain([("x", "import 'c';\nimport 'a';"), ("y", "import 'b';")])
        .collect();
    let mut graph = graph_of(&sources, &log);
    execute_all(&mut graph, "x").unwrap();
    execute_all(&mut graph, "y").unwrap();
    execute_all(&mut graph, "c").unwrap();
    assert_eq!(*log.borrow(), ["a", "b", "c", "x", "y"]);
    let order: Vec<&str> = graph.execution_order().iter().map(ModuleId::as_str).collect();
    assert_eq!(order, ["a", "b", "c", "x", "y"]);
}

#[test]
fn requests_run_in_source_order() {
    let log = Log::default();
    let sources: &[(&str, &str)] = &[
        ("main", "export * from 'z';\nimport { y } from 'y';\nimport 'x';"),
        ("x", ""),
        ("y", "export let y;"),
        ("z", ""),
    ];
    let mut graph = graph_of(sources, &log);
    execute_all(&mut graph, "main").unwrap();
    assert_eq!(*log.borrow(), ["z", "y", "x", "main"]);
}
