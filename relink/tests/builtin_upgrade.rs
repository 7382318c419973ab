// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{cell::RefCell, rc::Rc};

use relink::{
    HostLoader, Module, ModuleGraph, PreloadedModule, Value, execute_all,
    module::value::Class, notify_already_loaded,
};

struct Host {
    module_class: Class,
}

impl HostLoader for Host {
    fn already_loaded(&self) -> Vec<PreloadedModule> {
        vec![PreloadedModule {
            id: "module".into(),
            exports: vec![
                ("Module".to_owned(), Value::from(self.module_class.clone())),
                ("version".to_owned(), Value::from("1.0")),
            ],
        }]
    }
}

#[test]
fn upgraded_builtin_passes_the_same_capability_check() {
    let module_class = Class::new("Module");
    // Obtained by the host before any registry existed.
    let early = Value::from(module_class.construct());

    let mut graph = ModuleGraph::new();
    graph
        .register_preloaded(
            "module",
            [("Module".to_owned(), Value::from(module_class.clone()))],
        )
        .unwrap();
    let registry = graph.get("module").unwrap().registry().clone();
    assert!(!registry.is_live("Module"));

    let host = Host {
        module_class: module_class.clone(),
    };
    let handles = graph.adopt_host(&host).unwrap();
    assert_eq!(handles.len(), 1);
    assert!(registry.is_live("Module"));
    assert!(registry.is_live("version"));

    let fresh_class = module_class.clone();
    graph
        .insert(
            Module::builder("fresh")
                .hoisted("Module", fresh_class)
                .export_as("Module", "Module")
                .build(),
        )
        .unwrap();

    let checks = Rc::new(RefCell::new(Vec::new()));
    let observed = checks.clone();
    let early_instance = early.clone();
    graph
        .insert(
            Module::builder("main")
                .import("module", "Module", "Builtin")
                .import("fresh", "Module", "Fresh")
                .body(move |scope| {
                    for local in ["Builtin", "Fresh"] {
                        let Value::Class(class) = scope.read(local)? else {
                            return Err(relink::ExecutionError::throw("not a class"));
                        };
                        observed.borrow_mut().push((
                            early_instance.instance_of(&class),
                            Value::from(class.construct()).instance_of(&class),
                        ));
                    }
                    Ok(())
                })
                .build(),
        )
        .unwrap();

    execute_all(&mut graph, "main").unwrap();
    assert_eq!(*checks.borrow(), [(true, true), (true, true)]);
}

#[test]
fn host_updates_are_visible_to_importers() {
    let mut graph = ModuleGraph::new();
    let host = notify_already_loaded(
        &mut graph,
        "process",
        [("exitCode".to_owned(), Value::from(0))],
    )
    .unwrap();

    let seen = Rc::new(RefCell::new(None));
    let observed = seen.clone();
    graph
        .insert(
            Module::builder("main")
                .import("process", "exitCode", "exitCode")
                .body(move |scope| {
                    *observed.borrow_mut() = Some(scope.import("exitCode")?);
                    Ok(())
                })
                .build(),
        )
        .unwrap();
    execute_all(&mut graph, "main").unwrap();

    let exit_code = seen.borrow_mut().take().unwrap();
    assert_eq!(exit_code.read().unwrap(), Value::from(0));
    host.set("exitCode", 1).unwrap();
    assert_eq!(exit_code.read().unwrap(), Value::from(1));
    assert_eq!(host.get("exitCode"), Some(Value::from(1)));
}

#[test]
fn upgrading_twice_keeps_one_binding() {
    let mut graph = ModuleGraph::new();
    let first = notify_already_loaded(&mut graph, "os", [("eol".to_owned(), Value::from("\n"))])
        .unwrap();
    let second =
        notify_already_loaded(&mut graph, "os", [("eol".to_owned(), Value::from("\r\n"))])
            .unwrap();
    assert_eq!(graph.read("os", "eol").unwrap(), Value::from("\r\n"));
    first.set("eol", "ignored").unwrap();
    assert_eq!(graph.read("os", "eol").unwrap(), Value::from("\r\n"));
    second.set("eol", "\n").unwrap();
    assert_eq!(graph.read("os", "eol").unwrap(), Value::from("\n"));
    assert_eq!(graph.get("os").unwrap().registry().names(), ["eol"]);
}
