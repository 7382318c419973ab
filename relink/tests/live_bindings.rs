// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use relink::{
    CompileOptions, Module, ModuleGraph, Value, compile, execute_all, module::value::Function,
};

/// `export let count = 0; export function reset() {...}; export function add(n) {...}`
fn counter() -> Module {
    Module::builder("./counter")
        .export("count")
        .export("reset")
        .export("add")
        .body(|scope| {
            let count = scope.slot("count")?;
            scope.assign("count", 10)?;
            let slot = count.clone();
            scope.assign(
                "reset",
                Function::new("reset", move |_| {
                    slot.set(0);
                    Ok(Value::Undefined)
                }),
            )?;
            scope.assign(
                "add",
                Function::new("add", move |arguments| {
                    let n = arguments.first().and_then(Value::as_number).unwrap_or(0.0);
                    let current = count.get().as_number().unwrap_or(0.0);
                    count.set(current + n);
                    Ok(Value::Undefined)
                }),
            )
        })
        .build()
}

#[test]
fn imported_counter_follows_every_mutation() {
    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let observed = seen.clone();
    let main = Module::builder("main")
        .import("./counter", "count", "count")
        .import("./counter", "reset", "reset")
        .import("./counter", "add", "add")
        .body(move |scope| {
            let mut observed = observed.borrow_mut();
            observed.push(scope.read("count")?);
            scope.call("reset", &[])?;
            observed.push(scope.read("count")?);
            scope.call("add", &[Value::from(2)])?;
            observed.push(scope.read("count")?);
            scope.call("add", &[Value::from(3)])?;
            observed.push(scope.read("count")?);
            scope.call("reset", &[])?;
            observed.push(scope.read("count")?);
            Ok(())
        })
        .build();

    let mut graph = ModuleGraph::new();
    graph.insert(counter()).unwrap();
    graph.insert(main).unwrap();
    execute_all(&mut graph, "main").unwrap();

    let expected: Vec<Value> = [10, 0, 2, 5, 0].into_iter().map(Value::from).collect();
    assert_eq!(*seen.borrow(), expected);
    assert_eq!(graph.read("./counter", "count").unwrap(), Value::from(0));
}

#[test]
fn namespace_imports_are_live() {
    let main = Module::builder("main")
        .import_namespace("./counter", "counter")
        .body(|scope| {
            let counter = scope.namespace("counter")?;
            counter.read("add")?.call(&[Value::from(4)])?;
            assert_eq!(counter.read("count")?, Value::from(14));
            Ok(())
        })
        .build();
    let mut graph = ModuleGraph::new();
    graph.insert(counter()).unwrap();
    graph.insert(main).unwrap();
    execute_all(&mut graph, "main").unwrap();
}

#[test]
fn reexports_read_the_original_slot() {
    let proxy = Module::builder("./proxy")
        .reexport("./counter", "count", "total")
        .reexport_all("./counter")
        .build();
    let mut graph = ModuleGraph::new();
    graph.insert(counter()).unwrap();
    graph.insert(proxy).unwrap();
    execute_all(&mut graph, "./proxy").unwrap();

    assert_eq!(graph.read("./proxy", "total").unwrap(), Value::from(10));
    graph.read("./proxy", "add").unwrap().call(&[Value::from(1)]).unwrap();
    assert_eq!(graph.read("./proxy", "total").unwrap(), Value::from(11));
    assert_eq!(graph.read("./proxy", "count").unwrap(), Value::from(11));
}

#[test]
fn assigning_to_an_import_fails() {
    let main = Module::builder("main")
        .import("./counter", "count", "count")
        .body(|scope| scope.assign("count", 1))
        .build();
    let mut graph = ModuleGraph::new();
    graph.insert(counter()).unwrap();
    graph.insert(main).unwrap();
    let error = execute_all(&mut graph, "main").unwrap_err();
    assert_eq!(error.failed_module().map(|id| id.as_str()), Some("main"));
}

#[test]
fn compiled_code_reads_imports_at_every_use() {
    let output = compile(
        "import { count, add } from './counter.js';\n\
         add(2);\n\
         export const snapshot = count;\n\
         export function current() { return count; }\n",
        &CompileOptions::default(),
    )
    .unwrap();
    assert_eq!(
        output.code,
        "module.export({ snapshot: () => snapshot, current: () => current });\n\
         var _counter = module.import(\"./counter.js\");\n\
         (0, _counter.add)(2);\n\
         const snapshot = _counter.count;\n\
         function current() { return _counter.count; }\n"
    );
}
