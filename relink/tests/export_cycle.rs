// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{cell::RefCell, rc::Rc};

use relink::{
    CompileOptions, ExportTable, Module, ModuleGraph, ModuleId, Value, compile, execute_all,
    module::{ExecutionStatus, value::Function},
    parsers::oxc::parse,
};

const A: &str = "import b from './b';\nexport default function a() { return b; }\n";
const B: &str = "import a from './a';\nexport default 'b';\nexport let late = a;\n";

#[test]
fn cyclic_default_imports_compile_against_each_other() {
    let mut table = ExportTable::new();
    table.insert("./a", &parse(A).unwrap());
    table.insert("./b", &parse(B).unwrap());
    let options = CompileOptions {
        resolver: Some(&table),
        ..Default::default()
    };
    let a = compile(A, &options).unwrap().code;
    let b = compile(B, &options).unwrap().code;
    assert_eq!(
        a,
        "module.export({ default: () => a });\n\
         var _b = module.import(\"./b\");\n\
         function a() { return _b.default; }\n"
    );
    assert_eq!(
        b,
        "module.export({ default: () => _default, late: () => late });\n\
         var _a = module.import(\"./a\");\n\
         var _default = 'b';\n\
         let late = _a.default;\n"
    );
}

#[test]
fn both_sides_find_their_bindings_installed() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut graph = ModuleGraph::new();

    let observed = seen.clone();
    let a = Module::builder("./a")
        .import("./b", "default", "b")
        .hoisted("a", Function::new("a", |_| Ok(Value::from("from a"))))
        .export_as("a", "default")
        .body(move |scope| {
            observed.borrow_mut().push(("a", scope.read("b")?));
            Ok(())
        })
        .build();
    let observed = seen.clone();
    let b = Module::builder("./b")
        .import("./a", "default", "a")
        .local("*default*")
        .export_as("*default*", "default")
        .export("late")
        .body(move |scope| {
            let a = scope.read("a")?;
            observed
                .borrow_mut()
                .push(("b", a.call(&[])?));
            scope.assign("*default*", "b")?;
            scope.assign("late", a)
        })
        .build();
    graph.insert(a).unwrap();
    graph.insert(b).unwrap();

    execute_all(&mut graph, "./a").unwrap();
    assert_eq!(
        *seen.borrow(),
        [("b", Value::from("from a")), ("a", Value::from("b"))]
    );
    for module in graph.iter() {
        assert_eq!(module.status(), ExecutionStatus::Done);
    }
}

#[test]
fn unassigned_exports_read_as_undefined_mid_cycle() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut graph = ModuleGraph::new();
    let parsed = |id: &str, source: &str| {
        Module::from_tree(id, &parse(source).unwrap(), |specifier| {
            ModuleId::from(specifier)
        })
    };

    let observed = seen.clone();
    graph
        .insert(
            parsed("./a", "import { b } from './b';\nexport let a;\n").with_body(move |scope| {
                scope.assign("a", 1)?;
                observed.borrow_mut().push(scope.read("b")?);
                Ok(())
            }),
        )
        .unwrap();
    let observed = seen.clone();
    graph
        .insert(
            parsed("./b", "import { a } from './a';\nexport let b;\n").with_body(move |scope| {
                observed.borrow_mut().push(scope.read("a")?);
                scope.assign("b", 2)
            }),
        )
        .unwrap();

    execute_all(&mut graph, "./a").unwrap();
    assert_eq!(*seen.borrow(), [Value::Undefined, Value::from(2)]);
    assert_eq!(graph.read("./a", "a").unwrap(), Value::from(1));
}

#[test]
fn anonymous_default_function_is_callable_mid_cycle() {
    const MAIN: &str = "import { used } from './user';\n\
                        export default function () { return 'hoisted'; }\n";
    const USER: &str = "import main from './main';\nexport const used = main();\n";

    let code = compile(MAIN, &CompileOptions::default()).unwrap().code;
    assert_eq!(
        code,
        "module.export({ default: () => _default });\n\
         var _user = module.import(\"./user\");\n\
         function _default() { return 'hoisted'; }\n"
    );

    let resolve = |specifier: &str| ModuleId::from(specifier);
    let main = Module::from_tree("./main", &parse(MAIN).unwrap(), resolve)
        .with_hoisted(
            "*default*",
            Function::new("_default", |_| Ok(Value::from("hoisted"))),
        )
        .with_body(|_| Ok(()));
    let user = Module::from_tree("./user", &parse(USER).unwrap(), resolve)
        .with_body(|scope| scope.assign("used", scope.call("main", &[])?));
    let mut graph = ModuleGraph::new();
    graph.insert(main).unwrap();
    graph.insert(user).unwrap();

    execute_all(&mut graph, "./main").unwrap();
    assert_eq!(graph.read("./user", "used").unwrap(), Value::from("hoisted"));
}

#[test]
fn failure_inside_a_cycle_is_shared() {
    let mut graph = ModuleGraph::new();
    graph
        .insert(Module::builder("./a").request("./b").build())
        .unwrap();
    graph
        .insert(
            Module::builder("./b")
                .request("./a")
                .body(|_| Err(relink::ExecutionError::throw("cycle broke")))
                .build(),
        )
        .unwrap();

    let error = execute_all(&mut graph, "./a").unwrap_err();
    assert_eq!(error.failed_module().map(ModuleId::as_str), Some("./b"));
    assert!(graph.get("./a").unwrap().evaluation_error().is_some());
    let again = execute_all(&mut graph, "./b").unwrap_err();
    assert_eq!(again.to_string(), error.to_string());
}
