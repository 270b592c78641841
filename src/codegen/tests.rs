use serde_json::json;

use super::emitter::RiscvEmitter;
use super::info::SymbolInfo;
use super::Generator;
use crate::ast::Program;

fn program(value: serde_json::Value) -> Program {
    serde_json::from_value(value).unwrap()
}

fn compile(value: serde_json::Value) -> String {
    let mut strategy = RiscvEmitter::new();
    Generator::new().generate(&program(value), &mut strategy)
}

#[test]
fn test_predefined_classes() {
    let generator = Generator::new();
    let model = &generator.model;

    assert_eq!(model.class(model.object_class).type_tag, 0);
    assert_eq!(model.class(model.int_class).type_tag, 1);
    assert_eq!(model.class(model.bool_class).type_tag, 2);
    assert_eq!(model.class(model.str_class).type_tag, 3);
    assert_eq!(model.class(model.list_class).type_tag, -1);

    assert!(model.class(model.object_class).super_class.is_none());
    assert_eq!(
        model.class(model.int_class).super_class,
        Some(model.object_class)
    );

    // Every class inherits object's single method in slot 0.
    for class in [model.int_class, model.bool_class, model.str_class] {
        assert_eq!(model.class(class).method_index("__init__"), Some(0));
    }

    // str: __len__ before __str__; the list pseudo-class keeps __len__
    // at the same index, which len() relies on.
    assert_eq!(model.class(model.str_class).attribute_index("__len__"), Some(0));
    assert_eq!(model.class(model.str_class).attribute_index("__str__"), Some(1));
    assert_eq!(model.class(model.list_class).attribute_index("__len__"), Some(0));

    assert!(model.class(model.list_class).dispatch_table_label.is_none());
}

#[test]
fn test_predefined_functions_are_bound() {
    let generator = Generator::new();
    let model = &generator.model;
    for name in ["print", "len", "input"] {
        match model.scopes.lookup(model.global_scope, name) {
            Some(SymbolInfo::Func(id)) => assert_eq!(model.func(id).name, name),
            other => panic!("{} must be a predefined function, got {:?}", name, other),
        }
    }
    // object.__init__ is reachable through the class, not by name.
    assert!(model.scopes.lookup(model.global_scope, "__init__").is_none());
}

#[test]
fn test_attribute_and_method_index_stability() {
    let mut generator = Generator::new();
    generator.analyze_program(&program(json!({
        "declarations": [
            {"kind": "ClassDef", "name": "A", "superClass": "object",
             "declarations": [
                {"kind": "VarDef",
                 "var": {"name": "x", "type": {"kind": "ClassType", "className": "int"}},
                 "value": {"kind": "IntegerLiteral", "value": 1}},
                {"kind": "FuncDef", "name": "m",
                 "params": [{"name": "self", "type": {"kind": "ClassType", "className": "A"}}],
                 "declarations": [], "statements": []}
             ]},
            {"kind": "ClassDef", "name": "B", "superClass": "A",
             "declarations": [
                {"kind": "VarDef",
                 "var": {"name": "y", "type": {"kind": "ClassType", "className": "int"}},
                 "value": {"kind": "IntegerLiteral", "value": 2}},
                {"kind": "FuncDef", "name": "m",
                 "params": [{"name": "self", "type": {"kind": "ClassType", "className": "B"}}],
                 "declarations": [], "statements": []},
                {"kind": "FuncDef", "name": "n",
                 "params": [{"name": "self", "type": {"kind": "ClassType", "className": "B"}}],
                 "declarations": [], "statements": []}
             ]}
        ]
    })));

    let model = &generator.model;
    let a = match model.scopes.lookup(model.global_scope, "A") {
        Some(SymbolInfo::Class(id)) => id,
        other => panic!("A must be a class, got {:?}", other),
    };
    let b = match model.scopes.lookup(model.global_scope, "B") {
        Some(SymbolInfo::Class(id)) => id,
        other => panic!("B must be a class, got {:?}", other),
    };

    // Fresh tags continue after the predefined classes.
    assert_eq!(model.class(a).type_tag, 4);
    assert_eq!(model.class(b).type_tag, 5);

    // Inherited attribute keeps its index in the subclass.
    assert_eq!(model.class(a).attribute_index("x"), Some(0));
    assert_eq!(model.class(b).attribute_index("x"), Some(0));
    assert_eq!(model.class(b).attribute_index("y"), Some(1));

    // Overridden method keeps the ancestor's slot; the new method
    // appends.
    assert_eq!(model.class(a).method_index("__init__"), Some(0));
    assert_eq!(model.class(a).method_index("m"), Some(1));
    assert_eq!(model.class(b).method_index("m"), Some(1));
    assert_eq!(model.class(b).method_index("n"), Some(2));

    let a_m = model.class(a).methods[1].func;
    let b_m = model.class(b).methods[1].func;
    assert_ne!(a_m, b_m);
    assert_eq!(model.func(a_m).name, "A.m");
    assert_eq!(model.func(b_m).name, "B.m");

    // Attribute overrides replace the slot in place.
    assert_eq!(
        model.attr_offset(b, "x", 4),
        model.attr_offset(a, "x", 4)
    );
}

#[test]
fn test_activation_record_indexing() {
    let mut generator = Generator::new();
    generator.analyze_program(&program(json!({
        "declarations": [
            {"kind": "FuncDef", "name": "f",
             "params": [
                {"name": "a", "type": {"kind": "ClassType", "className": "int"}},
                {"name": "b", "type": {"kind": "ClassType", "className": "int"}}
             ],
             "declarations": [
                {"kind": "VarDef",
                 "var": {"name": "c", "type": {"kind": "ClassType", "className": "int"}},
                 "value": {"kind": "IntegerLiteral", "value": 0}},
                {"kind": "VarDef",
                 "var": {"name": "d", "type": {"kind": "ClassType", "className": "int"}},
                 "value": {"kind": "NoneLiteral"}}
             ],
             "statements": []}
        ]
    })));

    let model = &generator.model;
    let f = match model.scopes.lookup(model.global_scope, "f") {
        Some(SymbolInfo::Func(id)) => id,
        other => panic!("f must be a function, got {:?}", other),
    };
    assert_eq!(model.func(f).name, "f");
    assert_eq!(model.func(f).depth, 0);
    assert_eq!(model.var_index(f, "a"), 0);
    assert_eq!(model.var_index(f, "b"), 1);
    assert_eq!(model.var_index(f, "c"), 2);
    assert_eq!(model.var_index(f, "d"), 3);

    // The None-initialized local has no initial-value label.
    let d = model.func(f).locals[1];
    assert!(model.stack_var(d).initial_value.is_none());
}

#[test]
fn test_nested_function_descriptors() {
    let mut generator = Generator::new();
    generator.analyze_program(&program(json!({
        "declarations": [
            {"kind": "FuncDef", "name": "outer", "params": [],
             "declarations": [
                {"kind": "VarDef",
                 "var": {"name": "x", "type": {"kind": "ClassType", "className": "int"}},
                 "value": {"kind": "IntegerLiteral", "value": 0}},
                {"kind": "FuncDef", "name": "inner", "params": [],
                 "declarations": [{"kind": "NonLocalDecl", "name": "x"}],
                 "statements": [
                    {"kind": "AssignStmt",
                     "targets": [{"kind": "Identifier", "name": "x",
                                  "inferredType": {"kind": "ClassType", "className": "int"}}],
                     "value": {"kind": "IntegerLiteral", "value": 1,
                               "inferredType": {"kind": "ClassType", "className": "int"}}}
                 ]}
             ],
             "statements": []}
        ]
    })));

    let model = &generator.model;
    let outer = match model.scopes.lookup(model.global_scope, "outer") {
        Some(SymbolInfo::Func(id)) => id,
        other => panic!("outer must be a function, got {:?}", other),
    };
    let inner = match model.scopes.lookup(model.func(outer).scope, "inner") {
        Some(SymbolInfo::Func(id)) => id,
        other => panic!("inner must be bound in outer's table, got {:?}", other),
    };

    assert_eq!(model.func(outer).depth, 0);
    assert_eq!(model.func(inner).depth, 1);
    assert_eq!(model.func(inner).name, "outer.inner");
    assert_eq!(model.func(inner).parent, Some(outer));

    // inner's table resolves x through the parent chain to outer's
    // stack variable.
    match model.scopes.lookup(model.func(inner).scope, "x") {
        Some(SymbolInfo::StackVar(id)) => {
            assert_eq!(model.stack_var(id).owner, outer);
        }
        other => panic!("x must resolve to a stack variable, got {:?}", other),
    }
}

#[test]
fn test_global_shadowing_through_global_decl() {
    let mut generator = Generator::new();
    generator.analyze_program(&program(json!({
        "declarations": [
            {"kind": "VarDef",
             "var": {"name": "x", "type": {"kind": "ClassType", "className": "int"}},
             "value": {"kind": "IntegerLiteral", "value": 5}},
            {"kind": "FuncDef", "name": "f", "params": [],
             "declarations": [{"kind": "GlobalDecl", "name": "x"}],
             "statements": []}
        ]
    })));

    let model = &generator.model;
    let f = match model.scopes.lookup(model.global_scope, "f") {
        Some(SymbolInfo::Func(id)) => id,
        other => panic!("f must be a function, got {:?}", other),
    };
    match model.scopes.lookup_local(model.func(f).scope, "x") {
        Some(SymbolInfo::Global(id)) => assert_eq!(model.global(id).name, "x"),
        other => panic!("x must rebind to the global in f's own table, got {:?}", other),
    }
}

#[test]
fn test_output_is_deterministic() {
    let source = json!({
        "declarations": [
            {"kind": "VarDef",
             "var": {"name": "x", "type": {"kind": "ClassType", "className": "int"}},
             "value": {"kind": "IntegerLiteral", "value": 5}},
            {"kind": "VarDef",
             "var": {"name": "greeting", "type": {"kind": "ClassType", "className": "str"}},
             "value": {"kind": "StringLiteral", "value": "hi"}}
        ],
        "statements": [
            {"kind": "ExprStmt",
             "expr": {"kind": "CallExpr", "function": "print",
                      "args": [{"kind": "Identifier", "name": "x",
                                "inferredType": {"kind": "ClassType", "className": "int"}}],
                      "inferredType": {"kind": "ClassType", "className": "<None>"}}}
        ]
    });
    assert_eq!(compile(source.clone()), compile(source));
}

#[test]
fn test_empty_program_layout() {
    let out = compile(json!({}));

    // Predefined prototypes, in tag order.
    assert!(out.contains("$object$prototype:"));
    assert!(out.contains("$int$prototype:"));
    assert!(out.contains("$bool$prototype:"));
    assert!(out.contains("$str$prototype:"));
    assert!(out.contains("$.list$prototype:"));

    // Dispatch tables for all but the list pseudo-class.
    assert!(out.contains("$object$dispatchTable:"));
    assert!(out.contains("$str$dispatchTable:"));
    assert!(!out.contains("$.list$dispatchTable"));

    // The list prototype records its -1 tag.
    assert!(out.contains(".word -1"));

    // Entry point and exit.
    assert!(out.contains(".globl main"));
    assert!(out.contains("lui a0, 8192"));
    assert!(out.contains("jal heap.init"));
    assert!(out.contains("li a0, 10"));

    // Built-in routines.
    for label in ["alloc:", "alloc2:", "abort:", "heap.init:", "$print:", "$len:", "$input:", "$object.__init__:"] {
        assert!(out.contains(label), "missing {}", label);
    }

    // Boolean constants carry the bool header: tag 2, size 4.
    let false_at = out.find("const_false:").unwrap();
    let true_at = out.find("const_true:").unwrap();
    assert!(false_at < true_at);
    let false_block = &out[false_at..true_at];
    assert!(false_block.contains(".word 2"));
    assert!(false_block.contains(".word 4"));
    assert!(false_block.contains(".word $bool$dispatchTable"));
}

#[test]
fn test_prototype_header_shape() {
    let out = compile(json!({
        "declarations": [
            {"kind": "ClassDef", "name": "C", "superClass": "object",
             "declarations": [
                {"kind": "VarDef",
                 "var": {"name": "y", "type": {"kind": "ClassType", "className": "int"}},
                 "value": {"kind": "IntegerLiteral", "value": 7}}
             ]}
        ]
    }));

    // First user class: tag 4, size 3 + 1 attribute.
    let proto_at = out.find("$C$prototype:").unwrap();
    let table_at = out.find("$C$dispatchTable:").unwrap();
    let block = &out[proto_at..table_at];
    let words: Vec<&str> = block.lines().filter(|l| l.contains(".word")).collect();
    assert!(words[0].contains(".word 4"));
    assert!(words[1].contains(".word 4"));
    assert!(words[2].contains(".word $C$dispatchTable"));
    // The attribute initializer points at the interned 7.
    assert!(words[3].contains(".word const_"));

    // C's only method slot is the inherited object.__init__.
    let table_block = &out[table_at..];
    let first_word = table_block
        .lines()
        .find(|l| l.contains(".word"))
        .unwrap();
    assert!(first_word.contains(".word $object.__init__"));

    // The interned 7 is an int object: tag 1, size 4, payload 7.
    assert!(out.contains(".word 7"));
}

#[test]
fn test_global_cell_references_interned_constant() {
    let out = compile(json!({
        "declarations": [
            {"kind": "VarDef",
             "var": {"name": "x", "type": {"kind": "ClassType", "className": "int"}},
             "value": {"kind": "IntegerLiteral", "value": 5}}
        ]
    }));

    let cell_at = out.find("$x:").unwrap();
    let cell_line = out[cell_at..].lines().nth(1).unwrap();
    assert!(cell_line.contains(".word const_"), "got {}", cell_line);

    // The same interned label appears in the pool with payload 5.
    let label = cell_line
        .split_whitespace()
        .nth(1)
        .unwrap()
        .trim_end_matches(',');
    let pool_at = out.rfind(&format!("{}:", label)).unwrap();
    let pool_block = &out[pool_at..];
    assert!(pool_block.contains(".word 5"));
    assert!(pool_block.contains("Type tag for class: int"));
}
