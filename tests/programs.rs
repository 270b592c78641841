//! End-to-end checks on complete programs: a class hierarchy with
//! overridden methods, nested functions with captures, and the shape of
//! the generated image.

use serde_json::json;

use coral::ast::Program;

fn int_ty() -> serde_json::Value {
    json!({"kind": "ClassType", "className": "int"})
}

fn ident(name: &str, ty: serde_json::Value) -> serde_json::Value {
    json!({"kind": "Identifier", "name": name, "inferredType": ty})
}

/// A program exercising most of the surface: two classes (one
/// overriding a method), a global, a nested function with `nonlocal`,
/// arithmetic, and dynamic dispatch at the top level.
fn full_program() -> serde_json::Value {
    json!({
        "declarations": [
            {"kind": "VarDef",
             "var": {"name": "counter", "type": int_ty()},
             "value": {"kind": "IntegerLiteral", "value": 0}},
            {"kind": "ClassDef", "name": "Animal", "superClass": "object",
             "declarations": [
                {"kind": "VarDef",
                 "var": {"name": "legs", "type": int_ty()},
                 "value": {"kind": "IntegerLiteral", "value": 4}},
                {"kind": "FuncDef", "name": "speak",
                 "params": [{"name": "self", "type": {"kind": "ClassType", "className": "Animal"}}],
                 "returnType": {"kind": "ClassType", "className": "str"},
                 "declarations": [],
                 "statements": [
                    {"kind": "ReturnStmt",
                     "value": {"kind": "StringLiteral", "value": "...",
                               "inferredType": {"kind": "ClassType", "className": "str"}}}
                 ]}
             ]},
            {"kind": "ClassDef", "name": "Dog", "superClass": "Animal",
             "declarations": [
                {"kind": "FuncDef", "name": "speak",
                 "params": [{"name": "self", "type": {"kind": "ClassType", "className": "Dog"}}],
                 "returnType": {"kind": "ClassType", "className": "str"},
                 "declarations": [],
                 "statements": [
                    {"kind": "ReturnStmt",
                     "value": {"kind": "StringLiteral", "value": "woof",
                               "inferredType": {"kind": "ClassType", "className": "str"}}}
                 ]}
             ]},
            {"kind": "FuncDef", "name": "tally", "params": [],
             "declarations": [
                {"kind": "VarDef",
                 "var": {"name": "step", "type": int_ty()},
                 "value": {"kind": "IntegerLiteral", "value": 1}},
                {"kind": "FuncDef", "name": "bump", "params": [],
                 "declarations": [
                    {"kind": "GlobalDecl", "name": "counter"},
                    {"kind": "NonLocalDecl", "name": "step"}
                 ],
                 "statements": [
                    {"kind": "AssignStmt",
                     "targets": [ident("counter", int_ty())],
                     "value": {"kind": "BinaryExpr", "operator": "+",
                               "left": ident("counter", int_ty()),
                               "right": ident("step", int_ty()),
                               "inferredType": int_ty()}}
                 ]}
             ],
             "statements": [
                {"kind": "ExprStmt",
                 "expr": {"kind": "CallExpr", "function": "bump", "args": [],
                          "inferredType": {"kind": "ClassType", "className": "<None>"}}}
             ]},
        ],
        "statements": [
            {"kind": "ExprStmt",
             "expr": {"kind": "CallExpr", "function": "tally", "args": [],
                      "inferredType": {"kind": "ClassType", "className": "<None>"}}},
            {"kind": "ExprStmt",
             "expr": {"kind": "CallExpr", "function": "print",
                      "args": [
                        {"kind": "MethodCallExpr",
                         "object": {"kind": "CallExpr", "function": "Dog", "args": [],
                                    "inferredType": {"kind": "ClassType", "className": "Dog"}},
                         "method": "speak", "args": [],
                         "inferredType": {"kind": "ClassType", "className": "str"}}
                      ],
                      "inferredType": {"kind": "ClassType", "className": "<None>"}}}
        ]
    })
}

#[test]
fn test_full_program_shape() {
    let program: Program = serde_json::from_value(full_program()).unwrap();
    let out = coral::compile(&program);

    // Data section: prototypes for both user classes, with Dog
    // inheriting Animal's attribute layout and overriding its slot.
    assert!(out.contains("$Animal$prototype:"));
    assert!(out.contains("$Dog$prototype:"));
    let animal_table = out.find("$Animal$dispatchTable:").unwrap();
    let dog_table = out.find("$Dog$dispatchTable:").unwrap();
    let animal_block = &out[animal_table..dog_table];
    assert!(animal_block.contains(".word $object.__init__"));
    assert!(animal_block.contains(".word $Animal.speak"));
    let dog_block = &out[dog_table..out.find("$counter:").unwrap()];
    assert!(dog_block.contains(".word $object.__init__"));
    assert!(dog_block.contains(".word $Dog.speak"));
    assert!(!dog_block.contains("$Animal.speak"));

    // Code for every function, including the nested one.
    for label in ["$tally:", "$tally.bump:", "$Animal.speak:", "$Dog.speak:"] {
        assert!(out.contains(label), "missing {}", label);
    }

    // The nested call passes a static link and the capture writes back
    // through it.
    assert!(out.contains("# Static link: current frame"));
    assert!(out.contains("# Load static link"));
    assert!(out.contains("sw a0, $counter, t0"));

    // The method call goes through the dispatch table.
    assert!(out.contains("jalr t1"));

    // Runtime scaffolding is present exactly once each.
    for label in ["alloc:", "alloc2:", "abort:", "heap.init:", "makeint:", "conslist:"] {
        assert_eq!(out.matches(label).count(), 1, "label {}", label);
    }
}

#[test]
fn test_generation_is_reproducible() {
    let program: Program = serde_json::from_value(full_program()).unwrap();
    let first = coral::compile(&program);
    let second = coral::compile(&program);
    assert_eq!(first, second);
}

#[test]
fn test_compile_json_accepts_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("program.ast.json");
    std::fs::write(&path, full_program().to_string()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let assembly = coral::compile_json(&text).unwrap();
    assert!(assembly.contains(".globl main"));

    let out_path = dir.path().join("program.s");
    std::fs::write(&out_path, &assembly).unwrap();
    assert_eq!(std::fs::read_to_string(&out_path).unwrap(), assembly);
}

#[test]
fn test_compile_json_rejects_errors() {
    let bad = json!({
        "declarations": [],
        "statements": [],
        "errors": [
            {"severity": "Error", "message": "unknown identifier: q",
             "span": {"start": 4, "end": 5}}
        ]
    });
    let err = coral::compile_json(&bad.to_string()).unwrap_err();
    assert_eq!(err.len(), 1);
    assert!(err[0].message.contains("unknown identifier"));
}

#[test]
fn test_compile_json_rejects_malformed_input() {
    let err = coral::compile_json("{ not json").unwrap_err();
    assert!(err[0].message.contains("malformed program AST"));
}
