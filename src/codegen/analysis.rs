//! Analysis of the type-checked AST into descriptors.
//!
//! A single walk over the program's declarations populates the model
//! and its symbol tables. The walk asserts the checker's guarantees
//! (superclasses exist, `global`/`nonlocal` targets resolve) rather
//! than re-validating them; a failed assertion here is a compiler bug.

use crate::ast::{ClassDef, Declaration, FuncDef, Program};

use super::info::{AttrInfo, ClassId, FuncBody, FuncId, SymbolInfo};
use super::symtab::ScopeId;
use super::Generator;

impl Generator {
    /// Create descriptors for all symbols and populate the global
    /// symbol table.
    pub(super) fn analyze_program(&mut self, program: &Program) {
        // Globals first, so that `global x` declarations inside
        // function bodies resolve during the second pass.
        for decl in &program.declarations {
            if let Declaration::VarDef(var_def) = decl {
                let initial = self.pool.from_literal(&var_def.value);
                let id = self.model.new_global(&var_def.var.name, initial);
                self.model
                    .bind_global(&var_def.var.name, SymbolInfo::Global(id));
            }
        }

        for decl in &program.declarations {
            match decl {
                Declaration::ClassDef(class_def) => {
                    let id = self.analyze_class(class_def);
                    let name = self.model.class(id).name.clone();
                    self.model.bind_global(&name, SymbolInfo::Class(id));
                }
                Declaration::FuncDef(func_def) => {
                    let id = self.analyze_function(
                        None,
                        func_def,
                        0,
                        self.model.global_scope,
                        None,
                    );
                    let name = self.model.func(id).base_name().to_string();
                    self.model.bind_global(&name, SymbolInfo::Func(id));
                }
                _ => {}
            }
        }
    }

    /// Create a class descriptor: attributes in declaration order,
    /// methods analyzed as depth-0 functions qualified by the class
    /// name.
    fn analyze_class(&mut self, class_def: &ClassDef) -> ClassId {
        let super_info = self
            .model
            .scopes
            .lookup(self.model.global_scope, &class_def.super_class);
        let super_class = match super_info {
            Some(SymbolInfo::Class(id)) => id,
            other => panic!(
                "superclass {} of {} must be a class, got {:?}",
                class_def.super_class, class_def.name, other
            ),
        };
        let class = self.model.new_class(&class_def.name, Some(super_class));

        for decl in &class_def.declarations {
            match decl {
                Declaration::VarDef(attr_def) => {
                    let initial = self.pool.from_literal(&attr_def.value);
                    self.model.classes[class.0].add_attribute(AttrInfo {
                        name: attr_def.var.name.clone(),
                        initial_value: initial,
                    });
                }
                Declaration::FuncDef(method_def) => {
                    let method = self.analyze_function(
                        Some(&class_def.name),
                        method_def,
                        0,
                        self.model.global_scope,
                        None,
                    );
                    let base = self.model.func(method).base_name().to_string();
                    self.model.classes[class.0].add_method(&base, method);
                }
                _ => {}
            }
        }

        class
    }

    /// Create a function descriptor and recursively analyze its nested
    /// functions.
    ///
    /// Parameters and local variables are processed before nested
    /// definitions so that `nonlocal x` in a nested function resolves
    /// through this function's table.
    fn analyze_function(
        &mut self,
        container: Option<&str>,
        func_def: &FuncDef,
        depth: u32,
        parent_scope: ScopeId,
        parent: Option<FuncId>,
    ) -> FuncId {
        let qualified = match container {
            Some(outer) => format!("{}.{}", outer, func_def.name),
            None => func_def.name.clone(),
        };
        let func = self
            .model
            .new_func(&qualified, depth, parent_scope, parent, FuncBody::User);
        let scope = self.model.func(func).scope;

        for param in &func_def.params {
            self.model.add_param(func, &param.name);
        }

        for decl in &func_def.declarations {
            match decl {
                Declaration::VarDef(var_def) => {
                    let initial = self.pool.from_literal(&var_def.value);
                    self.model.add_local(func, &var_def.var.name, initial);
                }
                Declaration::GlobalDecl(global_decl) => {
                    // Rebind the global in the function's own table,
                    // shadowing any same-named binding further out.
                    let info = self
                        .model
                        .scopes
                        .lookup(self.model.global_scope, &global_decl.name);
                    match info {
                        Some(SymbolInfo::Global(id)) => {
                            self.model
                                .scopes
                                .bind(scope, &global_decl.name, SymbolInfo::Global(id));
                        }
                        other => panic!(
                            "global declaration {} in {} must name a global variable, got {:?}",
                            global_decl.name, qualified, other
                        ),
                    }
                }
                Declaration::NonLocalDecl(nonlocal_decl) => {
                    // No new binding: the outer variable is reached
                    // through the parent chain. Just assert it exists.
                    let info = self.model.scopes.lookup(scope, &nonlocal_decl.name);
                    assert!(
                        matches!(info, Some(SymbolInfo::StackVar(_))),
                        "nonlocal declaration {} in {} must name an enclosing local, got {:?}",
                        nonlocal_decl.name,
                        qualified,
                        info
                    );
                }
                _ => {}
            }
        }

        // The table is complete; nested definitions can now resolve
        // params, locals, and each other.
        for decl in &func_def.declarations {
            if let Declaration::FuncDef(nested_def) = decl {
                let nested = self.analyze_function(
                    Some(&qualified),
                    nested_def,
                    depth + 1,
                    scope,
                    Some(func),
                );
                let base = self.model.func(nested).base_name().to_string();
                self.model.scopes.bind(scope, &base, SymbolInfo::Func(nested));
            }
        }

        self.model.functions[func.0].statements = func_def.statements.clone();

        func
    }
}
