//! Descriptors for classes, functions, variables, and attributes.
//!
//! Descriptors are created and mutated during analysis, and are
//! read-only during emission. Back-references (superclass, enclosing
//! function, scope parents) are arena indices; ownership lives in the
//! [`Model`]'s flat lists.

use crate::ast::Stmt;
use crate::types::ValueType;

use super::constants::ConstantPool;
use super::label::Label;
use super::symtab::{ScopeArena, ScopeId};
use super::OBJECT_HEADER_WORDS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FuncId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalId(pub usize);

/// Index of a stack variable (parameter or local) in the model's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarId(pub usize);

/// What a name in a symbol table refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolInfo {
    Class(ClassId),
    Func(FuncId),
    Global(GlobalId),
    StackVar(VarId),
}

/// A class: its tag, layout, and dispatch table.
#[derive(Debug)]
pub struct ClassInfo {
    pub name: String,
    /// Unique non-negative tag, except the internal list pseudo-class
    /// whose tag is -1.
    pub type_tag: i32,
    /// `None` only for `object`.
    pub super_class: Option<ClassId>,
    /// Starts as a copy of the superclass's attributes; same-name
    /// additions override in place, keeping inherited indices stable.
    pub attributes: Vec<AttrInfo>,
    /// Starts as a copy of the superclass's methods; same-name
    /// additions override in place, keeping inherited slots stable.
    pub methods: Vec<Method>,
    pub prototype_label: Label,
    /// `None` suppresses dispatch-table emission (the list pseudo-class).
    pub dispatch_table_label: Option<Label>,
}

/// One dispatch-table slot: the method's defined name and its descriptor.
#[derive(Clone, Debug)]
pub struct Method {
    pub name: String,
    pub func: FuncId,
}

impl ClassInfo {
    /// Append ATTR, or override the same-named inherited slot in place.
    pub fn add_attribute(&mut self, attr: AttrInfo) {
        match self.attributes.iter_mut().find(|a| a.name == attr.name) {
            Some(slot) => *slot = attr,
            None => self.attributes.push(attr),
        }
    }

    /// Append a method slot, or override the same-named inherited slot.
    pub fn add_method(&mut self, name: &str, func: FuncId) {
        match self.methods.iter_mut().find(|m| m.name == name) {
            Some(slot) => slot.func = func,
            None => self.methods.push(Method {
                name: name.to_string(),
                func,
            }),
        }
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn method_index(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name == name)
    }
}

/// How a function's body is emitted: by the back-end strategy for user
/// code, or by one of the fixed built-in emitters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuncBody {
    User,
    ObjectInit,
    Print,
    Len,
    Input,
}

/// A function or method descriptor.
#[derive(Debug)]
pub struct FuncInfo {
    /// Fully-qualified dotted name: `f`, `C.m`, `outer.inner`.
    pub name: String,
    /// 0 for global functions and methods; D+1 when nested in a
    /// function of depth D.
    pub depth: u32,
    /// Parameter names, in source order.
    pub params: Vec<String>,
    /// Local variable descriptors, in source order.
    pub locals: Vec<VarId>,
    /// The body statements, attached after the symbol table is built.
    pub statements: Vec<Stmt>,
    /// The function's own symbol table, chained to the enclosing scope.
    pub scope: ScopeId,
    pub code_label: Label,
    /// The enclosing function; set only for nested functions.
    pub parent: Option<FuncId>,
    pub body: FuncBody,
}

impl FuncInfo {
    /// The last component of the dotted fully-qualified name.
    pub fn base_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot) => &self.name[dot + 1..],
            None => &self.name,
        }
    }
}

/// A local variable or parameter, allocated in an activation record.
#[derive(Debug)]
pub struct StackVarInfo {
    pub name: String,
    /// Label of the constant holding the initial value, or `None` for a
    /// `None` initializer (parameters also carry `None`).
    pub initial_value: Option<Label>,
    /// The function whose activation record holds this variable.
    pub owner: FuncId,
}

/// A global variable, stored in a labelled static cell.
#[derive(Debug)]
pub struct GlobalVarInfo {
    pub name: String,
    pub initial_value: Option<Label>,
    /// The cell's label, `$<name>`.
    pub label: Label,
}

/// An instance attribute and its default initializer.
#[derive(Clone, Debug)]
pub struct AttrInfo {
    pub name: String,
    pub initial_value: Option<Label>,
}

/// The descriptor graph for one program: every class, function, global
/// and stack variable, plus the scope arena binding names to them.
///
/// Construction installs the predefined classes (`object`, `int`,
/// `bool`, `str`, and the internal list pseudo-class) and the
/// predefined functions (`print`, `len`, `input`, `object.__init__`);
/// the analyzer then adds the user program's descriptors.
#[derive(Debug)]
pub struct Model {
    pub classes: Vec<ClassInfo>,
    pub functions: Vec<FuncInfo>,
    pub globals: Vec<GlobalVarInfo>,
    pub stack_vars: Vec<StackVarInfo>,
    pub scopes: ScopeArena,
    pub global_scope: ScopeId,

    pub object_class: ClassId,
    pub int_class: ClassId,
    pub bool_class: ClassId,
    pub str_class: ClassId,
    /// The internal pseudo-class backing list objects. Not bound in the
    /// global scope and emitted without a dispatch table.
    pub list_class: ClassId,

    next_type_tag: i32,
}

impl Model {
    pub fn new(pool: &mut ConstantPool) -> Self {
        let mut scopes = ScopeArena::new();
        let global_scope = scopes.new_scope(None);

        let mut model = Model {
            classes: Vec::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            stack_vars: Vec::new(),
            scopes,
            global_scope,
            object_class: ClassId(0),
            int_class: ClassId(0),
            bool_class: ClassId(0),
            str_class: ClassId(0),
            list_class: ClassId(0),
            next_type_tag: 0,
        };

        let object_init =
            model.new_func("object.__init__", 0, global_scope, None, FuncBody::ObjectInit);
        model.add_param(object_init, "self");

        model.object_class = model.new_class("object", None);
        model.classes[model.object_class.0].add_method("__init__", object_init);
        model.bind_global("object", SymbolInfo::Class(model.object_class));

        model.int_class = model.new_class("int", Some(model.object_class));
        model.classes[model.int_class.0].add_attribute(AttrInfo {
            name: "__int__".to_string(),
            initial_value: None,
        });
        model.bind_global("int", SymbolInfo::Class(model.int_class));

        model.bool_class = model.new_class("bool", Some(model.object_class));
        model.classes[model.bool_class.0].add_attribute(AttrInfo {
            name: "__bool__".to_string(),
            initial_value: None,
        });
        model.bind_global("bool", SymbolInfo::Class(model.bool_class));

        model.str_class = model.new_class("str", Some(model.object_class));
        model.classes[model.str_class.0].add_attribute(AttrInfo {
            name: "__len__".to_string(),
            initial_value: Some(pool.int_constant(0)),
        });
        model.classes[model.str_class.0].add_attribute(AttrInfo {
            name: "__str__".to_string(),
            initial_value: None,
        });
        model.bind_global("str", SymbolInfo::Class(model.str_class));

        model.list_class = model.new_class_with_tag(".list", -1, Some(model.object_class));
        model.classes[model.list_class.0].add_attribute(AttrInfo {
            name: "__len__".to_string(),
            initial_value: Some(pool.int_constant(0)),
        });
        model.classes[model.list_class.0].dispatch_table_label = None;

        let print = model.new_func("print", 0, global_scope, None, FuncBody::Print);
        model.add_param(print, "arg");
        model.bind_global("print", SymbolInfo::Func(print));

        let len = model.new_func("len", 0, global_scope, None, FuncBody::Len);
        model.add_param(len, "arg");
        model.bind_global("len", SymbolInfo::Func(len));

        let input = model.new_func("input", 0, global_scope, None, FuncBody::Input);
        model.bind_global("input", SymbolInfo::Func(input));

        model
    }

    // ── Construction ──────────────────────────────────────────────

    /// A class with a fresh tag, inheriting the superclass's attribute
    /// and method layout.
    pub fn new_class(&mut self, name: &str, super_class: Option<ClassId>) -> ClassId {
        let tag = self.fresh_type_tag();
        self.new_class_with_tag(name, tag, super_class)
    }

    fn new_class_with_tag(
        &mut self,
        name: &str,
        type_tag: i32,
        super_class: Option<ClassId>,
    ) -> ClassId {
        let (attributes, methods) = match super_class {
            Some(id) => {
                let sup = &self.classes[id.0];
                (sup.attributes.clone(), sup.methods.clone())
            }
            None => (Vec::new(), Vec::new()),
        };
        let id = ClassId(self.classes.len());
        self.classes.push(ClassInfo {
            name: name.to_string(),
            type_tag,
            super_class,
            attributes,
            methods,
            prototype_label: Label::user(&format!("{}$prototype", name)),
            dispatch_table_label: Some(Label::user(&format!("{}$dispatchTable", name))),
        });
        id
    }

    /// A function descriptor with a fresh scope chained to PARENT_SCOPE.
    pub fn new_func(
        &mut self,
        name: &str,
        depth: u32,
        parent_scope: ScopeId,
        parent: Option<FuncId>,
        body: FuncBody,
    ) -> FuncId {
        let scope = self.scopes.new_scope(Some(parent_scope));
        let id = FuncId(self.functions.len());
        self.functions.push(FuncInfo {
            name: name.to_string(),
            depth,
            params: Vec::new(),
            locals: Vec::new(),
            statements: Vec::new(),
            scope,
            code_label: Label::user(name),
            parent,
            body,
        });
        id
    }

    /// Add a parameter to FUNC and bind it in the function's scope.
    pub fn add_param(&mut self, func: FuncId, name: &str) -> VarId {
        let var = self.new_stack_var(name, None, func);
        self.functions[func.0].params.push(name.to_string());
        let scope = self.functions[func.0].scope;
        self.scopes.bind(scope, name, SymbolInfo::StackVar(var));
        var
    }

    /// Add a local variable to FUNC and bind it in the function's scope.
    pub fn add_local(&mut self, func: FuncId, name: &str, initial_value: Option<Label>) -> VarId {
        let var = self.new_stack_var(name, initial_value, func);
        self.functions[func.0].locals.push(var);
        let scope = self.functions[func.0].scope;
        self.scopes.bind(scope, name, SymbolInfo::StackVar(var));
        var
    }

    fn new_stack_var(&mut self, name: &str, initial_value: Option<Label>, owner: FuncId) -> VarId {
        let id = VarId(self.stack_vars.len());
        self.stack_vars.push(StackVarInfo {
            name: name.to_string(),
            initial_value,
            owner,
        });
        id
    }

    pub fn new_global(&mut self, name: &str, initial_value: Option<Label>) -> GlobalId {
        let id = GlobalId(self.globals.len());
        self.globals.push(GlobalVarInfo {
            name: name.to_string(),
            initial_value,
            label: Label::user(name),
        });
        id
    }

    pub fn bind_global(&mut self, name: &str, info: SymbolInfo) {
        self.scopes.bind(self.global_scope, name, info);
    }

    fn fresh_type_tag(&mut self) -> i32 {
        let tag = self.next_type_tag;
        self.next_type_tag += 1;
        tag
    }

    // ── Access ────────────────────────────────────────────────────

    pub fn class(&self, id: ClassId) -> &ClassInfo {
        &self.classes[id.0]
    }

    pub fn func(&self, id: FuncId) -> &FuncInfo {
        &self.functions[id.0]
    }

    pub fn global(&self, id: GlobalId) -> &GlobalVarInfo {
        &self.globals[id.0]
    }

    pub fn stack_var(&self, id: VarId) -> &StackVarInfo {
        &self.stack_vars[id.0]
    }

    /// The class a checker type lowers to: lists map to the internal
    /// list pseudo-class, class types resolve through the global scope.
    pub fn class_for_type(&self, ty: &ValueType) -> Option<ClassId> {
        match ty {
            ValueType::ListType { .. } => Some(self.list_class),
            ValueType::ClassType { class_name } => {
                match self.scopes.lookup(self.global_scope, class_name) {
                    Some(SymbolInfo::Class(id)) => Some(id),
                    _ => None,
                }
            }
        }
    }

    /// Flat activation-record index of NAME in FUNC: the i-th parameter
    /// has index i, the j-th local has index `params + j`.
    pub fn var_index(&self, func: FuncId, name: &str) -> usize {
        let f = &self.functions[func.0];
        if let Some(i) = f.params.iter().position(|p| p == name) {
            return i;
        }
        f.locals
            .iter()
            .position(|&v| self.stack_vars[v.0].name == name)
            .map(|j| f.params.len() + j)
            .unwrap_or_else(|| {
                panic!("{} is not a variable of function {}", name, f.name)
            })
    }

    /// Byte offset of an attribute from the start of an object.
    pub fn attr_offset(&self, class: ClassId, name: &str, word_size: i32) -> i32 {
        let index = self.classes[class.0]
            .attribute_index(name)
            .expect("checker validates attribute accesses");
        word_size * (OBJECT_HEADER_WORDS + index as i32)
    }

    /// Byte offset of a method's slot from the start of a dispatch table.
    pub fn method_offset(&self, class: ClassId, name: &str, word_size: i32) -> i32 {
        let index = self.classes[class.0]
            .method_index(name)
            .expect("checker validates method calls");
        word_size * index as i32
    }
}
