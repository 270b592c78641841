//! Code generation: descriptor analysis, layout emission, and RV32
//! assembly output.
//!
//! [`Generator`] drives the whole pass: it analyzes the type-checked
//! AST into a [`Model`] of descriptors, then emits the data section
//! (prototypes, dispatch tables, global cells), the program entry
//! routine, every function body, the built-in runtime routines, and
//! finally the constant pool. Emission of user code is delegated to an
//! [`EmitStrategy`], keeping the object/layout core independent of any
//! particular lowering of statements and expressions.

pub mod asm;
pub mod constants;
pub mod emitter;
pub mod info;
pub mod label;
pub mod symtab;

mod analysis;
mod builtins;
mod layout;

#[cfg(test)]
mod tests;

use crate::ast::{Program, Stmt};

use asm::{Reg, RiscvBackend};
use constants::ConstantPool;
use info::{ClassId, FuncBody, FuncId, Model};
use label::{Label, LabelFactory};

/// Object header size in words: type tag, object size, dispatch table.
pub const OBJECT_HEADER_WORDS: i32 = 3;

/// Heap size requested from the simulator at startup.
pub const HEAP_SIZE_BYTES: i32 = 32 * 1024 * 1024;

/// Runtime error codes. Emitted code exits with these via `abort`.
pub const ERROR_ARG: i32 = 1;
pub const ERROR_DIV_ZERO: i32 = 2;
pub const ERROR_OOB: i32 = 3;
pub const ERROR_NONE: i32 = 4;
pub const ERROR_OOM: i32 = 5;
pub const ERROR_NYI: i32 = 6;

/// Labels of the built-in runtime routines, fixed at construction.
pub struct RuntimeLabels {
    /// Allocates an object from a prototype, sized by the prototype.
    pub alloc: Label,
    /// Allocates from a prototype with an explicit size in words.
    pub alloc2: Label,
    /// Prints a message and exits with a code; never returns.
    pub abort: Label,
    /// Requests the heap from the simulator.
    pub heap_init: Label,
}

impl RuntimeLabels {
    fn new() -> Self {
        Self {
            alloc: Label::named("alloc"),
            alloc2: Label::named("alloc2"),
            abort: Label::named("abort"),
            heap_init: Label::named("heap.init"),
        }
    }
}

/// Everything a strategy needs while emitting code: the (frozen)
/// descriptor graph, the assembly sink, the label factory, the growing
/// constant pool, and the runtime routine labels.
pub struct EmitContext<'a> {
    pub model: &'a Model,
    pub asm: &'a mut RiscvBackend,
    pub labels: &'a mut LabelFactory,
    pub pool: &'a mut ConstantPool,
    pub runtime: &'a RuntimeLabels,
}

impl EmitContext<'_> {
    pub fn fresh_label(&mut self) -> Label {
        self.labels.fresh()
    }

    pub fn word_size(&self) -> i32 {
        self.asm.word_size()
    }

    /// Byte offset of the type tag within an object.
    pub fn type_tag_offset(&self) -> i32 {
        0
    }

    /// Byte offset of the size word within an object.
    pub fn object_size_offset(&self) -> i32 {
        self.asm.word_size()
    }

    /// Byte offset of the dispatch-table pointer within an object.
    pub fn dispatch_table_offset(&self) -> i32 {
        2 * self.asm.word_size()
    }

    pub fn attr_offset(&self, class: ClassId, name: &str) -> i32 {
        self.model.attr_offset(class, name, self.asm.word_size())
    }

    pub fn method_offset(&self, class: ClassId, name: &str) -> i32 {
        self.model.method_offset(class, name, self.asm.word_size())
    }
}

/// The back-end hook: supplies emission of top-level statements, user
/// function bodies, and any supporting routines of its own.
pub trait EmitStrategy {
    /// Emit the program's top-level statements (called inside `main`,
    /// after heap setup and before the exit ecall).
    fn emit_top_level(&mut self, statements: &[Stmt], ctx: &mut EmitContext<'_>);

    /// Emit the body of one user-defined function, under its code
    /// label, honoring the calling convention.
    fn emit_user_function(&mut self, func: FuncId, ctx: &mut EmitContext<'_>);

    /// Emit supporting routines after the built-ins.
    fn emit_custom_code(&mut self, ctx: &mut EmitContext<'_>);
}

/// The code generator. One instance per compilation; owns the type-tag
/// and label counters, the constant pool, and the descriptor graph.
pub struct Generator {
    pub(crate) model: Model,
    pub(crate) pool: ConstantPool,
    pub(crate) labels: LabelFactory,
    pub(crate) runtime: RuntimeLabels,
    pub(crate) asm: RiscvBackend,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Self::with_backend(RiscvBackend::new())
    }

    pub fn with_backend(asm: RiscvBackend) -> Self {
        let mut pool = ConstantPool::new();
        let model = Model::new(&mut pool);
        Self {
            model,
            pool,
            labels: LabelFactory::new(),
            runtime: RuntimeLabels::new(),
            asm,
        }
    }

    /// Generate assembly for PROGRAM, delegating user code to STRATEGY.
    ///
    /// The program must be well-typed; front-end errors are the
    /// driver's responsibility and structural invariants are asserted,
    /// not re-checked.
    pub fn generate(mut self, program: &Program, strategy: &mut dyn EmitStrategy) -> String {
        self.analyze_program(program);

        self.asm.start_data();

        for i in 0..self.model.classes.len() {
            self.emit_prototype(ClassId(i));
        }
        for i in 0..self.model.classes.len() {
            self.emit_dispatch_table(ClassId(i));
        }
        self.emit_global_cells();

        self.asm.start_code();

        let main = Label::named("main");
        self.asm.global_label(&main);
        self.asm.lui(
            Reg::A0,
            HEAP_SIZE_BYTES >> 12,
            "Initialize heap size (in multiples of 4KB)",
        );
        self.asm.add(Reg::S11, Reg::S11, Reg::A0, "Save heap size");
        self.asm
            .jal(&self.runtime.heap_init, "Call heap.init routine");
        self.asm.mv(Reg::Gp, Reg::A0, "Initialize heap pointer");
        self.asm.mv(Reg::S10, Reg::Gp, "Set beginning of heap");
        self.asm.add(
            Reg::S11,
            Reg::S10,
            Reg::S11,
            "Set end of heap (= start of heap + heap size)",
        );
        let word_size = self.asm.word_size();
        self.asm.addi(
            Reg::Fp,
            Reg::Sp,
            word_size,
            "New fp is just below stack top",
        );

        strategy.emit_top_level(&program.statements, &mut self.ctx());

        self.asm.li(Reg::A0, 10, "Code for ecall: exit");
        self.asm.ecall("");

        let bodies: Vec<(FuncId, FuncBody)> = self
            .model
            .functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FuncId(i), f.body))
            .collect();
        for (id, body) in bodies {
            match body {
                FuncBody::User => strategy.emit_user_function(id, &mut self.ctx()),
                FuncBody::ObjectInit => self.emit_object_init(id),
                FuncBody::Print => self.emit_print(id),
                FuncBody::Len => self.emit_len(id),
                FuncBody::Input => self.emit_input(id),
            }
        }

        self.emit_builtin_alloc();
        self.emit_builtin_alloc_resize();
        self.emit_builtin_abort();
        self.emit_builtin_heap_init();

        strategy.emit_custom_code(&mut self.ctx());

        self.asm.start_data();
        self.emit_constant_pool();

        self.asm.finish()
    }

    pub(crate) fn ctx(&mut self) -> EmitContext<'_> {
        EmitContext {
            model: &self.model,
            asm: &mut self.asm,
            labels: &mut self.labels,
            pool: &mut self.pool,
            runtime: &self.runtime,
        }
    }

    pub(crate) fn attr_offset(&self, class: ClassId, name: &str) -> i32 {
        self.model.attr_offset(class, name, self.asm.word_size())
    }
}
