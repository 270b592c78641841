//! The stock RV32 emission strategy.
//!
//! Values are uniformly boxed: every expression yields a pointer (in
//! `A0`) to a header-carrying object, or zero for `None`. Integer
//! results are materialized through the `makeint` runtime helper;
//! booleans are always one of the two interned constants.
//!
//! Activation records follow the shared calling convention: the caller
//! reserves `params + 1` words and stores argument `i` at
//! `[SP + (params - i) * wordSize]`; the word at `[SP]` becomes the
//! callee's first local slot. The callee saves RA and the caller's FP
//! below its locals and sets `FP = SP_entry + wordSize`, so the
//! variable with flat index `k` lives at `FP + (params - 1 - k) *
//! wordSize`. Nested functions receive a static link pushed before the
//! first argument.

mod expr;
mod runtime;
mod stmt;


use crate::ast::Stmt;

use super::asm::Reg::{self, *};
use super::info::{FuncId, Model, SymbolInfo};
use super::label::Label;
use super::symtab::ScopeId;
use super::{EmitContext, EmitStrategy};

/// Walks the typed AST and lowers statements and expressions to RV32.
pub struct RiscvEmitter {
    /// The function being emitted; `None` during top-level code.
    current: Option<FuncId>,
    /// Jump target for `return` in the current function.
    epilogue: Option<Label>,

    // Supporting routines emitted by `emit_custom_code`.
    makeint: Label,
    makebool: Label,
    streql: Label,
    strcat: Label,
    strsel: Label,
    conslist: Label,
    listcat: Label,
    error_div: Label,
    error_oob: Label,
    error_none: Label,
}

impl Default for RiscvEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl RiscvEmitter {
    pub fn new() -> Self {
        Self {
            current: None,
            epilogue: None,
            makeint: Label::named("makeint"),
            makebool: Label::named("makebool"),
            streql: Label::named("streql"),
            strcat: Label::named("strcat"),
            strsel: Label::named("strsel"),
            conslist: Label::named("conslist"),
            listcat: Label::named("listcat"),
            error_div: Label::named("error.div"),
            error_oob: Label::named("error.oob"),
            error_none: Label::named("error.none"),
        }
    }

    /// The scope in which identifiers of the code being emitted resolve.
    fn current_scope(&self, model: &Model) -> ScopeId {
        match self.current {
            Some(func) => model.func(func).scope,
            None => model.global_scope,
        }
    }

    // ── Stack helpers ─────────────────────────────────────────────

    fn push_reg(&mut self, ctx: &mut EmitContext<'_>, reg: Reg, comment: &str) {
        let w = ctx.word_size();
        ctx.asm.addi(Sp, Sp, -w, "");
        ctx.asm.sw(reg, Sp, 0, comment);
    }

    fn pop_reg(&mut self, ctx: &mut EmitContext<'_>, reg: Reg, comment: &str) {
        let w = ctx.word_size();
        ctx.asm.lw(reg, Sp, 0, comment);
        ctx.asm.addi(Sp, Sp, w, "");
    }

    // ── Variable addressing ───────────────────────────────────────

    /// FP-relative byte offset of the variable with flat index INDEX in
    /// FUNC's activation record.
    fn slot_offset(&self, model: &Model, func: FuncId, index: usize, w: i32) -> i32 {
        (model.func(func).params.len() as i32 - 1 - index as i32) * w
    }

    /// Byte offset of FUNC's static-link slot from its frame pointer.
    fn static_link_offset(&self, model: &Model, func: FuncId, w: i32) -> i32 {
        model.func(func).params.len() as i32 * w
    }

    /// Emit a static-link walk leaving OWNER's frame pointer in T0.
    fn emit_frame_walk(&mut self, ctx: &mut EmitContext<'_>, owner: FuncId) {
        let model = ctx.model;
        let w = ctx.word_size();
        let mut cur = self
            .current
            .expect("enclosing-frame access occurs only inside functions");
        ctx.asm.lw(
            T0,
            Fp,
            self.static_link_offset(model, cur, w),
            "Load static link",
        );
        cur = model
            .func(cur)
            .parent
            .expect("checker scopes nonlocal access to enclosing functions");
        while cur != owner {
            ctx.asm.lw(
                T0,
                T0,
                self.static_link_offset(model, cur, w),
                "Follow static link",
            );
            cur = model
                .func(cur)
                .parent
                .expect("checker scopes nonlocal access to enclosing functions");
        }
    }

    /// Load the variable NAME into A0.
    fn emit_load_identifier(&mut self, ctx: &mut EmitContext<'_>, name: &str) {
        let model = ctx.model;
        let scope = self.current_scope(model);
        let info = model
            .scopes
            .lookup(scope, name)
            .unwrap_or_else(|| panic!("checker resolves identifier {}", name));
        match info {
            SymbolInfo::Global(id) => {
                let label = model.global(id).label.clone();
                ctx.asm
                    .lw_global(A0, &label, &format!("Load global: {}", name));
            }
            SymbolInfo::StackVar(id) => {
                let owner = model.stack_var(id).owner;
                let index = model.var_index(owner, name);
                let w = ctx.word_size();
                let offset = self.slot_offset(model, owner, index, w);
                if self.current == Some(owner) {
                    ctx.asm.lw(A0, Fp, offset, &format!("Load var: {}", name));
                } else {
                    self.emit_frame_walk(ctx, owner);
                    ctx.asm
                        .lw(A0, T0, offset, &format!("Load enclosing var: {}", name));
                }
            }
            other => panic!(
                "identifier {} in expression position must be a variable, got {:?}",
                name, other
            ),
        }
    }

    /// Store A0 into the variable NAME.
    fn emit_store_identifier(&mut self, ctx: &mut EmitContext<'_>, name: &str) {
        let model = ctx.model;
        let scope = self.current_scope(model);
        let info = model
            .scopes
            .lookup(scope, name)
            .unwrap_or_else(|| panic!("checker resolves assignment target {}", name));
        match info {
            SymbolInfo::Global(id) => {
                let label = model.global(id).label.clone();
                ctx.asm
                    .sw_global(A0, &label, T0, &format!("Store global: {}", name));
            }
            SymbolInfo::StackVar(id) => {
                let owner = model.stack_var(id).owner;
                let index = model.var_index(owner, name);
                let w = ctx.word_size();
                let offset = self.slot_offset(model, owner, index, w);
                if self.current == Some(owner) {
                    ctx.asm.sw(A0, Fp, offset, &format!("Store var: {}", name));
                } else {
                    self.emit_frame_walk(ctx, owner);
                    ctx.asm
                        .sw(A0, T0, offset, &format!("Store enclosing var: {}", name));
                }
            }
            other => panic!(
                "assignment target {} must be a variable, got {:?}",
                name, other
            ),
        }
    }

    // ── Control helpers ───────────────────────────────────────────

    /// Branch to TARGET when the boolean in A0 is false.
    fn emit_branch_if_false(&mut self, ctx: &mut EmitContext<'_>, target: &Label) {
        let offset = ctx.attr_offset(ctx.model.bool_class, "__bool__");
        ctx.asm.lw(T0, A0, offset, "Extract truth value");
        ctx.asm.beqz(T0, target, "");
    }

    /// Abort with "Operation on None" when A0 is zero.
    fn emit_none_check(&mut self, ctx: &mut EmitContext<'_>) {
        let ok = ctx.fresh_label();
        ctx.asm.bnez(A0, &ok, "");
        ctx.asm.j(&self.error_none, "Abort: operation on None");
        ctx.asm.local_label(&ok, "");
    }

    /// Push the static link for a call to CALLEE (a nested function).
    fn emit_push_static_link(&mut self, ctx: &mut EmitContext<'_>, callee: FuncId) {
        let model = ctx.model;
        let parent = model
            .func(callee)
            .parent
            .expect("nested functions have a parent");
        let current = self
            .current
            .expect("nested functions are visible only inside their enclosing function");
        if parent == current {
            self.push_reg(ctx, Fp, "Static link: current frame");
        } else {
            self.emit_frame_walk(ctx, parent);
            self.push_reg(ctx, T0, "Static link: enclosing frame");
        }
    }
}

impl EmitStrategy for RiscvEmitter {
    fn emit_top_level(&mut self, statements: &[Stmt], ctx: &mut EmitContext<'_>) {
        self.current = None;
        self.epilogue = None;
        self.emit_statements(statements, ctx);
    }

    fn emit_user_function(&mut self, func: FuncId, ctx: &mut EmitContext<'_>) {
        let model = ctx.model;
        let info = model.func(func);
        let code_label = info.code_label.clone();
        let w = ctx.word_size();
        let locals = info.locals.len() as i32;

        ctx.asm.global_label(&code_label);
        ctx.asm.addi(
            Sp,
            Sp,
            -(locals + 1) * w,
            "Reserve locals and saved registers",
        );
        ctx.asm.sw(Ra, Sp, 0, "Save return address");
        ctx.asm.sw(Fp, Sp, w, "Save caller's frame pointer");
        ctx.asm
            .addi(Fp, Sp, (locals + 2) * w, "New frame pointer");

        for (j, &var) in info.locals.iter().enumerate() {
            let stack_var = model.stack_var(var);
            let offset = -(1 + j as i32) * w;
            match &stack_var.initial_value {
                Some(label) => {
                    ctx.asm
                        .la(A0, label, &format!("Initial value of: {}", stack_var.name));
                    ctx.asm.sw(A0, Fp, offset, "");
                }
                None => {
                    ctx.asm.sw(
                        Zero,
                        Fp,
                        offset,
                        &format!("Initial value of: {} (None)", stack_var.name),
                    );
                }
            }
        }

        let epilogue = ctx.fresh_label();
        self.current = Some(func);
        self.epilogue = Some(epilogue.clone());
        self.emit_statements(&info.statements, ctx);
        self.current = None;
        self.epilogue = None;

        ctx.asm.mv(A0, Zero, "Implicit return None");
        ctx.asm.local_label(&epilogue, "Function epilogue");
        ctx.asm
            .lw(Ra, Fp, -(locals + 2) * w, "Restore return address");
        ctx.asm.addi(Sp, Fp, -w, "Restore stack pointer");
        ctx.asm
            .lw(Fp, Fp, -(locals + 1) * w, "Restore caller's frame pointer");
        ctx.asm.jr(Ra, "Return to caller");
    }

    fn emit_custom_code(&mut self, ctx: &mut EmitContext<'_>) {
        self.emit_makeint(ctx);
        self.emit_makebool(ctx);
        self.emit_streql(ctx);
        self.emit_strcat(ctx);
        self.emit_strsel(ctx);
        self.emit_conslist(ctx);
        self.emit_listcat(ctx);
        self.emit_error_stubs(ctx);
    }
}
