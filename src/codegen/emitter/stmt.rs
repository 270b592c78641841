use crate::ast::{Expr, ExprKind, Stmt};

use super::super::asm::Reg::*;
use super::super::EmitContext;
use super::RiscvEmitter;

impl RiscvEmitter {
    pub(super) fn emit_statements(&mut self, statements: &[Stmt], ctx: &mut EmitContext<'_>) {
        for stmt in statements {
            self.emit_stmt(stmt, ctx);
        }
    }

    fn emit_stmt(&mut self, stmt: &Stmt, ctx: &mut EmitContext<'_>) {
        match stmt {
            Stmt::ExprStmt { expr, .. } => {
                self.emit_expr(expr, ctx);
            }
            Stmt::AssignStmt { targets, value, .. } => {
                self.emit_expr(value, ctx);
                self.push_reg(ctx, A0, "Assigned value");
                for target in targets {
                    self.emit_store_target(target, ctx);
                }
                let w = ctx.word_size();
                ctx.asm.addi(Sp, Sp, w, "Pop assigned value");
            }
            Stmt::IfStmt {
                condition,
                then_body,
                else_body,
                ..
            } => {
                let else_label = ctx.fresh_label();
                let end_label = ctx.fresh_label();
                self.emit_expr(condition, ctx);
                self.emit_branch_if_false(ctx, &else_label);
                self.emit_statements(then_body, ctx);
                ctx.asm.j(&end_label, "Skip else body");
                ctx.asm.local_label(&else_label, "Else body");
                self.emit_statements(else_body, ctx);
                ctx.asm.local_label(&end_label, "End of if");
            }
            Stmt::WhileStmt {
                condition, body, ..
            } => {
                let head = ctx.fresh_label();
                let end = ctx.fresh_label();
                ctx.asm.local_label(&head, "While loop head");
                self.emit_expr(condition, ctx);
                self.emit_branch_if_false(ctx, &end);
                self.emit_statements(body, ctx);
                ctx.asm.j(&head, "Loop back");
                ctx.asm.local_label(&end, "End of while loop");
            }
            Stmt::ForStmt {
                identifier,
                iterable,
                body,
                ..
            } => self.emit_for(identifier, iterable, body, ctx),
            Stmt::ReturnStmt { value, .. } => {
                match value {
                    Some(expr) => self.emit_expr(expr, ctx),
                    None => ctx.asm.mv(A0, Zero, "Return None"),
                }
                let epilogue = self
                    .epilogue
                    .clone()
                    .expect("return statements occur only inside functions");
                ctx.asm.j(&epilogue, "Return");
            }
        }
    }

    /// Store the assigned value (on top of the stack) into TARGET.
    fn emit_store_target(&mut self, target: &Expr, ctx: &mut EmitContext<'_>) {
        let w = ctx.word_size();
        match &target.kind {
            ExprKind::Identifier { name } => {
                ctx.asm.lw(A0, Sp, 0, "Reload assigned value");
                self.emit_store_identifier(ctx, name);
            }
            ExprKind::MemberExpr { object, member } => {
                self.emit_expr(object, ctx);
                self.emit_none_check(ctx);
                let class = ctx
                    .model
                    .class_for_type(object.ty())
                    .expect("checker resolves attribute owners");
                let offset = ctx.attr_offset(class, member);
                ctx.asm.lw(T1, Sp, 0, "Reload assigned value");
                ctx.asm
                    .sw(T1, A0, offset, &format!("Store attribute: {}", member));
            }
            ExprKind::IndexExpr { list, index } => {
                self.emit_expr(list, ctx);
                self.emit_none_check(ctx);
                self.push_reg(ctx, A0, "Target list");
                self.emit_expr(index, ctx);
                let int_offset = ctx.attr_offset(ctx.model.int_class, "__int__");
                let len_offset = ctx.attr_offset(ctx.model.list_class, "__len__");
                ctx.asm.lw(T1, A0, int_offset, "Unbox index");
                self.pop_reg(ctx, T0, "Target list");
                ctx.asm.lw(T2, T0, len_offset, "Load list length");
                ctx.asm.lw(T2, T2, int_offset, "Unbox list length");
                let oob = ctx.fresh_label();
                let ok = ctx.fresh_label();
                ctx.asm.bltz(T1, &oob, "Negative index");
                ctx.asm.slt(T3, T1, T2, "Index < length");
                ctx.asm.bnez(T3, &ok, "");
                ctx.asm.local_label(&oob, "Out-of-bounds index");
                ctx.asm.j(&self.error_oob, "Abort: index out of bounds");
                ctx.asm.local_label(&ok, "");
                ctx.asm.li(T3, w, "Word size in bytes");
                ctx.asm.mul(T3, T1, T3, "Element offset");
                ctx.asm.add(T3, T0, T3, "Element address");
                ctx.asm.lw(T4, Sp, 0, "Reload assigned value");
                ctx.asm.sw(T4, T3, 4 * w, "Store list element");
            }
            other => panic!("invalid assignment target: {:?}", other),
        }
    }

    /// `for x in iterable:` over a string or a list.
    ///
    /// The iterable and a raw index live on the stack for the duration
    /// of the loop; both classes keep their length at attribute index 0.
    fn emit_for(
        &mut self,
        identifier: &str,
        iterable: &Expr,
        body: &[Stmt],
        ctx: &mut EmitContext<'_>,
    ) {
        let w = ctx.word_size();
        let over_str = iterable.ty().is_str();
        let int_offset = ctx.attr_offset(ctx.model.int_class, "__int__");
        let len_offset = ctx.attr_offset(ctx.model.list_class, "__len__");

        self.emit_expr(iterable, ctx);
        self.emit_none_check(ctx);
        self.push_reg(ctx, A0, "Loop iterable");
        self.push_reg(ctx, Zero, "Loop index");

        let head = ctx.fresh_label();
        let end = ctx.fresh_label();
        ctx.asm.local_label(&head, "For loop head");
        ctx.asm.lw(T0, Sp, w, "Load loop iterable");
        ctx.asm.lw(T1, Sp, 0, "Load loop index");
        ctx.asm.lw(T2, T0, len_offset, "Load length");
        ctx.asm.lw(T2, T2, int_offset, "Unbox length");
        ctx.asm.slt(T3, T1, T2, "Index < length");
        ctx.asm.beqz(T3, &end, "Loop finished");

        if over_str {
            ctx.asm.mv(A0, T0, "String being iterated");
            ctx.asm.mv(A1, T1, "Character index");
            ctx.asm.jal(&self.strsel, "Select one-character string");
        } else {
            ctx.asm.li(T3, w, "Word size in bytes");
            ctx.asm.mul(T3, T1, T3, "Element offset");
            ctx.asm.add(T3, T0, T3, "Element address");
            ctx.asm.lw(A0, T3, 4 * w, "Load element");
        }
        self.emit_store_identifier(ctx, identifier);

        self.emit_statements(body, ctx);

        ctx.asm.lw(T1, Sp, 0, "Load loop index");
        ctx.asm.addi(T1, T1, 1, "Increment index");
        ctx.asm.sw(T1, Sp, 0, "Store loop index");
        ctx.asm.j(&head, "Loop back");
        ctx.asm.local_label(&end, "End of for loop");
        ctx.asm.addi(Sp, Sp, 2 * w, "Pop loop temporaries");
    }
}
