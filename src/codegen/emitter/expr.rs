use crate::ast::{Expr, ExprKind};

use super::super::asm::Reg::*;
use super::super::info::SymbolInfo;
use super::super::EmitContext;
use super::RiscvEmitter;

impl RiscvEmitter {
    /// Emit EXPR, leaving its (boxed) value in A0.
    pub(super) fn emit_expr(&mut self, expr: &Expr, ctx: &mut EmitContext<'_>) {
        match &expr.kind {
            ExprKind::IntegerLiteral { value } => {
                let label = ctx.pool.int_constant(*value);
                ctx.asm
                    .la(A0, &label, &format!("Load integer literal: {}", value));
            }
            ExprKind::StringLiteral { value } => {
                let label = ctx.pool.str_constant(value);
                ctx.asm.la(A0, &label, "Load string literal");
            }
            ExprKind::BooleanLiteral { value } => {
                let label = if *value {
                    ctx.pool.true_constant().clone()
                } else {
                    ctx.pool.false_constant().clone()
                };
                ctx.asm
                    .la(A0, &label, &format!("Load boolean literal: {}", value));
            }
            ExprKind::NoneLiteral {} => {
                ctx.asm.mv(A0, Zero, "Load None");
            }
            ExprKind::Identifier { name } => {
                self.emit_load_identifier(ctx, name);
            }
            ExprKind::BinaryExpr {
                operator,
                left,
                right,
            } => {
                self.emit_binary(operator, left, right, ctx);
            }
            ExprKind::UnaryExpr { operator, operand } => {
                self.emit_unary(operator, operand, ctx);
            }
            ExprKind::IfExpr {
                condition,
                then_expr,
                else_expr,
            } => {
                let else_label = ctx.fresh_label();
                let end_label = ctx.fresh_label();
                self.emit_expr(condition, ctx);
                self.emit_branch_if_false(ctx, &else_label);
                self.emit_expr(then_expr, ctx);
                ctx.asm.j(&end_label, "Skip else branch");
                ctx.asm.local_label(&else_label, "Else branch");
                self.emit_expr(else_expr, ctx);
                ctx.asm.local_label(&end_label, "End of conditional");
            }
            ExprKind::CallExpr { function, args } => {
                self.emit_call(function, args, ctx);
            }
            ExprKind::MethodCallExpr {
                object,
                method,
                args,
            } => {
                self.emit_method_call(object, method, args, ctx);
            }
            ExprKind::MemberExpr { object, member } => {
                self.emit_expr(object, ctx);
                self.emit_none_check(ctx);
                let class = ctx
                    .model
                    .class_for_type(object.ty())
                    .expect("checker resolves attribute owners");
                let offset = ctx.attr_offset(class, member);
                ctx.asm
                    .lw(A0, A0, offset, &format!("Load attribute: {}", member));
            }
            ExprKind::IndexExpr { list, index } => {
                self.emit_index(list, index, ctx);
            }
            ExprKind::ListExpr { elements } => {
                for (i, element) in elements.iter().enumerate() {
                    self.emit_expr(element, ctx);
                    self.push_reg(ctx, A0, &format!("List element {}", i));
                }
                let w = ctx.word_size();
                ctx.asm
                    .li(A0, elements.len() as i32, "Number of elements");
                ctx.asm.jal(&self.conslist, "Construct list");
                if !elements.is_empty() {
                    ctx.asm
                        .addi(Sp, Sp, elements.len() as i32 * w, "Pop list elements");
                }
            }
        }
    }

    fn emit_unary(&mut self, operator: &str, operand: &Expr, ctx: &mut EmitContext<'_>) {
        self.emit_expr(operand, ctx);
        match operator {
            "-" => {
                let int_offset = ctx.attr_offset(ctx.model.int_class, "__int__");
                ctx.asm.lw(T0, A0, int_offset, "Unbox int");
                ctx.asm.sub(A0, Zero, T0, "Negate");
                ctx.asm.jal(&self.makeint, "Box result");
            }
            "not" => {
                let bool_offset = ctx.attr_offset(ctx.model.bool_class, "__bool__");
                let true_label = ctx.fresh_label();
                let end_label = ctx.fresh_label();
                let false_const = ctx.pool.false_constant().clone();
                let true_const = ctx.pool.true_constant().clone();
                ctx.asm.lw(T0, A0, bool_offset, "Extract truth value");
                ctx.asm.beqz(T0, &true_label, "");
                ctx.asm.la(A0, &false_const, "not True is False");
                ctx.asm.j(&end_label, "");
                ctx.asm.local_label(&true_label, "");
                ctx.asm.la(A0, &true_const, "not False is True");
                ctx.asm.local_label(&end_label, "");
            }
            other => panic!("unknown unary operator: {}", other),
        }
    }

    fn emit_binary(
        &mut self,
        operator: &str,
        left: &Expr,
        right: &Expr,
        ctx: &mut EmitContext<'_>,
    ) {
        // Short-circuit operators evaluate the right operand lazily.
        if operator == "and" || operator == "or" {
            let bool_offset = ctx.attr_offset(ctx.model.bool_class, "__bool__");
            let end = ctx.fresh_label();
            self.emit_expr(left, ctx);
            ctx.asm.lw(T0, A0, bool_offset, "Extract truth value");
            if operator == "and" {
                ctx.asm.beqz(T0, &end, "Short-circuit: left is False");
            } else {
                ctx.asm.bnez(T0, &end, "Short-circuit: left is True");
            }
            self.emit_expr(right, ctx);
            ctx.asm.local_label(&end, "End of short-circuit");
            return;
        }

        self.emit_expr(left, ctx);
        self.push_reg(ctx, A0, "Left operand");
        self.emit_expr(right, ctx);
        self.pop_reg(ctx, T0, "Left operand");

        if operator == "is" {
            ctx.asm.sub(T0, T0, A0, "Compare identities");
            ctx.asm.seqz(A0, T0, "");
            ctx.asm.jal(&self.makebool, "Box result");
            return;
        }

        let ty = left.ty();
        if ty.is_str() {
            self.emit_str_binary(operator, ctx);
        } else if ty.is_list() {
            assert_eq!(operator, "+", "lists support only concatenation");
            ctx.asm.mv(A1, A0, "Right list");
            ctx.asm.mv(A0, T0, "Left list");
            ctx.asm.jal(&self.listcat, "Concatenate lists");
        } else if ty.is_int() {
            self.emit_int_binary(operator, ctx);
        } else {
            // Booleans (and any other object comparison) compare by
            // identity: both truth values are interned.
            match operator {
                "==" => {
                    ctx.asm.sub(T0, T0, A0, "Compare values");
                    ctx.asm.seqz(A0, T0, "");
                    ctx.asm.jal(&self.makebool, "Box result");
                }
                "!=" => {
                    ctx.asm.sub(T0, T0, A0, "Compare values");
                    ctx.asm.snez(A0, T0, "");
                    ctx.asm.jal(&self.makebool, "Box result");
                }
                other => panic!("unknown operator {} for type {}", other, ty),
            }
        }
    }

    /// String operators. Left is in T0, right in A0.
    fn emit_str_binary(&mut self, operator: &str, ctx: &mut EmitContext<'_>) {
        match operator {
            "+" => {
                ctx.asm.mv(A1, A0, "Right string");
                ctx.asm.mv(A0, T0, "Left string");
                ctx.asm.jal(&self.strcat, "Concatenate strings");
            }
            "==" => {
                ctx.asm.mv(A1, A0, "Right string");
                ctx.asm.mv(A0, T0, "Left string");
                ctx.asm.jal(&self.streql, "Compare strings");
                ctx.asm.jal(&self.makebool, "Box result");
            }
            "!=" => {
                ctx.asm.mv(A1, A0, "Right string");
                ctx.asm.mv(A0, T0, "Left string");
                ctx.asm.jal(&self.streql, "Compare strings");
                ctx.asm.xori(A0, A0, 1, "Invert comparison");
                ctx.asm.jal(&self.makebool, "Box result");
            }
            other => panic!("unknown string operator: {}", other),
        }
    }

    /// Integer arithmetic and comparison. Left is in T0, right in A0;
    /// raw values go through T1/T2.
    fn emit_int_binary(&mut self, operator: &str, ctx: &mut EmitContext<'_>) {
        let int_offset = ctx.attr_offset(ctx.model.int_class, "__int__");
        ctx.asm.lw(T1, T0, int_offset, "Unbox left int");
        ctx.asm.lw(T2, A0, int_offset, "Unbox right int");
        match operator {
            "+" => {
                ctx.asm.add(A0, T1, T2, "Add");
                ctx.asm.jal(&self.makeint, "Box result");
            }
            "-" => {
                ctx.asm.sub(A0, T1, T2, "Subtract");
                ctx.asm.jal(&self.makeint, "Box result");
            }
            "*" => {
                ctx.asm.mul(A0, T1, T2, "Multiply");
                ctx.asm.jal(&self.makeint, "Box result");
            }
            "//" => {
                self.emit_divisor_check(ctx);
                let done = ctx.fresh_label();
                ctx.asm.div(T3, T1, T2, "Quotient (truncated)");
                ctx.asm.rem(T4, T1, T2, "Remainder");
                ctx.asm.beqz(T4, &done, "Exact quotient");
                ctx.asm.xor(T5, T1, T2, "Compare operand signs");
                ctx.asm.bgez(T5, &done, "Same signs: already floored");
                ctx.asm
                    .addi(T3, T3, -1, "Round toward negative infinity");
                ctx.asm.local_label(&done, "");
                ctx.asm.mv(A0, T3, "Quotient");
                ctx.asm.jal(&self.makeint, "Box result");
            }
            "%" => {
                self.emit_divisor_check(ctx);
                let done = ctx.fresh_label();
                ctx.asm.rem(T3, T1, T2, "Remainder");
                ctx.asm.beqz(T3, &done, "Exact quotient");
                ctx.asm.xor(T5, T3, T2, "Compare signs");
                ctx.asm.bgez(T5, &done, "Same signs: already modulo");
                ctx.asm.add(T3, T3, T2, "Result takes divisor's sign");
                ctx.asm.local_label(&done, "");
                ctx.asm.mv(A0, T3, "Remainder");
                ctx.asm.jal(&self.makeint, "Box result");
            }
            "==" => {
                ctx.asm.sub(T3, T1, T2, "Compare ints");
                ctx.asm.seqz(A0, T3, "");
                ctx.asm.jal(&self.makebool, "Box result");
            }
            "!=" => {
                ctx.asm.sub(T3, T1, T2, "Compare ints");
                ctx.asm.snez(A0, T3, "");
                ctx.asm.jal(&self.makebool, "Box result");
            }
            "<" => {
                ctx.asm.slt(A0, T1, T2, "Less than");
                ctx.asm.jal(&self.makebool, "Box result");
            }
            "<=" => {
                ctx.asm.slt(A0, T2, T1, "Greater than, inverted");
                ctx.asm.xori(A0, A0, 1, "");
                ctx.asm.jal(&self.makebool, "Box result");
            }
            ">" => {
                ctx.asm.slt(A0, T2, T1, "Greater than");
                ctx.asm.jal(&self.makebool, "Box result");
            }
            ">=" => {
                ctx.asm.slt(A0, T1, T2, "Less than, inverted");
                ctx.asm.xori(A0, A0, 1, "");
                ctx.asm.jal(&self.makebool, "Box result");
            }
            other => panic!("unknown integer operator: {}", other),
        }
    }

    /// Abort with "Division by zero" when the raw divisor in T2 is zero.
    fn emit_divisor_check(&mut self, ctx: &mut EmitContext<'_>) {
        let ok = ctx.fresh_label();
        ctx.asm.bnez(T2, &ok, "Divisor is nonzero");
        ctx.asm.j(&self.error_div, "Abort: division by zero");
        ctx.asm.local_label(&ok, "");
    }

    fn emit_index(&mut self, list: &Expr, index: &Expr, ctx: &mut EmitContext<'_>) {
        let w = ctx.word_size();
        let int_offset = ctx.attr_offset(ctx.model.int_class, "__int__");
        if list.ty().is_str() {
            self.emit_expr(list, ctx);
            self.emit_none_check(ctx);
            self.push_reg(ctx, A0, "String");
            self.emit_expr(index, ctx);
            ctx.asm.lw(A1, A0, int_offset, "Unbox index");
            self.pop_reg(ctx, A0, "String");
            ctx.asm.jal(&self.strsel, "Select one-character string");
        } else {
            let len_offset = ctx.attr_offset(ctx.model.list_class, "__len__");
            self.emit_expr(list, ctx);
            self.emit_none_check(ctx);
            self.push_reg(ctx, A0, "List");
            self.emit_expr(index, ctx);
            ctx.asm.lw(T1, A0, int_offset, "Unbox index");
            self.pop_reg(ctx, T0, "List");
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
            ctx.asm.lw(A0, T3, 4 * w, "Load element");
        }
    }

    /// A call to a global or nested function, or a constructor call.
    fn emit_call(&mut self, function: &str, args: &[Expr], ctx: &mut EmitContext<'_>) {
        let model = ctx.model;
        let scope = self.current_scope(model);
        let info = model
            .scopes
            .lookup(scope, function)
            .unwrap_or_else(|| panic!("checker resolves callee {}", function));
        let w = ctx.word_size();
        match info {
            SymbolInfo::Func(callee) => {
                let has_link = model.func(callee).depth > 0;
                if has_link {
                    self.emit_push_static_link(ctx, callee);
                }
                for (i, arg) in args.iter().enumerate() {
                    self.emit_expr(arg, ctx);
                    self.push_reg(ctx, A0, &format!("Argument {}", i));
                }
                ctx.asm.addi(Sp, Sp, -w, "Reserve callee slot");
                let code_label = model.func(callee).code_label.clone();
                ctx.asm
                    .jal(&code_label, &format!("Invoke function: {}", function));
                let pushed = args.len() as i32 + 1 + if has_link { 1 } else { 0 };
                ctx.asm.addi(Sp, Sp, pushed * w, "Pop arguments");
            }
            SymbolInfo::Class(class) => {
                assert!(
                    args.is_empty(),
                    "constructors take no arguments at the call site"
                );
                let class_info = model.class(class);
                let proto = class_info.prototype_label.clone();
                ctx.asm
                    .la(A0, &proto, &format!("Load prototype of: {}", class_info.name));
                ctx.asm.jal(&ctx.runtime.alloc, "Allocate new object");
                self.push_reg(ctx, A0, "New object");
                self.push_reg(ctx, A0, "Argument: self");
                ctx.asm.addi(Sp, Sp, -w, "Reserve callee slot");
                let init_index = class_info
                    .method_index("__init__")
                    .expect("every class inherits __init__ from object");
                let init_label = model
                    .func(class_info.methods[init_index].func)
                    .code_label
                    .clone();
                ctx.asm.jal(&init_label, "Invoke constructor");
                ctx.asm.addi(Sp, Sp, 2 * w, "Pop constructor argument");
                self.pop_reg(ctx, A0, "New object");
            }
            other => panic!("callee {} must be a function or class, got {:?}", function, other),
        }
    }

    /// A method call, dispatched through the receiver's table.
    fn emit_method_call(
        &mut self,
        object: &Expr,
        method: &str,
        args: &[Expr],
        ctx: &mut EmitContext<'_>,
    ) {
        let w = ctx.word_size();
        self.emit_expr(object, ctx);
        self.emit_none_check(ctx);
        self.push_reg(ctx, A0, "Argument: self");
        for (i, arg) in args.iter().enumerate() {
            self.emit_expr(arg, ctx);
            self.push_reg(ctx, A0, &format!("Argument {}", i + 1));
        }
        ctx.asm.addi(Sp, Sp, -w, "Reserve callee slot");

        let total = args.len() as i32 + 1;
        let class = ctx
            .model
            .class_for_type(object.ty())
            .expect("checker resolves receiver classes");
        let method_offset = ctx.method_offset(class, method);
        let dispatch_offset = ctx.dispatch_table_offset();
        ctx.asm.lw(A0, Sp, total * w, "Reload receiver");
        ctx.asm
            .lw(T0, A0, dispatch_offset, "Load dispatch table");
        ctx.asm
            .lw(T1, T0, method_offset, &format!("Load method: {}", method));
        ctx.asm.jalr(T1, "Invoke method");
        ctx.asm.addi(Sp, Sp, (total + 1) * w, "Pop arguments");
    }
}
