//! Supporting runtime routines emitted after the built-ins: boxing
//! helpers, string and list operations, and the shared error stubs.
//!
//! All routines follow register conventions of their own: arguments in
//! `A0`/`A1`, result in `A0`, temporaries freely clobbered. Routines
//! that allocate save RA and their live values in a small stack frame.

use super::super::asm::Reg::*;
use super::super::{EmitContext, ERROR_DIV_ZERO, ERROR_NONE, ERROR_OOB};
use super::RiscvEmitter;

impl RiscvEmitter {
    /// `makeint`: box the raw integer in A0.
    pub(super) fn emit_makeint(&mut self, ctx: &mut EmitContext<'_>) {
        let w = ctx.word_size();
        let int_offset = ctx.attr_offset(ctx.model.int_class, "__int__");
        let proto = ctx.model.class(ctx.model.int_class).prototype_label.clone();
        ctx.asm.global_label(&self.makeint);
        ctx.asm.addi(Sp, Sp, -2 * w, "Reserve space for RA and value");
        ctx.asm.sw(Ra, Sp, w, "Save return address");
        ctx.asm.sw(A0, Sp, 0, "Save raw value");
        ctx.asm.la(A0, &proto, "Load prototype of: int");
        ctx.asm.jal(&ctx.runtime.alloc, "Allocate boxed int");
        ctx.asm.lw(T0, Sp, 0, "Reload raw value");
        ctx.asm.sw(T0, A0, int_offset, "Set attribute: __int__");
        ctx.asm.lw(Ra, Sp, w, "Restore return address");
        ctx.asm.addi(Sp, Sp, 2 * w, "Free stack frame");
        ctx.asm.jr(Ra, "Return to caller");
    }

    /// `makebool`: select the interned boolean for the raw truth value
    /// in A0.
    pub(super) fn emit_makebool(&mut self, ctx: &mut EmitContext<'_>) {
        let false_const = ctx.pool.false_constant().clone();
        let true_const = ctx.pool.true_constant().clone();
        ctx.asm.global_label(&self.makebool);
        let if_false = ctx.fresh_label();
        ctx.asm.beqz(A0, &if_false, "Zero is False");
        ctx.asm.la(A0, &true_const, "Interned True");
        ctx.asm.jr(Ra, "Return to caller");
        ctx.asm.local_label(&if_false, "");
        ctx.asm.la(A0, &false_const, "Interned False");
        ctx.asm.jr(Ra, "Return to caller");
    }

    /// `streql`: raw 1 in A0 when the strings in A0/A1 are equal, raw 0
    /// otherwise. Leaf routine.
    pub(super) fn emit_streql(&mut self, ctx: &mut EmitContext<'_>) {
        let int_offset = ctx.attr_offset(ctx.model.int_class, "__int__");
        let len_offset = ctx.attr_offset(ctx.model.str_class, "__len__");
        let str_offset = ctx.attr_offset(ctx.model.str_class, "__str__");
        ctx.asm.global_label(&self.streql);
        let none = ctx.fresh_label();
        let head = ctx.fresh_label();
        let equal = ctx.fresh_label();
        let unequal = ctx.fresh_label();
        ctx.asm.beqz(A0, &none, "Left operand is None");
        ctx.asm.beqz(A1, &none, "Right operand is None");
        ctx.asm.lw(T0, A0, len_offset, "Left length");
        ctx.asm.lw(T0, T0, int_offset, "Unbox left length");
        ctx.asm.lw(T1, A1, len_offset, "Right length");
        ctx.asm.lw(T1, T1, int_offset, "Unbox right length");
        ctx.asm.bne(T0, T1, &unequal, "Different lengths");
        ctx.asm.addi(T2, A0, str_offset, "Left characters");
        ctx.asm.addi(T3, A1, str_offset, "Right characters");
        ctx.asm.local_label(&head, "Compare-loop header");
        ctx.asm.beqz(T0, &equal, "All characters compared");
        ctx.asm.lbu(T4, T2, 0, "Left character");
        ctx.asm.lbu(T5, T3, 0, "Right character");
        ctx.asm.bne(T4, T5, &unequal, "Characters differ");
        ctx.asm.addi(T2, T2, 1, "");
        ctx.asm.addi(T3, T3, 1, "");
        ctx.asm.addi(T0, T0, -1, "");
        ctx.asm.j(&head, "Next character");
        ctx.asm.local_label(&equal, "Strings are equal");
        ctx.asm.li(A0, 1, "");
        ctx.asm.jr(Ra, "Return to caller");
        ctx.asm.local_label(&unequal, "Strings differ");
        ctx.asm.mv(A0, Zero, "");
        ctx.asm.jr(Ra, "Return to caller");
        ctx.asm.local_label(&none, "");
        ctx.asm.j(&self.error_none, "Abort: operation on None");
    }

    /// `strcat`: concatenate the strings in A0/A1 into a fresh string.
    pub(super) fn emit_strcat(&mut self, ctx: &mut EmitContext<'_>) {
        let w = ctx.word_size();
        let int_offset = ctx.attr_offset(ctx.model.int_class, "__int__");
        let len_offset = ctx.attr_offset(ctx.model.str_class, "__len__");
        let str_offset = ctx.attr_offset(ctx.model.str_class, "__str__");
        let proto = ctx.model.class(ctx.model.str_class).prototype_label.clone();
        ctx.asm.global_label(&self.strcat);
        let none = ctx.fresh_label();
        ctx.asm.beqz(A0, &none, "Left operand is None");
        ctx.asm.beqz(A1, &none, "Right operand is None");
        // Frame: [4w] RA, [3w] left, [2w] right, [w] total length,
        // [0] result.
        ctx.asm.addi(Sp, Sp, -5 * w, "Reserve stack frame");
        ctx.asm.sw(Ra, Sp, 4 * w, "Save return address");
        ctx.asm.sw(A0, Sp, 3 * w, "Save left string");
        ctx.asm.sw(A1, Sp, 2 * w, "Save right string");
        ctx.asm.lw(T0, A0, len_offset, "Left length");
        ctx.asm.lw(T0, T0, int_offset, "Unbox left length");
        ctx.asm.lw(T1, A1, len_offset, "Right length");
        ctx.asm.lw(T1, T1, int_offset, "Unbox right length");
        ctx.asm.add(T2, T0, T1, "Combined length");
        ctx.asm.sw(T2, Sp, w, "Save combined length");
        ctx.asm.li(T3, w, "Word size in bytes");
        ctx.asm.div(T3, T2, T3, "Whole words of characters");
        ctx.asm
            .addi(T3, T3, 1, "One more word for the null terminator");
        ctx.asm
            .addi(A1, T3, 4, "Object size: header, length, characters");
        ctx.asm.la(A0, &proto, "Load prototype of: str");
        ctx.asm.jal(&ctx.runtime.alloc2, "Allocate result string");
        ctx.asm.sw(A0, Sp, 0, "Save result");
        ctx.asm.lw(A0, Sp, w, "Reload combined length");
        ctx.asm.jal(&self.makeint, "Box combined length");
        ctx.asm.lw(T6, Sp, 0, "Reload result");
        ctx.asm.sw(A0, T6, len_offset, "Set attribute: __len__");
        ctx.asm.addi(T3, T6, str_offset, "Destination cursor");
        // Copy the left string's characters.
        let copy_left = ctx.fresh_label();
        let left_done = ctx.fresh_label();
        ctx.asm.lw(T0, Sp, 3 * w, "Reload left string");
        ctx.asm.lw(T1, T0, len_offset, "Left length");
        ctx.asm.lw(T1, T1, int_offset, "Unbox left length");
        ctx.asm.addi(T2, T0, str_offset, "Left characters");
        ctx.asm.local_label(&copy_left, "Copy-loop header");
        ctx.asm.beqz(T1, &left_done, "Left copied");
        ctx.asm.lbu(T4, T2, 0, "Load character");
        ctx.asm.sb(T4, T3, 0, "Store character");
        ctx.asm.addi(T2, T2, 1, "");
        ctx.asm.addi(T3, T3, 1, "");
        ctx.asm.addi(T1, T1, -1, "");
        ctx.asm.j(&copy_left, "Next character");
        ctx.asm.local_label(&left_done, "");
        // Copy the right string's characters.
        let copy_right = ctx.fresh_label();
        let right_done = ctx.fresh_label();
        ctx.asm.lw(T0, Sp, 2 * w, "Reload right string");
        ctx.asm.lw(T1, T0, len_offset, "Right length");
        ctx.asm.lw(T1, T1, int_offset, "Unbox right length");
        ctx.asm.addi(T2, T0, str_offset, "Right characters");
        ctx.asm.local_label(&copy_right, "Copy-loop header");
        ctx.asm.beqz(T1, &right_done, "Right copied");
        ctx.asm.lbu(T4, T2, 0, "Load character");
        ctx.asm.sb(T4, T3, 0, "Store character");
        ctx.asm.addi(T2, T2, 1, "");
        ctx.asm.addi(T3, T3, 1, "");
        ctx.asm.addi(T1, T1, -1, "");
        ctx.asm.j(&copy_right, "Next character");
        ctx.asm.local_label(&right_done, "");
        ctx.asm.sb(Zero, T3, 0, "Null terminator");
        ctx.asm.mv(A0, T6, "Result string");
        ctx.asm.lw(Ra, Sp, 4 * w, "Restore return address");
        ctx.asm.addi(Sp, Sp, 5 * w, "Free stack frame");
        ctx.asm.jr(Ra, "Return to caller");
        ctx.asm.local_label(&none, "");
        ctx.asm.j(&self.error_none, "Abort: operation on None");
    }

    /// `strsel`: the one-character string at raw index A1 of the string
    /// in A0, with bounds checking.
    pub(super) fn emit_strsel(&mut self, ctx: &mut EmitContext<'_>) {
        let w = ctx.word_size();
        let int_offset = ctx.attr_offset(ctx.model.int_class, "__int__");
        let len_offset = ctx.attr_offset(ctx.model.str_class, "__len__");
        let str_offset = ctx.attr_offset(ctx.model.str_class, "__str__");
        let proto = ctx.model.class(ctx.model.str_class).prototype_label.clone();
        ctx.asm.global_label(&self.strsel);
        let oob = ctx.fresh_label();
        let ok = ctx.fresh_label();
        ctx.asm.lw(T0, A0, len_offset, "String length");
        ctx.asm.lw(T0, T0, int_offset, "Unbox length");
        ctx.asm.bltz(A1, &oob, "Negative index");
        ctx.asm.slt(T1, A1, T0, "Index < length");
        ctx.asm.bnez(T1, &ok, "");
        ctx.asm.local_label(&oob, "Out-of-bounds index");
        ctx.asm.j(&self.error_oob, "Abort: index out of bounds");
        ctx.asm.local_label(&ok, "");
        // Frame: [3w] RA, [2w] string, [w] index, [0] result.
        ctx.asm.addi(Sp, Sp, -4 * w, "Reserve stack frame");
        ctx.asm.sw(Ra, Sp, 3 * w, "Save return address");
        ctx.asm.sw(A0, Sp, 2 * w, "Save string");
        ctx.asm.sw(A1, Sp, w, "Save index");
        ctx.asm.la(A0, &proto, "Load prototype of: str");
        ctx.asm
            .li(A1, 5, "Object size of a one-character string");
        ctx.asm.jal(&ctx.runtime.alloc2, "Allocate result string");
        ctx.asm.sw(A0, Sp, 0, "Save result");
        ctx.asm.li(A0, 1, "Result length");
        ctx.asm.jal(&self.makeint, "Box result length");
        ctx.asm.lw(T0, Sp, 0, "Reload result");
        ctx.asm.sw(A0, T0, len_offset, "Set attribute: __len__");
        ctx.asm.lw(T1, Sp, 2 * w, "Reload string");
        ctx.asm.lw(T2, Sp, w, "Reload index");
        ctx.asm.add(T1, T1, T2, "Character address, minus offset");
        ctx.asm.lbu(T3, T1, str_offset, "Load character");
        ctx.asm.sb(T3, T0, str_offset, "Store character");
        ctx.asm.sb(Zero, T0, str_offset + 1, "Null terminator");
        ctx.asm.mv(A0, T0, "Result string");
        ctx.asm.lw(Ra, Sp, 3 * w, "Restore return address");
        ctx.asm.addi(Sp, Sp, 4 * w, "Free stack frame");
        ctx.asm.jr(Ra, "Return to caller");
    }

    /// `conslist`: construct a list from the raw element count in A0
    /// and the elements pushed on the stack (first element deepest).
    /// The caller pops the elements.
    pub(super) fn emit_conslist(&mut self, ctx: &mut EmitContext<'_>) {
        let w = ctx.word_size();
        let len_offset = ctx.attr_offset(ctx.model.list_class, "__len__");
        let proto = ctx
            .model
            .class(ctx.model.list_class)
            .prototype_label
            .clone();
        ctx.asm.global_label(&self.conslist);
        // Frame: [2w] RA, [w] count, [0] result. Caller's elements sit
        // above the frame, at [3w + (count-1-i)*w] for element i.
        ctx.asm.addi(Sp, Sp, -3 * w, "Reserve stack frame");
        ctx.asm.sw(Ra, Sp, 2 * w, "Save return address");
        ctx.asm.sw(A0, Sp, w, "Save element count");
        ctx.asm
            .addi(A1, A0, 4, "Object size: header, length, elements");
        ctx.asm.la(A0, &proto, "Load prototype of list");
        ctx.asm.jal(&ctx.runtime.alloc2, "Allocate list object");
        ctx.asm.sw(A0, Sp, 0, "Save result");
        ctx.asm.lw(A0, Sp, w, "Reload element count");
        ctx.asm.jal(&self.makeint, "Box element count");
        ctx.asm.lw(T0, Sp, 0, "Reload result");
        ctx.asm.sw(A0, T0, len_offset, "Set attribute: __len__");
        ctx.asm.lw(T1, Sp, w, "Reload element count");
        // Copy elements: T2 = index, source offset descends as the
        // index ascends.
        let head = ctx.fresh_label();
        let done = ctx.fresh_label();
        ctx.asm.mv(T2, Zero, "Element index");
        ctx.asm.local_label(&head, "Copy-loop header");
        ctx.asm.beq(T2, T1, &done, "All elements copied");
        ctx.asm.sub(T3, T1, T2, "");
        ctx.asm.addi(T3, T3, -1, "Stack distance of element");
        ctx.asm.li(T4, w, "Word size in bytes");
        ctx.asm.mul(T3, T3, T4, "");
        ctx.asm.addi(T3, T3, 3 * w, "Skip over the frame");
        ctx.asm.add(T3, Sp, T3, "Element source address");
        ctx.asm.lw(T3, T3, 0, "Load element");
        ctx.asm.mul(T5, T2, T4, "");
        ctx.asm.add(T5, T0, T5, "Element destination address");
        ctx.asm.sw(T3, T5, 4 * w, "Store element");
        ctx.asm.addi(T2, T2, 1, "Next element");
        ctx.asm.j(&head, "Loop back");
        ctx.asm.local_label(&done, "");
        ctx.asm.mv(A0, T0, "Result list");
        ctx.asm.lw(Ra, Sp, 2 * w, "Restore return address");
        ctx.asm.addi(Sp, Sp, 3 * w, "Free stack frame");
        ctx.asm.jr(Ra, "Return to caller");
    }

    /// `listcat`: concatenate the lists in A0/A1 into a fresh list.
    pub(super) fn emit_listcat(&mut self, ctx: &mut EmitContext<'_>) {
        let w = ctx.word_size();
        let int_offset = ctx.attr_offset(ctx.model.int_class, "__int__");
        let len_offset = ctx.attr_offset(ctx.model.list_class, "__len__");
        let proto = ctx
            .model
            .class(ctx.model.list_class)
            .prototype_label
            .clone();
        ctx.asm.global_label(&self.listcat);
        let none = ctx.fresh_label();
        ctx.asm.beqz(A0, &none, "Left operand is None");
        ctx.asm.beqz(A1, &none, "Right operand is None");
        // Frame: [4w] RA, [3w] left, [2w] right, [w] total length,
        // [0] result.
        ctx.asm.addi(Sp, Sp, -5 * w, "Reserve stack frame");
        ctx.asm.sw(Ra, Sp, 4 * w, "Save return address");
        ctx.asm.sw(A0, Sp, 3 * w, "Save left list");
        ctx.asm.sw(A1, Sp, 2 * w, "Save right list");
        ctx.asm.lw(T0, A0, len_offset, "Left length");
        ctx.asm.lw(T0, T0, int_offset, "Unbox left length");
        ctx.asm.lw(T1, A1, len_offset, "Right length");
        ctx.asm.lw(T1, T1, int_offset, "Unbox right length");
        ctx.asm.add(T2, T0, T1, "Combined length");
        ctx.asm.sw(T2, Sp, w, "Save combined length");
        ctx.asm
            .addi(A1, T2, 4, "Object size: header, length, elements");
        ctx.asm.la(A0, &proto, "Load prototype of list");
        ctx.asm.jal(&ctx.runtime.alloc2, "Allocate result list");
        ctx.asm.sw(A0, Sp, 0, "Save result");
        ctx.asm.lw(A0, Sp, w, "Reload combined length");
        ctx.asm.jal(&self.makeint, "Box combined length");
        ctx.asm.lw(T6, Sp, 0, "Reload result");
        ctx.asm.sw(A0, T6, len_offset, "Set attribute: __len__");
        ctx.asm.addi(T3, T6, 4 * w, "Destination cursor");
        // Copy the left list's elements.
        let copy_left = ctx.fresh_label();
        let left_done = ctx.fresh_label();
        ctx.asm.lw(T0, Sp, 3 * w, "Reload left list");
        ctx.asm.lw(T1, T0, len_offset, "Left length");
        ctx.asm.lw(T1, T1, int_offset, "Unbox left length");
        ctx.asm.addi(T2, T0, 4 * w, "Left elements");
        ctx.asm.local_label(&copy_left, "Copy-loop header");
        ctx.asm.beqz(T1, &left_done, "Left copied");
        ctx.asm.lw(T4, T2, 0, "Load element");
        ctx.asm.sw(T4, T3, 0, "Store element");
        ctx.asm.addi(T2, T2, w, "");
        ctx.asm.addi(T3, T3, w, "");
        ctx.asm.addi(T1, T1, -1, "");
        ctx.asm.j(&copy_left, "Next element");
        ctx.asm.local_label(&left_done, "");
        // Copy the right list's elements.
        let copy_right = ctx.fresh_label();
        let right_done = ctx.fresh_label();
        ctx.asm.lw(T0, Sp, 2 * w, "Reload right list");
        ctx.asm.lw(T1, T0, len_offset, "Right length");
        ctx.asm.lw(T1, T1, int_offset, "Unbox right length");
        ctx.asm.addi(T2, T0, 4 * w, "Right elements");
        ctx.asm.local_label(&copy_right, "Copy-loop header");
        ctx.asm.beqz(T1, &right_done, "Right copied");
        ctx.asm.lw(T4, T2, 0, "Load element");
        ctx.asm.sw(T4, T3, 0, "Store element");
        ctx.asm.addi(T2, T2, w, "");
        ctx.asm.addi(T3, T3, w, "");
        ctx.asm.addi(T1, T1, -1, "");
        ctx.asm.j(&copy_right, "Next element");
        ctx.asm.local_label(&right_done, "");
        ctx.asm.mv(A0, T6, "Result list");
        ctx.asm.lw(Ra, Sp, 4 * w, "Restore return address");
        ctx.asm.addi(Sp, Sp, 5 * w, "Free stack frame");
        ctx.asm.jr(Ra, "Return to caller");
        ctx.asm.local_label(&none, "");
        ctx.asm.j(&self.error_none, "Abort: operation on None");
    }

    /// The shared error stubs jumped to from inline checks.
    pub(super) fn emit_error_stubs(&mut self, ctx: &mut EmitContext<'_>) {
        let str_offset = ctx.attr_offset(ctx.model.str_class, "__str__");
        let stubs = [
            (
                self.error_div.clone(),
                ERROR_DIV_ZERO,
                "Division by zero",
                "Exit code for: Division by zero",
            ),
            (
                self.error_oob.clone(),
                ERROR_OOB,
                "Index out of bounds",
                "Exit code for: Index out of bounds",
            ),
            (
                self.error_none.clone(),
                ERROR_NONE,
                "Operation on None",
                "Exit code for: Operation on None",
            ),
        ];
        for (label, code, message, comment) in stubs {
            let message_label = ctx.pool.str_constant(message);
            ctx.asm.global_label(&label);
            ctx.asm.li(A0, code, comment);
            ctx.asm.la(A1, &message_label, "Load error message as str");
            ctx.asm
                .addi(A1, A1, str_offset, "Load address of attribute __str__");
            ctx.asm.j(&ctx.runtime.abort, "Abort");
        }
    }
}
