//! Emission of the predefined functions (`print`, `len`, `input`,
//! `object.__init__`) and the built-in runtime routines (`alloc`,
//! `alloc2`, `abort`, `heap.init`).
//!
//! The predefined functions are leaves: they save neither FP nor RA,
//! and read their only argument directly above the stack pointer.

use super::asm::Reg::*;
use super::info::FuncId;
use super::{Generator, ERROR_ARG, ERROR_NYI, ERROR_OOM};

impl Generator {
    /// `object.__init__(self)`: returns `None`.
    pub(super) fn emit_object_init(&mut self, func: FuncId) {
        let code_label = self.model.func(func).code_label.clone();
        self.asm.global_label(&code_label);
        self.asm.mv(A0, Zero, "`None` constant");
        self.asm.jr(Ra, "Return");
    }

    /// `print(arg)`: dispatches on the argument's type tag to the int,
    /// str, or bool path; aborts on `None` or any other tag.
    pub(super) fn emit_print(&mut self, func: FuncId) {
        let code_label = self.model.func(func).code_label.clone();
        let word_size = self.asm.word_size();
        self.asm.global_label(&code_label);

        let epilogue = self.labels.fresh();
        let illegal_arg = self.labels.fresh();
        let print_int = self.labels.fresh();
        let print_str = self.labels.fresh();
        let print_bool = self.labels.fresh();
        let puts_a1 = self.labels.fresh();

        self.asm.lw(A0, Sp, word_size, "Load arg");
        self.asm
            .beq(A0, Zero, &illegal_arg, "None is an illegal argument");
        self.asm.lw(T0, A0, 0, "Get type tag of arg");

        let int_tag = self.model.class(self.model.int_class).type_tag;
        let str_tag = self.model.class(self.model.str_class).type_tag;
        let bool_tag = self.model.class(self.model.bool_class).type_tag;

        self.asm.li(T1, int_tag, "Load type tag of `int`");
        self.asm.beq(T0, T1, &print_int, "Go to print(int)");
        self.asm.li(T1, str_tag, "Load type tag of `str`");
        self.asm.beq(T0, T1, &print_str, "Go to print(str)");
        self.asm.li(T1, bool_tag, "Load type tag of `bool`");
        self.asm.beq(T0, T1, &print_bool, "Go to print(bool)");

        // Fallthrough: invalid argument.
        self.asm.local_label(&illegal_arg, "Invalid argument");
        self.asm
            .li(A0, ERROR_ARG, "Exit code for: Invalid argument");
        let message = self.pool.str_constant("Invalid argument");
        self.asm.la(A1, &message, "Load error message as str");
        let str_attr_offset = self.attr_offset(self.model.str_class, "__str__");
        self.asm
            .addi(A1, A1, str_attr_offset, "Load address of attribute __str__");
        self.asm.j(&self.runtime.abort, "Abort");

        self.asm.local_label(&print_bool, "Print bool object in A0");
        let bool_attr_offset = self.attr_offset(self.model.bool_class, "__bool__");
        self.asm
            .lw(A0, A0, bool_attr_offset, "Load attribute __bool__");
        let print_false = self.labels.fresh();
        self.asm.beq(A0, Zero, &print_false, "Go to: print(False)");
        let true_str = self.pool.str_constant("True");
        self.asm.la(A0, &true_str, "String representation: True");
        self.asm.j(&print_str, "Go to: print(str)");
        self.asm
            .local_label(&print_false, "Print False object in A0");
        let false_str = self.pool.str_constant("False");
        self.asm.la(A0, &false_str, "String representation: False");
        self.asm.j(&print_str, "Go to: print(str)");

        self.asm.local_label(&print_str, "Print str object in A0");
        self.asm
            .addi(A1, A0, str_attr_offset, "Load address of attribute __str__");
        self.asm
            .j(&puts_a1, "Print the null-terminated string now in A1");

        self.asm.local_label(&print_int, "Print int object in A0");
        let int_attr_offset = self.attr_offset(self.model.int_class, "__int__");
        self.asm.lw(A1, A0, int_attr_offset, "Load attribute __int__");
        self.asm.li(A0, 1, "Code for ecall: print_int");
        self.asm.ecall("Print integer");
        self.asm.li(A1, '\n' as i32, "Load newline character");
        self.asm.li(A0, 11, "Code for ecall: print_char");
        self.asm.ecall("Print character");
        self.asm.mv(A0, Zero, "Load None");
        self.asm.j(&epilogue, "Go to return");

        self.asm
            .local_label(&puts_a1, "Print null-terminated string in A1");
        self.asm.li(A0, 4, "Code for ecall: print_string");
        self.asm.ecall("Print string");
        self.asm.li(A1, '\n' as i32, "Load newline character");
        self.asm.li(A0, 11, "Code for ecall: print_char");
        self.asm.ecall("Print character");
        self.asm.mv(A0, Zero, "Load None");

        self.asm.local_label(&epilogue, "End of function");
        self.asm.jr(Ra, "Return to caller");
    }

    /// `len(arg)`: the boxed `__len__` of a str or list; aborts
    /// otherwise. Both classes keep `__len__` at attribute index 0, so
    /// one offset serves either.
    pub(super) fn emit_len(&mut self, func: FuncId) {
        let code_label = self.model.func(func).code_label.clone();
        let word_size = self.asm.word_size();
        self.asm.global_label(&code_label);

        let illegal_arg = self.labels.fresh();
        let str_len = self.labels.fresh();
        let list_len = self.labels.fresh();

        self.asm.lw(A0, Sp, word_size, "Load arg");
        self.asm
            .beq(A0, Zero, &illegal_arg, "None is an illegal argument");
        self.asm.lw(T0, A0, 0, "Get type tag of arg");

        let str_tag = self.model.class(self.model.str_class).type_tag;
        let list_tag = self.model.class(self.model.list_class).type_tag;
        self.asm.li(T1, str_tag, "Load type tag of `str`");
        self.asm.beq(T0, T1, &str_len, "Go to len(str)");
        self.asm.li(T1, list_tag, "Load type tag for list objects");
        self.asm.beq(T0, T1, &list_len, "Go to len(list)");

        self.asm.local_label(&illegal_arg, "Invalid argument");
        self.asm
            .li(A0, ERROR_ARG, "Exit code for: Invalid argument");
        let message = self.pool.str_constant("Invalid argument");
        self.asm.la(A1, &message, "Load error message as str");
        let str_attr_offset = self.attr_offset(self.model.str_class, "__str__");
        self.asm
            .addi(A1, A1, str_attr_offset, "Load address of attribute __str__");
        self.asm.j(&self.runtime.abort, "Abort");

        self.asm.local_label(&str_len, "Get length of string");
        let str_len_offset = self.attr_offset(self.model.str_class, "__len__");
        self.asm.lw(A0, A0, str_len_offset, "Load attribute: __len__");
        self.asm.jr(Ra, "Return to caller");

        self.asm.local_label(&list_len, "Get length of list");
        let list_len_offset = self.attr_offset(self.model.list_class, "__len__");
        self.asm.lw(A0, A0, list_len_offset, "Load attribute: __len__");
        self.asm.jr(Ra, "Return to caller");
    }

    /// `input()`: unsupported; aborts with code 6.
    pub(super) fn emit_input(&mut self, func: FuncId) {
        let code_label = self.model.func(func).code_label.clone();
        self.asm.global_label(&code_label);
        self.asm
            .li(A0, ERROR_NYI, "Exit code for: Unsupported operation");
        let message = self.pool.str_constant("Unsupported operation");
        self.asm.la(A1, &message, "Load error message as str");
        let str_attr_offset = self.attr_offset(self.model.str_class, "__str__");
        self.asm
            .addi(A1, A1, str_attr_offset, "Load address of attribute __str__");
        self.asm.j(&self.runtime.abort, "Abort");
    }

    /// `alloc`: allocate an object sized exactly by its prototype.
    pub(super) fn emit_builtin_alloc(&mut self) {
        let alloc = self.runtime.alloc.clone();
        let alloc2 = self.runtime.alloc2.clone();
        let word_size = self.asm.word_size();
        self.asm.global_label(&alloc);
        // Address of prototype is already in A0.
        self.asm
            .lw(A1, A0, word_size, "Get size of object in words");
        self.asm.j(&alloc2, "Allocate object with exact size");
    }

    /// `alloc2`: bump-allocate A1 words and initialize them from the
    /// prototype at A0. The new object's size word records the
    /// requested size, so oversize allocations keep their real length.
    pub(super) fn emit_builtin_alloc_resize(&mut self) {
        let alloc2 = self.runtime.alloc2.clone();
        let word_size = self.asm.word_size();
        self.asm.global_label(&alloc2);

        let out_of_memory = self.labels.fresh();
        self.asm.li(A2, word_size, "Word size in bytes");
        self.asm
            .mul(A2, A1, A2, "Calculate number of bytes to allocate");
        self.asm.add(A2, Gp, A2, "Estimate where GP will move");
        self.asm
            .bgeu(A2, S11, &out_of_memory, "Go to OOM handler if too large");

        // Copy loop: T0 = words left, T1 = scratch, T2 = src, T3 = dest.
        self.asm
            .lw(T0, A0, word_size, "Get size of object in words");
        self.asm.mv(T2, A0, "Initialize src ptr");
        self.asm.mv(T3, Gp, "Initialize dest ptr");
        let loop_header = self.labels.fresh();
        self.asm.local_label(&loop_header, "Copy-loop header");
        self.asm.lw(T1, T2, 0, "Load next word from src");
        self.asm.sw(T1, T3, 0, "Store next word to dest");
        self.asm.addi(T2, T2, word_size, "Increment src");
        self.asm.addi(T3, T3, word_size, "Increment dest");
        self.asm.addi(T0, T0, -1, "Decrement counter");
        self.asm
            .bne(T0, Zero, &loop_header, "Loop if more words left to copy");

        self.asm.mv(A0, Gp, "Save new object's address to return");
        self.asm.sw(
            A1,
            A0,
            word_size,
            "Set size of new object in words (= requested size)",
        );
        self.asm.mv(Gp, A2, "Set next free slot in the heap");
        self.asm.jr(Ra, "Return to caller");

        self.asm.local_label(&out_of_memory, "OOM handler");
        self.asm.li(A0, ERROR_OOM, "Exit code for: Out of memory");
        let message = self.pool.str_constant("Out of memory");
        self.asm.la(A1, &message, "Load error message as str");
        let str_attr_offset = self.attr_offset(self.model.str_class, "__str__");
        self.asm
            .addi(A1, A1, str_attr_offset, "Load address of attribute __str__");
        self.asm.j(&self.runtime.abort, "Abort");
    }

    /// `abort`: print the message in A1, then exit with the code in A0.
    /// An infinite loop guards against a simulator that ignores exit.
    pub(super) fn emit_builtin_abort(&mut self) {
        let abort = self.runtime.abort.clone();
        self.asm.global_label(&abort);
        self.asm.mv(T0, A0, "Save exit code in temp");
        self.asm.li(A0, 4, "Code for ecall: print_string");
        self.asm.ecall("Print error message in A1");
        self.asm.li(A1, '\n' as i32, "Load newline character");
        self.asm.li(A0, 11, "Code for ecall: print_char");
        self.asm.ecall("Print newline");
        self.asm.mv(A1, T0, "Move exit code to A1");
        self.asm.li(A0, 17, "Code for ecall: exit2");
        self.asm.ecall("Exit with code");
        let spin = self.labels.fresh();
        self.asm.local_label(&spin, "Infinite loop");
        self.asm.j(&spin, "Prevent fallthrough");
    }

    /// `heap.init`: request A0 bytes of heap from the simulator.
    pub(super) fn emit_builtin_heap_init(&mut self) {
        let heap_init = self.runtime.heap_init.clone();
        self.asm.global_label(&heap_init);
        self.asm.mv(A1, A0, "Move requested size to A1");
        self.asm.li(A0, 9, "Code for ecall: sbrk");
        self.asm.ecall("Request A1 bytes");
        self.asm.jr(Ra, "Return to caller");
    }
}
