//! Data-section emission: prototype objects, dispatch tables, global
//! variable cells, and the constant pool.

use super::info::ClassId;
use super::{Generator, OBJECT_HEADER_WORDS};

impl Generator {
    /// Align the next object to the word size.
    fn align_object(&mut self) {
        let pow = self.asm.word_align();
        self.asm.align(pow);
    }

    /// The prototype image copied by the allocator: header words
    /// followed by one word per attribute initial value.
    pub(super) fn emit_prototype(&mut self, class: ClassId) {
        let info = &self.model.classes[class.0];
        let label = info.prototype_label.clone();
        let tag = info.type_tag;
        let size = info.attributes.len() as i32 + OBJECT_HEADER_WORDS;
        let dispatch = info.dispatch_table_label.clone();
        let name = info.name.clone();
        let attrs: Vec<(String, Option<super::label::Label>)> = info
            .attributes
            .iter()
            .map(|a| (a.name.clone(), a.initial_value.clone()))
            .collect();

        self.asm.global_label(&label);
        self.asm
            .word_literal(tag, &format!("Type tag for class: {}", name));
        self.asm.word_literal(size, "Object size");
        self.asm
            .word_address(dispatch.as_ref(), "Pointer to dispatch table");
        for (attr_name, initial) in &attrs {
            self.asm.word_address(
                initial.as_ref(),
                &format!("Initial value of attribute: {}", attr_name),
            );
        }
        self.align_object();
    }

    /// One word per method slot; nothing for classes with a suppressed
    /// table.
    pub(super) fn emit_dispatch_table(&mut self, class: ClassId) {
        let info = &self.model.classes[class.0];
        let label = match &info.dispatch_table_label {
            Some(label) => label.clone(),
            None => return,
        };
        let name = info.name.clone();
        let slots: Vec<(String, super::label::Label)> = info
            .methods
            .iter()
            .map(|m| (m.name.clone(), self.model.func(m.func).code_label.clone()))
            .collect();

        self.asm.global_label(&label);
        for (method_name, code_label) in &slots {
            self.asm.word_address(
                Some(code_label),
                &format!("Implementation for method: {}.{}", name, method_name),
            );
        }
    }

    /// One labelled word per global, holding the address of its initial
    /// constant (or zero for `None`).
    pub(super) fn emit_global_cells(&mut self) {
        for i in 0..self.model.globals.len() {
            let global = &self.model.globals[i];
            let label = global.label.clone();
            let initial = global.initial_value.clone();
            let name = global.name.clone();
            self.asm.global_label(&label);
            self.asm.word_address(
                initial.as_ref(),
                &format!("Initial value of global var: {}", name),
            );
        }
    }

    /// The interned constants, each a complete object image: the two
    /// booleans, then strings, then integers, in insertion order.
    pub(super) fn emit_constant_pool(&mut self) {
        let word_size = self.asm.word_size();
        let bool_tag = self.model.class(self.model.bool_class).type_tag;
        let bool_size =
            self.model.class(self.model.bool_class).attributes.len() as i32 + OBJECT_HEADER_WORDS;
        let bool_dispatch = self
            .model
            .class(self.model.bool_class)
            .dispatch_table_label
            .clone();

        for (label, value) in [
            (self.pool.false_constant().clone(), 0),
            (self.pool.true_constant().clone(), 1),
        ] {
            self.asm.global_label(&label);
            self.asm.word_literal(bool_tag, "Type tag for class: bool");
            self.asm.word_literal(bool_size, "Object size");
            self.asm
                .word_address(bool_dispatch.as_ref(), "Pointer to dispatch table");
            self.asm
                .word_literal(value, "Constant value of attribute: __bool__");
            self.align_object();
        }

        let str_tag = self.model.class(self.model.str_class).type_tag;
        let str_dispatch = self
            .model
            .class(self.model.str_class)
            .dispatch_table_label
            .clone();
        let strs: Vec<(String, super::label::Label)> = self
            .pool
            .strs()
            .map(|(v, l)| (v.to_string(), l.clone()))
            .collect();
        for (value, label) in strs {
            // Payload words cover the characters plus a null terminator.
            let char_words = value.len() as i32 / word_size + 1;
            let len_label = self.pool.int_constant(value.len() as i32);
            self.asm.global_label(&label);
            self.asm.word_literal(str_tag, "Type tag for class: str");
            self.asm
                .word_literal(OBJECT_HEADER_WORDS + 1 + char_words, "Object size");
            self.asm
                .word_address(str_dispatch.as_ref(), "Pointer to dispatch table");
            self.asm.word_address(
                Some(&len_label),
                "Constant value of attribute: __len__",
            );
            self.asm
                .string_literal(&value, "Constant value of attribute: __str__");
            self.align_object();
        }

        let int_tag = self.model.class(self.model.int_class).type_tag;
        let int_size =
            self.model.class(self.model.int_class).attributes.len() as i32 + OBJECT_HEADER_WORDS;
        let int_dispatch = self
            .model
            .class(self.model.int_class)
            .dispatch_table_label
            .clone();
        let ints: Vec<(i32, super::label::Label)> =
            self.pool.ints().map(|(v, l)| (v, l.clone())).collect();
        for (value, label) in ints {
            self.asm.global_label(&label);
            self.asm.word_literal(int_tag, "Type tag for class: int");
            self.asm.word_literal(int_size, "Object size");
            self.asm
                .word_address(int_dispatch.as_ref(), "Pointer to dispatch table");
            self.asm
                .word_literal(value, "Constant value of attribute: __int__");
            self.align_object();
        }
    }
}
