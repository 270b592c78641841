use indexmap::IndexMap;

use super::label::Label;
use crate::ast::Literal;

/// The constant pool: interned integer, string, and boolean literals.
///
/// Interning returns the label of the constant's prototype image in the
/// data section. The two boolean constants are fixed; integers and
/// strings are added on first use. Iteration order is insertion order,
/// which keeps the emitted pool deterministic.
pub struct ConstantPool {
    ints: IndexMap<i32, Label>,
    strs: IndexMap<String, Label>,
    false_constant: Label,
    true_constant: Label,
    next_id: u32,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            ints: IndexMap::new(),
            strs: IndexMap::new(),
            false_constant: Label::named("const_false"),
            true_constant: Label::named("const_true"),
            next_id: 0,
        }
    }

    pub fn false_constant(&self) -> &Label {
        &self.false_constant
    }

    pub fn true_constant(&self) -> &Label {
        &self.true_constant
    }

    /// The label of the interned integer VALUE, inserting it if absent.
    pub fn int_constant(&mut self, value: i32) -> Label {
        if let Some(label) = self.ints.get(&value) {
            return label.clone();
        }
        let label = self.fresh();
        self.ints.insert(value, label.clone());
        label
    }

    /// The label of the interned string VALUE, inserting it if absent.
    pub fn str_constant(&mut self, value: &str) -> Label {
        if let Some(label) = self.strs.get(value) {
            return label.clone();
        }
        let label = self.fresh();
        self.strs.insert(value.to_string(), label.clone());
        label
    }

    /// Lower a literal to the label of its constant image. `None`
    /// lowers to no label (the null word).
    pub fn from_literal(&mut self, literal: &Literal) -> Option<Label> {
        match literal {
            Literal::IntegerLiteral { value } => Some(self.int_constant(*value)),
            Literal::StringLiteral { value } => Some(self.str_constant(value)),
            Literal::BooleanLiteral { value: true } => Some(self.true_constant.clone()),
            Literal::BooleanLiteral { value: false } => Some(self.false_constant.clone()),
            Literal::NoneLiteral {} => None,
        }
    }

    /// Interned integers in insertion order.
    pub fn ints(&self) -> impl Iterator<Item = (i32, &Label)> {
        self.ints.iter().map(|(v, l)| (*v, l))
    }

    /// Interned strings in insertion order.
    pub fn strs(&self) -> impl Iterator<Item = (&str, &Label)> {
        self.strs.iter().map(|(v, l)| (v.as_str(), l))
    }

    fn fresh(&mut self) -> Label {
        let label = Label::named(format!("const_{}", self.next_id));
        self.next_id += 1;
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_stable() {
        let mut pool = ConstantPool::new();
        let a = pool.int_constant(42);
        let b = pool.int_constant(7);
        let c = pool.int_constant(42);
        assert_eq!(a, c);
        assert_ne!(a, b);

        let s1 = pool.str_constant("hello");
        let s2 = pool.str_constant("hello");
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_iteration_is_insertion_order() {
        let mut pool = ConstantPool::new();
        pool.str_constant("b");
        pool.str_constant("a");
        pool.int_constant(9);
        pool.int_constant(1);
        pool.int_constant(9);
        let strs: Vec<&str> = pool.strs().map(|(v, _)| v).collect();
        let ints: Vec<i32> = pool.ints().map(|(v, _)| v).collect();
        assert_eq!(strs, ["b", "a"]);
        assert_eq!(ints, [9, 1]);
    }

    #[test]
    fn test_from_literal() {
        let mut pool = ConstantPool::new();
        let five = pool.from_literal(&Literal::IntegerLiteral { value: 5 });
        assert_eq!(five, Some(pool.int_constant(5)));

        let hello = pool.from_literal(&Literal::StringLiteral {
            value: "hello".to_string(),
        });
        assert_eq!(hello, Some(pool.str_constant("hello")));

        assert_eq!(
            pool.from_literal(&Literal::BooleanLiteral { value: true }),
            Some(pool.true_constant().clone())
        );
        assert_eq!(
            pool.from_literal(&Literal::BooleanLiteral { value: false }),
            Some(pool.false_constant().clone())
        );
        assert_eq!(pool.from_literal(&Literal::NoneLiteral {}), None);
    }

    #[test]
    fn test_bool_labels_are_fixed() {
        let pool = ConstantPool::new();
        assert_eq!(pool.false_constant().as_str(), "const_false");
        assert_eq!(pool.true_constant().as_str(), "const_true");
    }
}
