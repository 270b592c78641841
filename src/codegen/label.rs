use std::fmt;

/// An opaque symbolic address in the emitted assembly.
///
/// Labels compare by textual name. Labels derived from user-visible
/// names carry a `$` prefix so they can never collide with the
/// compiler's own labels.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    /// A label with a fixed, well-known name (runtime routines, `main`).
    pub fn named(name: impl Into<String>) -> Self {
        Label(name.into())
    }

    /// A label for a user-visible symbol, prefixed with `$`.
    pub fn user(name: &str) -> Self {
        Label(format!("${}", name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces compiler-local labels, unique for the lifetime of one
/// generator instance. All such labels have a prefix of `label_`.
#[derive(Debug, Default)]
pub struct LabelFactory {
    next_suffix: u32,
}

impl LabelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh label for jump targets inside function bodies, where the
    /// name does not matter.
    pub fn fresh(&mut self) -> Label {
        let label = Label(format!("label_{}", self.next_suffix));
        self.next_suffix += 1;
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_labels_are_prefixed() {
        assert_eq!(Label::user("f").as_str(), "$f");
        assert_eq!(Label::user("C.m").as_str(), "$C.m");
        assert_eq!(Label::named("alloc").as_str(), "alloc");
    }

    #[test]
    fn test_fresh_labels_are_unique() {
        let mut factory = LabelFactory::new();
        let a = factory.fresh();
        let b = factory.fresh();
        let c = factory.fresh();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(a.as_str(), "label_0");
        assert_eq!(c.as_str(), "label_2");
    }

    #[test]
    fn test_equality_is_textual() {
        assert_eq!(Label::named("$f"), Label::user("f"));
    }
}
