use serde::{Deserialize, Serialize};

/// A checker-inferred value type annotated on expressions.
///
/// `<None>` and `<Empty>` are the checker's special class names for the
/// type of `None` and of the empty list display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ValueType {
    ClassType {
        #[serde(rename = "className")]
        class_name: String,
    },
    ListType {
        #[serde(rename = "elementType")]
        element_type: Box<ValueType>,
    },
}

impl ValueType {
    pub fn class(name: &str) -> Self {
        ValueType::ClassType {
            class_name: name.to_string(),
        }
    }

    pub fn list(element: ValueType) -> Self {
        ValueType::ListType {
            element_type: Box::new(element),
        }
    }

    /// The class name, or `None` for list types.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            ValueType::ClassType { class_name } => Some(class_name),
            ValueType::ListType { .. } => None,
        }
    }

    pub fn is_int(&self) -> bool {
        self.class_name() == Some("int")
    }

    pub fn is_bool(&self) -> bool {
        self.class_name() == Some("bool")
    }

    pub fn is_str(&self) -> bool {
        self.class_name() == Some("str")
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ValueType::ListType { .. })
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::ClassType { class_name } => write!(f, "{}", class_name),
            ValueType::ListType { element_type } => write!(f, "[{}]", element_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(ValueType::class("int").is_int());
        assert!(ValueType::class("str").is_str());
        assert!(!ValueType::class("str").is_int());
        assert!(ValueType::list(ValueType::class("int")).is_list());
    }

    #[test]
    fn test_display() {
        let t = ValueType::list(ValueType::list(ValueType::class("bool")));
        assert_eq!(t.to_string(), "[[bool]]");
    }

    #[test]
    fn test_serde_tagging() {
        let t: ValueType =
            serde_json::from_str(r#"{"kind":"ListType","elementType":{"kind":"ClassType","className":"int"}}"#)
                .unwrap();
        assert_eq!(t, ValueType::list(ValueType::class("int")));
    }
}
