//! The typed AST consumed by the code generator.
//!
//! This is the wire format between the external parser/type-checker and
//! this crate: a JSON document of internally-tagged nodes (`"kind"`
//! discriminators). Expressions carry the checker's inferred type where
//! code generation needs it.

use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::types::ValueType;

/// A complete, type-checked program.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub statements: Vec<Stmt>,
    /// Front-end diagnostics. A program with errors is never lowered.
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
}

impl Program {
    pub fn has_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|d| d.severity == crate::diagnostic::Severity::Error)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Declaration {
    VarDef(VarDef),
    ClassDef(ClassDef),
    FuncDef(FuncDef),
    GlobalDecl(GlobalDecl),
    NonLocalDecl(NonLocalDecl),
}

/// `x: T = <literal>`: a global, local, or attribute definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VarDef {
    pub var: TypedVar,
    pub value: Literal,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypedVar {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(rename = "superClass")]
    pub super_class: String,
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<TypedVar>,
    #[serde(rename = "returnType", default)]
    pub return_type: Option<ValueType>,
    pub declarations: Vec<Declaration>,
    pub statements: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlobalDecl {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NonLocalDecl {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    ExprStmt {
        expr: Expr,
        #[serde(default)]
        span: Span,
    },
    /// `t1 = t2 = ... = value`, where targets are identifier, member,
    /// or index expressions.
    AssignStmt {
        targets: Vec<Expr>,
        value: Expr,
        #[serde(default)]
        span: Span,
    },
    IfStmt {
        condition: Expr,
        #[serde(rename = "thenBody")]
        then_body: Vec<Stmt>,
        #[serde(rename = "elseBody", default)]
        else_body: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },
    WhileStmt {
        condition: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },
    ForStmt {
        identifier: String,
        iterable: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        span: Span,
    },
    ReturnStmt {
        #[serde(default)]
        value: Option<Expr>,
        #[serde(default)]
        span: Span,
    },
}

/// A literal initializer, as allowed in variable and attribute definitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Literal {
    IntegerLiteral { value: i32 },
    StringLiteral { value: String },
    BooleanLiteral { value: bool },
    NoneLiteral {},
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Expr {
    #[serde(flatten)]
    pub kind: ExprKind,
    /// The checker's inferred type. Present on every expression of a
    /// well-typed program.
    #[serde(rename = "inferredType", default)]
    pub inferred_type: Option<ValueType>,
    #[serde(default)]
    pub span: Span,
}

impl Expr {
    /// The inferred type, which semantic analysis guarantees to exist.
    pub fn ty(&self) -> &ValueType {
        self.inferred_type
            .as_ref()
            .expect("checker annotates every expression with its inferred type")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ExprKind {
    IntegerLiteral {
        value: i32,
    },
    StringLiteral {
        value: String,
    },
    BooleanLiteral {
        value: bool,
    },
    NoneLiteral {},
    Identifier {
        name: String,
    },
    BinaryExpr {
        operator: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryExpr {
        operator: String,
        operand: Box<Expr>,
    },
    IfExpr {
        condition: Box<Expr>,
        #[serde(rename = "thenExpr")]
        then_expr: Box<Expr>,
        #[serde(rename = "elseExpr")]
        else_expr: Box<Expr>,
    },
    /// `f(args)`: the callee is an identifier naming a function or a
    /// class (constructor call).
    CallExpr {
        function: String,
        args: Vec<Expr>,
    },
    /// `obj.m(args)`, dispatched through the receiver's table.
    MethodCallExpr {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    MemberExpr {
        object: Box<Expr>,
        member: String,
    },
    IndexExpr {
        list: Box<Expr>,
        index: Box<Expr>,
    },
    ListExpr {
        elements: Vec<Expr>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_from_json() {
        let program: Program = serde_json::from_str(
            r#"{
                "declarations": [
                    {"kind": "VarDef",
                     "var": {"name": "x", "type": {"kind": "ClassType", "className": "int"}},
                     "value": {"kind": "IntegerLiteral", "value": 5}}
                ],
                "statements": []
            }"#,
        )
        .unwrap();
        assert_eq!(program.declarations.len(), 1);
        assert!(!program.has_errors());
        match &program.declarations[0] {
            Declaration::VarDef(v) => {
                assert_eq!(v.var.name, "x");
                assert!(v.var.ty.is_int());
                assert_eq!(v.value, Literal::IntegerLiteral { value: 5 });
            }
            other => panic!("expected VarDef, got {:?}", other),
        }
    }

    #[test]
    fn test_expr_with_inferred_type() {
        let e: Expr = serde_json::from_str(
            r#"{"kind": "BinaryExpr", "operator": "+",
                "left": {"kind": "IntegerLiteral", "value": 1,
                         "inferredType": {"kind": "ClassType", "className": "int"}},
                "right": {"kind": "IntegerLiteral", "value": 2,
                          "inferredType": {"kind": "ClassType", "className": "int"}},
                "inferredType": {"kind": "ClassType", "className": "int"}}"#,
        )
        .unwrap();
        assert!(e.ty().is_int());
        match e.kind {
            ExprKind::BinaryExpr { operator, left, .. } => {
                assert_eq!(operator, "+");
                assert!(left.ty().is_int());
            }
            other => panic!("expected BinaryExpr, got {:?}", other),
        }
    }

    #[test]
    fn test_stmt_tagging() {
        let s: Stmt = serde_json::from_str(
            r#"{"kind": "ReturnStmt"}"#,
        )
        .unwrap();
        assert!(matches!(s, Stmt::ReturnStmt { value: None, .. }));
    }
}
