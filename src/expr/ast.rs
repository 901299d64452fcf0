use serde_json::Value;

/// The abstract syntax tree of a parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Property access rooted at a context identifier, e.g.
    /// `stepOutputs.check.ok` or `workflowInput["user name"]`.
    Path {
        root: String,
        segments: Vec<PathSegment>,
    },
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// One step of a property path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Binary operators, in the grammar's precedence groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    /// `==` with number↔string and bool↔string coercion.
    Eq,
    /// `===`, same-type comparison (int/float unify numerically).
    StrictEq,
    NotEq,
    StrictNotEq,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}
