//! Boolean/value expression language for edge conditions and
//! prompt/query rendering.
//!
//! The grammar is deliberately narrow: comparisons, boolean connectives,
//! property access rooted at `workflowInput` / `stepOutputs`, literals, and
//! parentheses. Expressions are statically parsed into an AST and evaluated
//! by a tree-walking interpreter with no access to ambient scope, I/O, or
//! loops. Gating callers treat any parse or evaluation error as "condition
//! not satisfied" (fail closed).

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr, PathSegment};
pub use eval::{evaluate, EvalContext};
pub use parser::parse;

use serde_json::Value;
use thiserror::Error;

/// Expression errors
#[derive(Debug, Error)]
pub enum ExprError {
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),
    #[error("Type error: {0}")]
    TypeError(String),
    #[error("Expression did not evaluate to a boolean: got {0}")]
    NotABoolean(String),
}

/// Parse and evaluate a condition expression, requiring a boolean result.
pub fn evaluate_condition(source: &str, ctx: &EvalContext<'_>) -> Result<bool, ExprError> {
    let expr = parse(source)?;
    match evaluate(&expr, ctx)? {
        Value::Bool(b) => Ok(b),
        other => Err(ExprError::NotABoolean(other.to_string())),
    }
}

/// Parse and evaluate an expression to a value (for prompt/query rendering).
pub fn render_value(source: &str, ctx: &EvalContext<'_>) -> Result<Value, ExprError> {
    let expr = parse(source)?;
    evaluate(&expr, ctx)
}

/// Evaluate an expression and render the result as display text: strings
/// unquoted, null empty, everything else in JSON form.
pub fn render_string(source: &str, ctx: &EvalContext<'_>) -> Result<String, ExprError> {
    Ok(match render_value(source, ctx)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
