//! Tree-walking interpreter over `serde_json::Value`.
//!
//! Missing properties resolve to null rather than erroring; type mismatches
//! and unknown root identifiers are errors, which gating callers turn into
//! "not satisfied".

use std::collections::HashMap;

use serde_json::Value;

use super::ast::{BinaryOp, Expr, PathSegment};
use super::ExprError;

/// Read-only evaluation context: the run's input plus the latest output of
/// every completed step.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub workflow_input: &'a Value,
    pub step_outputs: &'a HashMap<String, Value>,
}

pub fn evaluate(expr: &Expr, ctx: &EvalContext<'_>) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path { root, segments } => resolve_path(root, segments, ctx),
        Expr::Not(inner) => match evaluate(inner, ctx)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(ExprError::TypeError(format!(
                "'!' requires a boolean, got {}",
                type_name(&other)
            ))),
        },
        Expr::Binary { op, left, right } => match op {
            BinaryOp::And => {
                // short-circuit
                if !expect_bool(evaluate(left, ctx)?, "&&")? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(expect_bool(evaluate(right, ctx)?, "&&")?))
            }
            BinaryOp::Or => {
                if expect_bool(evaluate(left, ctx)?, "||")? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(expect_bool(evaluate(right, ctx)?, "||")?))
            }
            _ => {
                let lhs = evaluate(left, ctx)?;
                let rhs = evaluate(right, ctx)?;
                apply_comparison(*op, &lhs, &rhs)
            }
        },
    }
}

fn resolve_path(
    root: &str,
    segments: &[PathSegment],
    ctx: &EvalContext<'_>,
) -> Result<Value, ExprError> {
    let base = match root {
        "workflowInput" => ctx.workflow_input.clone(),
        "stepOutputs" => match segments.first() {
            Some(PathSegment::Key(step_id)) => {
                let value = ctx.step_outputs.get(step_id).cloned().unwrap_or(Value::Null);
                return Ok(walk(value, &segments[1..]));
            }
            Some(PathSegment::Index(_)) => {
                return Err(ExprError::TypeError(
                    "stepOutputs is keyed by step id, not index".into(),
                ));
            }
            None => {
                let map: serde_json::Map<String, Value> = ctx
                    .step_outputs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                return Ok(Value::Object(map));
            }
        },
        other => return Err(ExprError::UnknownIdentifier(other.to_string())),
    };
    Ok(walk(base, segments))
}

fn walk(mut value: Value, segments: &[PathSegment]) -> Value {
    for segment in segments {
        value = match (&value, segment) {
            (Value::Object(map), PathSegment::Key(key)) => {
                map.get(key).cloned().unwrap_or(Value::Null)
            }
            (Value::Array(items), PathSegment::Index(i)) => {
                items.get(*i).cloned().unwrap_or(Value::Null)
            }
            _ => Value::Null,
        };
    }
    value
}

fn expect_bool(value: Value, op: &str) -> Result<bool, ExprError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(ExprError::TypeError(format!(
            "'{}' requires booleans, got {}",
            op,
            type_name(&other)
        ))),
    }
}

fn apply_comparison(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, ExprError> {
    let result = match op {
        BinaryOp::Eq => loose_eq(lhs, rhs),
        BinaryOp::NotEq => !loose_eq(lhs, rhs),
        BinaryOp::StrictEq => strict_eq(lhs, rhs),
        BinaryOp::StrictNotEq => !strict_eq(lhs, rhs),
        BinaryOp::LessThan => numeric_cmp(lhs, rhs, op)? < 0.0,
        BinaryOp::LessOrEqual => numeric_cmp(lhs, rhs, op)? <= 0.0,
        BinaryOp::GreaterThan => numeric_cmp(lhs, rhs, op)? > 0.0,
        BinaryOp::GreaterOrEqual => numeric_cmp(lhs, rhs, op)? >= 0.0,
        BinaryOp::And | BinaryOp::Or => unreachable!("handled by evaluate"),
    };
    Ok(Value::Bool(result))
}

/// Same-type equality; integer and float compare numerically.
fn strict_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

/// Equality with number↔string and bool↔string coercion.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    if strict_eq(lhs, rhs) {
        return true;
    }
    match (lhs, rhs) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s.parse::<f64>().ok() == n.as_f64()
        }
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            match s.to_lowercase().as_str() {
                "true" => *b,
                "false" => !*b,
                _ => false,
            }
        }
        _ => false,
    }
}

fn numeric_cmp(lhs: &Value, rhs: &Value, op: BinaryOp) -> Result<f64, ExprError> {
    match (as_numeric(lhs), as_numeric(rhs)) {
        (Some(a), Some(b)) => Ok(a - b),
        _ => Err(ExprError::TypeError(format!(
            "{:?} requires numeric operands, got {} and {}",
            op,
            type_name(lhs),
            type_name(rhs)
        ))),
    }
}

fn as_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::super::{evaluate_condition, render_string, render_value};
    use super::*;
    use serde_json::json;

    fn outputs(pairs: Vec<(&str, Value)>) -> HashMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_strict_eq_on_step_output() {
        let input = json!({});
        let outs = outputs(vec![("check", json!({"ok": true}))]);
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        assert!(evaluate_condition("stepOutputs.check.ok === true", &ctx).unwrap());
        assert!(!evaluate_condition("stepOutputs.check.ok === false", &ctx).unwrap());
    }

    #[test]
    fn test_missing_path_is_null() {
        let input = json!({});
        let outs = HashMap::new();
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        assert_eq!(
            render_value("stepOutputs.nope.deep.path", &ctx).unwrap(),
            Value::Null
        );
        assert!(evaluate_condition("stepOutputs.nope.ok === null", &ctx).unwrap());
        // null === true is simply false, not an error
        assert!(!evaluate_condition("stepOutputs.nope.ok === true", &ctx).unwrap());
    }

    #[test]
    fn test_loose_coercion() {
        let input = json!({"n": "42", "flag": "true"});
        let outs = HashMap::new();
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        assert!(evaluate_condition("workflowInput.n == 42", &ctx).unwrap());
        assert!(!evaluate_condition("workflowInput.n === 42", &ctx).unwrap());
        assert!(evaluate_condition("workflowInput.flag == true", &ctx).unwrap());
    }

    #[test]
    fn test_int_float_strict_eq() {
        let input = json!({"a": 1, "b": 1.0});
        let outs = HashMap::new();
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        assert!(evaluate_condition("workflowInput.a === workflowInput.b", &ctx).unwrap());
    }

    #[test]
    fn test_relational() {
        let input = json!({"count": 7, "label": "9"});
        let outs = HashMap::new();
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        assert!(evaluate_condition("workflowInput.count > 5", &ctx).unwrap());
        assert!(evaluate_condition("workflowInput.count <= 7", &ctx).unwrap());
        // numeric strings coerce in relational comparisons
        assert!(evaluate_condition("workflowInput.label >= 9", &ctx).unwrap());
    }

    #[test]
    fn test_relational_on_non_numeric_errors() {
        let input = json!({"tag": "abc"});
        let outs = HashMap::new();
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        assert!(evaluate_condition("workflowInput.tag > 3", &ctx).is_err());
    }

    #[test]
    fn test_logical_short_circuit() {
        let input = json!({"a": true});
        let outs = HashMap::new();
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        // rhs would be a type error, but '||' short-circuits on true
        assert!(evaluate_condition("workflowInput.a || workflowInput.missing", &ctx).unwrap());
        assert!(!evaluate_condition("!workflowInput.a && workflowInput.missing", &ctx).unwrap());
    }

    #[test]
    fn test_non_boolean_condition_errors() {
        let input = json!({"n": 3});
        let outs = HashMap::new();
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        assert!(matches!(
            evaluate_condition("workflowInput.n", &ctx),
            Err(ExprError::NotABoolean(_))
        ));
    }

    #[test]
    fn test_unknown_root_errors() {
        let input = json!({});
        let outs = HashMap::new();
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        assert!(matches!(
            evaluate_condition("context.a == 1", &ctx),
            Err(ExprError::UnknownIdentifier(_))
        ));
    }

    #[test]
    fn test_render_string() {
        let input = json!({"who": "world", "n": 4});
        let outs = outputs(vec![("greet", json!({"text": "hello"}))]);
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        assert_eq!(render_string("stepOutputs.greet.text", &ctx).unwrap(), "hello");
        assert_eq!(render_string("workflowInput.n", &ctx).unwrap(), "4");
        assert_eq!(render_string("workflowInput.missing", &ctx).unwrap(), "");
    }

    #[test]
    fn test_bracket_and_index_access() {
        let input = json!({"items": ["x", "y"], "user name": "ada"});
        let outs = HashMap::new();
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        assert!(evaluate_condition("workflowInput.items[1] === \"y\"", &ctx).unwrap());
        assert!(evaluate_condition("workflowInput[\"user name\"] === 'ada'", &ctx).unwrap());
    }

    #[test]
    fn test_whole_step_outputs_object() {
        let input = json!({});
        let outs = outputs(vec![("a", json!(1))]);
        let ctx = EvalContext {
            workflow_input: &input,
            step_outputs: &outs,
        };
        let v = render_value("stepOutputs", &ctx).unwrap();
        assert_eq!(v, json!({"a": 1}));
    }
}
