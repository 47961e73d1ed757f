use crate::ast::{BinaryOp, Expression, UnaryOp};
use crate::error::EvalError;
use crate::value::Value;

use super::{evaluate, EvalContext};

pub(super) fn truthy(value: &Value, target: &str) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" || s == "false" => Ok(s == "true"),
        other => Err(EvalError::invalid(
            target,
            format!("condition must be a bool, got {}", other.type_name()),
        )),
    }
}

pub(super) fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!truthy(&operand, "operator !")?)),
        UnaryOp::Negate => operand
            .to_number()
            .map(|n| Value::Number(-n))
            .ok_or_else(|| {
                EvalError::invalid("operator -", format!("expected number, got {}", operand.type_name()))
            }),
    }
}

pub(super) fn binary(
    op: BinaryOp,
    lhs: &Expression,
    rhs: &Expression,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let target = format!("operator {}", op.symbol());

    // Logical operators short-circuit.
    match op {
        BinaryOp::And => {
            if !truthy(&evaluate(lhs, ctx)?, &target)? {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(truthy(&evaluate(rhs, ctx)?, &target)?));
        }
        BinaryOp::Or => {
            if truthy(&evaluate(lhs, ctx)?, &target)? {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(truthy(&evaluate(rhs, ctx)?, &target)?));
        }
        _ => {}
    }

    let left = evaluate(lhs, ctx)?;
    let right = evaluate(rhs, ctx)?;

    match op {
        BinaryOp::Eq => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => return Ok(Value::Bool(left != right)),
        _ => {}
    }

    let (a, b) = match (left.to_number(), right.to_number()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(EvalError::invalid(
                target,
                format!(
                    "expected numbers, got {} and {}",
                    left.type_name(),
                    right.type_name()
                ),
            ));
        }
    };

    let result = match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => {
            return Err(EvalError::invalid(target, "division by zero"));
        }
        BinaryOp::Div => Value::Number(a / b),
        BinaryOp::Mod => Value::Number(a % b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::LtEq => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::GtEq => Value::Bool(a >= b),
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::And | BinaryOp::Or => unreachable!(),
    };

    Ok(result)
}

pub(super) fn index(collection: &Value, key: &Value) -> Result<Value, EvalError> {
    match collection {
        Value::List(items) => {
            let i = key
                .to_number()
                .filter(|n| n.fract() == 0.0 && *n >= 0.0)
                .ok_or_else(|| {
                    EvalError::invalid("index", format!("list index must be a whole number, got {}", key))
                })? as usize;
            items.get(i).cloned().ok_or_else(|| {
                EvalError::invalid("index", format!("index {} out of range for list of length {}", i, items.len()))
            })
        }
        Value::Map(entries) => {
            let k = key.to_map_key().ok_or_else(|| {
                EvalError::invalid("index", format!("map key must be a string, got {}", key.type_name()))
            })?;
            entries
                .get(&k)
                .cloned()
                .ok_or_else(|| EvalError::invalid("index", format!("map has no key {:?}", k)))
        }
        other => Err(EvalError::invalid(
            "index",
            format!("cannot index into a {}", other.type_name()),
        )),
    }
}
