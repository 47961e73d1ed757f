use indexmap::IndexMap;
use tracing::trace;

use crate::ast::{Expression, TemplatePart};
use crate::error::EvalError;
use crate::value::Value;

mod context;
mod operators;

pub use context::EvalContext;

impl EvalContext<'_> {
    pub fn evaluate(&self, expr: &Expression) -> Result<Value, EvalError> {
        evaluate(expr, self)
    }

    /// Evaluate an attribute value, applying the pass-through policy to a bare
    /// unresolved reference: it becomes the string `${<expr>}`.
    pub fn evaluate_lenient(&self, expr: &Expression) -> Result<Value, EvalError> {
        match evaluate(expr, self) {
            Err(EvalError::UnknownVariable { .. }) if !self.unknown_is_error() => {
                Ok(Value::String(format!("${{{}}}", expr)))
            }
            other => other,
        }
    }
}

pub fn evaluate(expr: &Expression, ctx: &EvalContext) -> Result<Value, EvalError> {
    match expr {
        Expression::Literal(value) => Ok(value.clone()),
        Expression::Interpolation(parts) => evaluate_template(parts, ctx),
        Expression::Reference(path) => resolve_reference(path, ctx),
        Expression::FunctionCall { name, args } => {
            // Disabled functions fail before any argument is evaluated.
            let callable = ctx.functions().prepare(name)?;
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, ctx)?);
            }
            trace!(function = %name, args = values.len(), "calling function");
            callable.call(values)
        }
        Expression::ForExpr {
            collection,
            key_var,
            value_var,
            key_expr,
            value_expr,
            condition,
        } => {
            let collection = evaluate(collection, ctx)?;
            let elements: Vec<(Value, Value)> = match collection {
                Value::List(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (Value::Number(i as f64), v))
                    .collect(),
                Value::Map(entries) => entries
                    .into_iter()
                    .map(|(k, v)| (Value::String(k), v))
                    .collect(),
                other => {
                    return Err(EvalError::NotIterable {
                        type_name: other.type_name(),
                    });
                }
            };

            let mut list = Vec::new();
            let mut map = IndexMap::new();

            for (key, value) in elements {
                let mut scope = ctx.child();
                if let Some(k) = key_var {
                    scope.bind(k.clone(), key);
                }
                scope.bind(value_var.clone(), value);

                if let Some(cond) = condition {
                    if !operators::truthy(&evaluate(cond, &scope)?, "for condition")? {
                        continue;
                    }
                }

                let out = evaluate(value_expr, &scope)?;
                match key_expr {
                    Some(key_expr) => {
                        let key = evaluate(key_expr, &scope)?;
                        let key = key.to_map_key().ok_or_else(|| {
                            EvalError::invalid("for expression", format!("map keys must be strings, got {}", key.type_name()))
                        })?;
                        map.insert(key, out);
                    }
                    None => list.push(out),
                }
            }

            if key_expr.is_some() {
                Ok(Value::Map(map))
            } else {
                Ok(Value::List(list))
            }
        }
        Expression::ListLiteral(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(evaluate(item, ctx)?);
            }
            Ok(Value::List(values))
        }
        Expression::MapLiteral(entries) => {
            let mut map = IndexMap::new();
            for (key_expr, value_expr) in entries {
                let key = evaluate(key_expr, ctx)?;
                let key = key.to_map_key().ok_or_else(|| {
                    EvalError::invalid("map literal", format!("map keys must be strings, got {}", key.type_name()))
                })?;
                map.insert(key, evaluate(value_expr, ctx)?);
            }
            Ok(Value::Map(map))
        }
        Expression::Index { collection, key } => {
            let collection = evaluate(collection, ctx)?;
            let key = evaluate(key, ctx)?;
            operators::index(&collection, &key)
        }
        Expression::Unary { op, operand } => {
            let operand = evaluate(operand, ctx)?;
            operators::unary(*op, operand)
        }
        Expression::Binary { op, lhs, rhs } => operators::binary(*op, lhs, rhs, ctx),
        Expression::Conditional {
            condition,
            then_expr,
            else_expr,
        } => {
            if operators::truthy(&evaluate(condition, ctx)?, "conditional")? {
                evaluate(then_expr, ctx)
            } else {
                evaluate(else_expr, ctx)
            }
        }
    }
}

fn resolve_reference(path: &[String], ctx: &EvalContext) -> Result<Value, EvalError> {
    let unknown = || EvalError::UnknownVariable {
        path: path.join("."),
    };

    let (first, rest) = path.split_first().ok_or_else(unknown)?;
    let mut current = ctx.lookup(first).ok_or_else(unknown)?;

    for segment in rest {
        current = match current {
            Value::Map(entries) => entries.get(segment.as_str()).ok_or_else(unknown)?,
            Value::List(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .ok_or_else(unknown)?,
            _ => return Err(unknown()),
        };
    }

    Ok(current.clone())
}

fn evaluate_template(parts: &[TemplatePart], ctx: &EvalContext) -> Result<Value, EvalError> {
    let mut out = String::new();

    for part in parts {
        match part {
            TemplatePart::Literal(text) => out.push_str(text),
            TemplatePart::Interpolation { expr, source } => match evaluate(expr, ctx) {
                Ok(value) => {
                    let text = value.to_template_string().ok_or_else(|| {
                        EvalError::invalid(
                            "template",
                            format!("cannot interpolate a {} value into {}", value.type_name(), source),
                        )
                    })?;
                    out.push_str(&text);
                }
                Err(EvalError::UnknownVariable { .. }) if !ctx.unknown_is_error() => {
                    out.push_str(source);
                }
                Err(e) => return Err(e),
            },
        }
    }

    Ok(Value::String(out))
}
