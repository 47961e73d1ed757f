use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{Attribute, Block, Body, BodyItem, Expression, TemplatePart};
use crate::error::{DecodeError, EvalError, JobspecError};
use crate::eval::EvalContext;
use crate::value::Value;

const DYNAMIC: &str = "dynamic";

/// Replace every `dynamic "<type>"` block in `body` with the concrete blocks
/// it generates.
///
/// Ordinary blocks are copied with their own bodies expanded. The output
/// contains no `dynamic` blocks, so expanding it again returns it unchanged.
pub fn expand(file: &str, body: &Body, ctx: &EvalContext) -> Result<Body, JobspecError> {
    let mut items = Vec::with_capacity(body.items.len());

    for item in &body.items {
        match item {
            BodyItem::Attribute(attr) => items.push(BodyItem::Attribute(attr.clone())),
            BodyItem::Block(block) if block.block_type == DYNAMIC => {
                for generated in expand_dynamic(file, block, ctx)? {
                    items.push(BodyItem::Block(generated));
                }
            }
            BodyItem::Block(block) => {
                items.push(BodyItem::Block(Block {
                    block_type: block.block_type.clone(),
                    labels: block.labels.clone(),
                    body: expand(file, &block.body, ctx)?,
                    line: block.line,
                }));
            }
        }
    }

    Ok(Body { items })
}

/// The pieces of one `dynamic` block, validated.
struct DynamicSpec<'a> {
    block_type: &'a str,
    iterator: String,
    for_each: &'a Attribute,
    labels: Option<&'a Attribute>,
    content: &'a Block,
}

fn parse_dynamic<'a>(file: &str, block: &'a Block) -> Result<DynamicSpec<'a>, JobspecError> {
    let decode_err = |line: usize, e: DecodeError| JobspecError::decode(file, line, e);

    let block_type = match block.labels.as_slice() {
        [label] => label.as_str(),
        other => {
            return Err(decode_err(
                block.line,
                DecodeError::InvalidLabels {
                    block_type: DYNAMIC.into(),
                    expected: 1,
                    found: other.len(),
                },
            ));
        }
    };
    // expansion output never contains dynamic blocks
    if block_type == DYNAMIC {
        return Err(decode_err(
            block.line,
            DecodeError::UnsupportedField {
                block: DYNAMIC.into(),
                kind: "block type",
                name: block_type.to_string(),
            },
        ));
    }
    let context = format!("dynamic \"{}\"", block_type);

    let mut for_each = None;
    let mut iterator = None;
    let mut labels = None;
    for attr in block.body.attributes() {
        match attr.name.as_str() {
            "for_each" => for_each = Some(attr),
            "iterator" => iterator = Some(attr),
            "labels" => labels = Some(attr),
            other => {
                return Err(decode_err(
                    attr.line,
                    DecodeError::UnsupportedField {
                        block: context,
                        kind: "attribute",
                        name: other.to_string(),
                    },
                ));
            }
        }
    }

    let mut content = None;
    for nested in block.body.blocks() {
        if nested.block_type != "content" || content.is_some() {
            return Err(decode_err(
                nested.line,
                DecodeError::UnsupportedField {
                    block: context,
                    kind: "block",
                    name: nested.block_type.clone(),
                },
            ));
        }
        content = Some(nested);
    }

    let missing = |field: &str| {
        decode_err(
            block.line,
            DecodeError::MissingField {
                block: context.clone(),
                field: field.into(),
            },
        )
    };
    let for_each = for_each.ok_or_else(|| missing("for_each"))?;
    let content = content.ok_or_else(|| missing("content"))?;

    let iterator = match iterator {
        None => block_type.to_string(),
        Some(attr) => match &attr.expr {
            Expression::Reference(path) if path.len() == 1 => path[0].clone(),
            _ => {
                return Err(decode_err(
                    attr.line,
                    DecodeError::TypeMismatch {
                        field: "iterator".into(),
                        expected: "a bare identifier",
                        found: "expression",
                    },
                ));
            }
        },
    };

    Ok(DynamicSpec {
        block_type,
        iterator,
        for_each,
        labels,
        content,
    })
}

fn expand_dynamic(file: &str, block: &Block, ctx: &EvalContext) -> Result<Vec<Block>, JobspecError> {
    let spec = parse_dynamic(file, block)?;
    let eval_err = |line: usize, e: EvalError| JobspecError::eval(file, line, e);

    let collection = ctx
        .evaluate(&spec.for_each.expr)
        .map_err(|e| eval_err(spec.for_each.line, e))?;
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
            return Err(eval_err(
                spec.for_each.line,
                EvalError::NotIterable {
                    type_name: other.type_name(),
                },
            ));
        }
    };

    let mut blocks = Vec::with_capacity(elements.len());
    for (key, value) in elements {
        let mut current = IndexMap::new();
        current.insert("key".to_string(), key);
        current.insert("value".to_string(), value);
        let current = Value::Map(current);

        let mut scope = ctx.child();
        scope.bind(spec.iterator.clone(), current.clone());

        let labels = match spec.labels {
            Some(attr) => evaluate_labels(file, attr, &scope)?,
            None => Vec::new(),
        };

        let body = substitute_body(&spec.content.body, &spec.iterator, &current);
        blocks.push(Block {
            block_type: spec.block_type.to_string(),
            labels,
            body: expand(file, &body, &scope)?,
            line: spec.content.line,
        });
    }

    debug!(
        block_type = spec.block_type,
        iterator = %spec.iterator,
        generated = blocks.len(),
        "expanded dynamic block"
    );
    Ok(blocks)
}

fn evaluate_labels(file: &str, attr: &Attribute, scope: &EvalContext) -> Result<Vec<String>, JobspecError> {
    let mismatch = |found: &'static str| {
        JobspecError::decode(
            file,
            attr.line,
            DecodeError::TypeMismatch {
                field: "labels".into(),
                expected: "list of strings",
                found,
            },
        )
    };

    let value = scope
        .evaluate(&attr.expr)
        .map_err(|e| JobspecError::eval(file, attr.line, e))?;
    let found = value.type_name();
    let Value::List(items) = value else {
        return Err(mismatch(found));
    };

    items
        .iter()
        .map(|item| item.to_template_string().ok_or_else(|| mismatch(item.type_name())))
        .collect()
}

/// Copy `body`, inlining references to the iterator `name` as literals.
///
/// A nested `dynamic` block that reuses the same iterator name shadows it:
/// only its `for_each` still sees the outer value.
fn substitute_body(body: &Body, name: &str, value: &Value) -> Body {
    let items = body
        .items
        .iter()
        .map(|item| match item {
            BodyItem::Attribute(attr) => BodyItem::Attribute(substitute_attr(attr, name, value)),
            BodyItem::Block(block) => {
                let shadowed = block.block_type == DYNAMIC && iterator_name(block) == Some(name);
                let body = if shadowed {
                    Body {
                        items: block
                            .body
                            .items
                            .iter()
                            .map(|inner| match inner {
                                BodyItem::Attribute(attr) if attr.name == "for_each" => {
                                    BodyItem::Attribute(substitute_attr(attr, name, value))
                                }
                                other => other.clone(),
                            })
                            .collect(),
                    }
                } else {
                    substitute_body(&block.body, name, value)
                };
                BodyItem::Block(Block {
                    block_type: block.block_type.clone(),
                    labels: block.labels.clone(),
                    body,
                    line: block.line,
                })
            }
        })
        .collect();

    Body { items }
}

/// Iterator name a `dynamic` block binds, defaulting to its label.
fn iterator_name(block: &Block) -> Option<&str> {
    match block.body.attribute("iterator").map(|a| &a.expr) {
        Some(Expression::Reference(path)) if path.len() == 1 => Some(path[0].as_str()),
        Some(_) => None,
        None => block.labels.first().map(String::as_str),
    }
}

fn substitute_attr(attr: &Attribute, name: &str, value: &Value) -> Attribute {
    Attribute {
        name: attr.name.clone(),
        expr: substitute(&attr.expr, name, value),
        line: attr.line,
    }
}

fn substitute(expr: &Expression, name: &str, value: &Value) -> Expression {
    let sub = |e: &Expression| Box::new(substitute(e, name, value));

    match expr {
        Expression::Literal(_) => expr.clone(),
        Expression::Reference(path) => match path.split_first() {
            Some((first, rest)) if first == name => match select(value, rest) {
                Some(found) => Expression::Literal(found.clone()),
                None => expr.clone(),
            },
            _ => expr.clone(),
        },
        Expression::Interpolation(parts) => Expression::Interpolation(
            parts
                .iter()
                .map(|part| match part {
                    TemplatePart::Literal(_) => part.clone(),
                    TemplatePart::Interpolation { expr, source } => TemplatePart::Interpolation {
                        expr: substitute(expr, name, value),
                        source: source.clone(),
                    },
                })
                .collect(),
        ),
        Expression::FunctionCall { name: func, args } => Expression::FunctionCall {
            name: func.clone(),
            args: args.iter().map(|a| substitute(a, name, value)).collect(),
        },
        Expression::ForExpr {
            collection,
            key_var,
            value_var,
            key_expr,
            value_expr,
            condition,
        } => {
            let shadowed = value_var == name || key_var.as_deref() == Some(name);
            let inner = |e: &Expression| {
                if shadowed {
                    Box::new(e.clone())
                } else {
                    sub(e)
                }
            };
            Expression::ForExpr {
                collection: sub(collection),
                key_var: key_var.clone(),
                value_var: value_var.clone(),
                key_expr: key_expr.as_deref().map(&inner),
                value_expr: inner(value_expr),
                condition: condition.as_deref().map(&inner),
            }
        }
        Expression::ListLiteral(items) => {
            Expression::ListLiteral(items.iter().map(|i| substitute(i, name, value)).collect())
        }
        Expression::MapLiteral(entries) => Expression::MapLiteral(
            entries
                .iter()
                .map(|(k, v)| (substitute(k, name, value), substitute(v, name, value)))
                .collect(),
        ),
        Expression::Index { collection, key } => Expression::Index {
            collection: sub(collection),
            key: sub(key),
        },
        Expression::Unary { op, operand } => Expression::Unary {
            op: *op,
            operand: sub(operand),
        },
        Expression::Binary { op, lhs, rhs } => Expression::Binary {
            op: *op,
            lhs: sub(lhs),
            rhs: sub(rhs),
        },
        Expression::Conditional {
            condition,
            then_expr,
            else_expr,
        } => Expression::Conditional {
            condition: sub(condition),
            then_expr: sub(then_expr),
            else_expr: sub(else_expr),
        },
    }
}

fn select<'v>(value: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, segment| match current {
        Value::Map(entries) => entries.get(segment.as_str()),
        Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests;
