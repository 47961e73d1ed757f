use super::*;

use super::ParamType::{Any, Bool, Collection, List, Map, Number, String as Str};

pub(super) fn specs() -> Vec<FunctionSpec> {
    vec![
        spec("concat", &[], Some(List), concat),
        spec("length", &[Collection], None, length),
        spec("contains", &[List, Any], None, contains),
        spec("keys", &[Map], None, keys),
        spec("values", &[Map], None, values),
        spec("merge", &[], Some(Map), merge),
        spec("lookup", &[Map, Str], Some(Any), lookup),
        spec("coalesce", &[], Some(Any), coalesce),
        spec("distinct", &[List], None, distinct),
        spec("reverse", &[List], None, reverse),
        spec("range", &[Number], Some(Number), range),
        spec("tobool", &[Bool], None, tobool),
    ]
}

fn spec(
    name: &'static str,
    params: &'static [ParamType],
    variadic: Option<ParamType>,
    callback: Callback,
) -> FunctionSpec {
    FunctionSpec {
        name,
        params,
        variadic,
        filesystem: false,
        callback,
    }
}

fn concat(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let mut out = Vec::new();
    for list in args {
        if let Value::List(items) = list {
            out.extend(items);
        }
    }
    Ok(Value::List(out))
}

fn length(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let len = match args.first() {
        Some(Value::List(items)) => items.len(),
        Some(Value::Map(entries)) => entries.len(),
        Some(Value::String(s)) => s.chars().count(),
        _ => 0,
    };
    Ok(Value::Number(len as f64))
}

fn contains(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let needle = args.get(1).unwrap_or(&Value::Null);
    Ok(Value::Bool(list_arg(&args, 0).contains(needle)))
}

fn keys(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let keys = args
        .first()
        .and_then(Value::as_map)
        .map(|m| m.keys().map(|k| Value::String(k.clone())).collect())
        .unwrap_or_default();
    Ok(Value::List(keys))
}

fn values(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let values = args
        .first()
        .and_then(Value::as_map)
        .map(|m| m.values().cloned().collect())
        .unwrap_or_default();
    Ok(Value::List(values))
}

/// Later maps win on key conflicts.
fn merge(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let mut out = IndexMap::new();
    for map in args {
        if let Value::Map(entries) = map {
            out.extend(entries);
        }
    }
    Ok(Value::Map(out))
}

/// `lookup(map, key, [default])`
fn lookup(_: &FunctionRegistry, mut args: Vec<Value>) -> Result<Value, EvalError> {
    if args.len() > 3 {
        return Err(EvalError::invalid("lookup", "expected at most 3 arguments"));
    }
    let default = if args.len() == 3 { args.pop() } else { None };
    let key = string_arg(&args, 1);

    if let Some(found) = args.first().and_then(Value::as_map).and_then(|m| m.get(key)) {
        return Ok(found.clone());
    }
    default.ok_or_else(|| EvalError::invalid("lookup", format!("map has no key {:?} and no default was given", key)))
}

/// First argument that is neither null nor an empty string.
fn coalesce(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    args.into_iter()
        .find(|v| !v.is_null() && v.as_str() != Some(""))
        .ok_or_else(|| EvalError::invalid("coalesce", "no non-null, non-empty argument"))
}

fn distinct(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let mut out: Vec<Value> = Vec::new();
    for item in list_arg(&args, 0) {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    Ok(Value::List(out))
}

fn reverse(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(Value::List(list_arg(&args, 0).iter().rev().cloned().collect()))
}

/// `range(limit)`, `range(start, limit)` or `range(start, limit, step)`
fn range(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let (start, limit, step) = match args.len() {
        1 => (0.0, number_arg(&args, 0), 1.0),
        2 => (number_arg(&args, 0), number_arg(&args, 1), 1.0),
        3 => (number_arg(&args, 0), number_arg(&args, 1), number_arg(&args, 2)),
        n => {
            return Err(EvalError::invalid("range", format!("expected 1 to 3 arguments, got {}", n)));
        }
    };
    if step == 0.0 {
        return Err(EvalError::invalid("range", "step must not be zero"));
    }

    let mut out = Vec::new();
    let mut current = start;
    while (step > 0.0 && current < limit) || (step < 0.0 && current > limit) {
        out.push(Value::Number(current));
        current += step;
        if out.len() > 1024 {
            return Err(EvalError::invalid("range", "more than 1024 elements"));
        }
    }
    Ok(Value::List(out))
}

fn tobool(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(args.into_iter().next().unwrap_or(Value::Bool(false)))
}
