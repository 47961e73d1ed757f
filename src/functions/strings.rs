use regex::Regex;

use super::*;

use super::ParamType::{Any, List, Number, String as Str};

pub(super) fn specs() -> Vec<FunctionSpec> {
    vec![
        spec("upper", &[Str], None, upper),
        spec("lower", &[Str], None, lower),
        spec("title", &[Str], None, title),
        spec("trimspace", &[Str], None, trimspace),
        spec("trim", &[Str, Str], None, trim),
        spec("trimprefix", &[Str, Str], None, trimprefix),
        spec("trimsuffix", &[Str, Str], None, trimsuffix),
        spec("replace", &[Str, Str, Str], None, replace),
        spec("regex", &[Str, Str], None, regex_first),
        spec("format", &[Str], Some(Any), format),
        spec("split", &[Str, Str], None, split),
        spec("join", &[Str, List], None, join),
        spec("tostring", &[Str], None, tostring),
        spec("tonumber", &[Number], None, tonumber),
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

fn upper(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(Value::String(string_arg(&args, 0).to_uppercase()))
}

fn lower(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(Value::String(string_arg(&args, 0).to_lowercase()))
}

/// Uppercase the first letter of every word.
fn title(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let mut out = String::new();
    let mut at_word_start = true;
    for ch in string_arg(&args, 0).chars() {
        if at_word_start && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !ch.is_alphanumeric();
    }
    Ok(Value::String(out))
}

fn trimspace(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(Value::String(string_arg(&args, 0).trim().to_string()))
}

fn trim(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let cutset: Vec<char> = string_arg(&args, 1).chars().collect();
    Ok(Value::String(
        string_arg(&args, 0).trim_matches(cutset.as_slice()).to_string(),
    ))
}

fn trimprefix(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let s = string_arg(&args, 0);
    Ok(Value::String(
        s.strip_prefix(string_arg(&args, 1)).unwrap_or(s).to_string(),
    ))
}

fn trimsuffix(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let s = string_arg(&args, 0);
    Ok(Value::String(
        s.strip_suffix(string_arg(&args, 1)).unwrap_or(s).to_string(),
    ))
}

/// `replace(string, search, replacement)`; a search wrapped in slashes is a regex.
fn replace(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let s = string_arg(&args, 0);
    let search = string_arg(&args, 1);
    let replacement = string_arg(&args, 2);

    if search.len() > 1 && search.starts_with('/') && search.ends_with('/') {
        let re = compile("replace", &search[1..search.len() - 1])?;
        return Ok(Value::String(re.replace_all(s, replacement).into_owned()));
    }
    Ok(Value::String(s.replace(search, replacement)))
}

/// First match of `pattern`; a list of captures when the pattern has groups.
fn regex_first(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let re = compile("regex", string_arg(&args, 0))?;
    let s = string_arg(&args, 1);

    let caps = re
        .captures(s)
        .ok_or_else(|| EvalError::invalid("regex", "pattern did not match"))?;

    if caps.len() == 1 {
        return Ok(Value::String(caps[0].to_string()));
    }
    Ok(Value::List(
        caps.iter()
            .skip(1)
            .map(|m| m.map_or(Value::Null, |m| Value::String(m.as_str().to_string())))
            .collect(),
    ))
}

fn compile(target: &str, pattern: &str) -> Result<Regex, EvalError> {
    Regex::new(pattern).map_err(|e| EvalError::invalid(target, format!("invalid pattern: {}", e)))
}

/// Printf-style formatting supporting `%s`, `%d`, `%v` and `%%`.
fn format(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let fmt = string_arg(&args, 0);
    let mut rest = args.iter().skip(1);
    let mut out = String::new();
    let mut chars = fmt.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        let verb = chars
            .next()
            .ok_or_else(|| EvalError::invalid("format", "format string ends with '%'"))?;
        if verb == '%' {
            out.push('%');
            continue;
        }

        let arg = rest
            .next()
            .ok_or_else(|| EvalError::invalid("format", format!("not enough arguments for %{}", verb)))?;
        let text = match verb {
            's' | 'v' => arg.to_template_string().unwrap_or_else(|| arg.to_string()),
            'd' => {
                let n = arg
                    .to_number()
                    .ok_or_else(|| EvalError::invalid("format", format!("%d requires a number, got {}", arg.type_name())))?;
                format!("{}", n.trunc() as i64)
            }
            other => {
                return Err(EvalError::invalid("format", format!("unsupported verb %{}", other)));
            }
        };
        out.push_str(&text);
    }

    if rest.next().is_some() {
        return Err(EvalError::invalid("format", "too many arguments"));
    }
    Ok(Value::String(out))
}

/// `split(separator, string)`
fn split(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let sep = string_arg(&args, 0);
    let s = string_arg(&args, 1);
    if s.is_empty() {
        return Ok(Value::List(vec![Value::String(String::new())]));
    }
    if sep.is_empty() {
        return Ok(Value::List(s.chars().map(|c| Value::String(c.to_string())).collect()));
    }
    Ok(Value::List(
        s.split(sep).map(|part| Value::String(part.to_string())).collect(),
    ))
}

/// `join(separator, list)`
fn join(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let sep = string_arg(&args, 0);
    let mut parts = Vec::new();
    for item in list_arg(&args, 1) {
        let text = item.to_template_string().ok_or_else(|| {
            EvalError::invalid("join", format!("list elements must be strings, got {}", item.type_name()))
        })?;
        parts.push(text);
    }
    Ok(Value::String(parts.join(sep)))
}

fn tostring(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(Value::String(string_arg(&args, 0).to_string()))
}

fn tonumber(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(Value::Number(number_arg(&args, 0)))
}
