use std::fs;

use tracing::debug;

use super::*;
use crate::utils::resolve_path;

use super::ParamType::String as Str;

pub(super) fn specs() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec {
            name: "file",
            params: &[Str],
            variadic: None,
            filesystem: true,
            callback: file,
        },
        FunctionSpec {
            name: "env",
            params: &[Str],
            variadic: None,
            filesystem: false,
            callback: env,
        },
    ]
}

/// Contents of a file; relative paths resolve against the document's directory.
fn file(registry: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    let raw = string_arg(&args, 0);
    let path = resolve_path(raw, registry.base_dir());
    debug!(path = %path.display(), "reading file");

    fs::read_to_string(&path)
        .map(Value::String)
        .map_err(|e| EvalError::invalid("file", format!("failed to read {}: {}", path.display(), e)))
}

/// Value of an environment variable, empty when unset.
fn env(_: &FunctionRegistry, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(Value::String(
        std::env::var(string_arg(&args, 0)).unwrap_or_default(),
    ))
}
