// Author: Dustin Pilgrim
// License: MIT

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::error::EvalError;
use crate::value::Value;

mod collections;
mod io;
mod strings;

/// Argument type a builtin declares for each parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Bool,
    List,
    Map,
    /// List, map or string; anything with a length.
    Collection,
    Any,
}

pub type Callback = fn(&FunctionRegistry, Vec<Value>) -> Result<Value, EvalError>;

pub struct FunctionSpec {
    pub name: &'static str,
    pub params: &'static [ParamType],
    /// Type of any further arguments after `params`.
    pub variadic: Option<ParamType>,
    /// Reads the filesystem; unavailable unless the registry allows it.
    pub filesystem: bool,
    pub callback: Callback,
}

/// A function resolved and authorized for a call.
pub struct Callable<'r> {
    spec: &'static FunctionSpec,
    registry: &'r FunctionRegistry,
}

/// Catalog of builtin functions for one parse.
///
/// The catalog itself is fixed; a registry only decides whether filesystem
/// functions may run and where relative paths resolve. It never changes
/// after construction.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    filesystem_enabled: bool,
    base_dir: PathBuf,
}

static BUILTINS: Lazy<IndexMap<&'static str, FunctionSpec>> = Lazy::new(|| {
    let mut table = IndexMap::new();
    for spec in strings::specs()
        .into_iter()
        .chain(collections::specs())
        .chain(io::specs())
    {
        table.insert(spec.name, spec);
    }
    table
});

impl FunctionRegistry {
    pub fn new(filesystem_enabled: bool) -> Self {
        FunctionRegistry {
            filesystem_enabled,
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn filesystem_enabled(&self) -> bool {
        self.filesystem_enabled
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve(&self, name: &str) -> Option<&'static FunctionSpec> {
        BUILTINS.get(name)
    }

    /// Names of every builtin, in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        BUILTINS.keys().copied()
    }

    /// Resolve `name` and check it may run under this registry.
    pub fn prepare(&self, name: &str) -> Result<Callable<'_>, EvalError> {
        let spec = self.resolve(name).ok_or_else(|| EvalError::UnknownFunction {
            name: name.to_string(),
        })?;

        if spec.filesystem && !self.filesystem_enabled {
            return Err(EvalError::FunctionDisabled {
                name: name.to_string(),
                reason: "filesystem function disabled".into(),
            });
        }

        Ok(Callable {
            spec,
            registry: self,
        })
    }

    pub fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        self.prepare(name)?.call(args)
    }
}

impl Callable<'_> {
    pub fn call(&self, args: Vec<Value>) -> Result<Value, EvalError> {
        let spec = self.spec;
        let fixed = spec.params.len();

        let arity_ok = match spec.variadic {
            Some(_) => args.len() >= fixed,
            None => args.len() == fixed,
        };
        if !arity_ok {
            let expected = if spec.variadic.is_some() {
                format!("at least {}", fixed)
            } else {
                fixed.to_string()
            };
            return Err(EvalError::invalid(
                spec.name,
                format!("expected {} argument(s), got {}", expected, args.len()),
            ));
        }

        let mut checked = Vec::with_capacity(args.len());
        for (i, arg) in args.into_iter().enumerate() {
            let param = spec
                .params
                .get(i)
                .copied()
                .or(spec.variadic)
                .unwrap_or(ParamType::Any);
            let found = arg.type_name();
            let coerced = param.coerce(arg).ok_or_else(|| {
                EvalError::invalid(
                    spec.name,
                    format!("argument {} must be {}, got {}", i + 1, param.describe(), found),
                )
            })?;
            checked.push(coerced);
        }

        (spec.callback)(self.registry, checked)
    }
}

impl ParamType {
    /// Convert `value` to this type the way attribute values convert, or
    /// `None` when no conversion exists.
    pub fn coerce(self, value: Value) -> Option<Value> {
        match (self, value) {
            (ParamType::Any, v) => Some(v),
            (ParamType::String, v @ Value::String(_)) => Some(v),
            (ParamType::String, v @ (Value::Number(_) | Value::Bool(_))) => {
                v.to_template_string().map(Value::String)
            }
            (ParamType::Number, v) => v.to_number().map(Value::Number),
            (ParamType::Bool, Value::Bool(b)) => Some(Value::Bool(b)),
            (ParamType::Bool, Value::String(s)) if s == "true" || s == "false" => {
                Some(Value::Bool(s == "true"))
            }
            (ParamType::List, v @ Value::List(_)) => Some(v),
            (ParamType::Map, v @ Value::Map(_)) => Some(v),
            (ParamType::Collection, v @ (Value::List(_) | Value::Map(_) | Value::String(_))) => Some(v),
            _ => None,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ParamType::String => "a string",
            ParamType::Number => "a number",
            ParamType::Bool => "a bool",
            ParamType::List => "a list",
            ParamType::Map => "a map",
            ParamType::Collection => "a list, map or string",
            ParamType::Any => "any value",
        }
    }
}

/// Argument accessors for callbacks; types were checked by `Callable::call`.
pub(crate) fn string_arg(args: &[Value], i: usize) -> &str {
    args.get(i).and_then(Value::as_str).unwrap_or_default()
}

pub(crate) fn number_arg(args: &[Value], i: usize) -> f64 {
    args.get(i).and_then(Value::to_number).unwrap_or_default()
}

pub(crate) fn list_arg(args: &[Value], i: usize) -> &[Value] {
    args.get(i).and_then(Value::as_list).map(Vec::as_slice).unwrap_or_default()
}

#[cfg(test)]
mod tests;
