use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::ast::{Block, Body, BodyItem, Expression};
use crate::error::{DecodeError, JobspecError};
use crate::eval::EvalContext;
use crate::functions::FunctionRegistry;
use crate::value::Value;

use super::ParseConfig;

/// Prefix marking an environment entry as a variable override.
pub const ENV_PREFIX: &str = "JOBSPEC_VAR_";

const VARIABLE: &str = "variable";

/// Declared type of a variable; overrides given as text convert to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableType {
    #[default]
    Any,
    String,
    Number,
    Bool,
}

/// A top-level `variable "<name>" { ... }` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub var_type: VariableType,
    pub line: usize,
}

/// Collect every `variable` block in `body`.
pub fn declarations(
    file: &str,
    body: &Body,
    registry: &FunctionRegistry,
) -> Result<Vec<Variable>, JobspecError> {
    // Defaults may not reference anything, so they see an empty scope.
    let ctx = EvalContext::new(registry).strict(true);
    let mut out: Vec<Variable> = Vec::new();

    for block in body.blocks_of_type(VARIABLE) {
        let variable = declaration(file, block, &ctx)?;
        if out.iter().any(|v| v.name == variable.name) {
            return Err(JobspecError::decode(
                file,
                block.line,
                DecodeError::UnsupportedField {
                    block: "document".into(),
                    kind: "duplicate variable",
                    name: variable.name,
                },
            ));
        }
        out.push(variable);
    }

    Ok(out)
}

fn declaration(file: &str, block: &Block, ctx: &EvalContext) -> Result<Variable, JobspecError> {
    let name = match block.labels.as_slice() {
        [name] => name.clone(),
        other => {
            return Err(JobspecError::decode(
                file,
                block.line,
                DecodeError::InvalidLabels {
                    block_type: VARIABLE.into(),
                    expected: 1,
                    found: other.len(),
                },
            ));
        }
    };
    let context = format!("variable \"{}\"", name);

    let mut variable = Variable {
        name,
        default: None,
        description: None,
        var_type: VariableType::Any,
        line: block.line,
    };

    for item in &block.body.items {
        let attr = match item {
            BodyItem::Attribute(attr) => attr,
            BodyItem::Block(nested) => {
                return Err(JobspecError::decode(
                    file,
                    nested.line,
                    DecodeError::UnsupportedField {
                        block: context,
                        kind: "block",
                        name: nested.block_type.clone(),
                    },
                ));
            }
        };

        match attr.name.as_str() {
            "default" => {
                let value = ctx
                    .evaluate(&attr.expr)
                    .map_err(|e| JobspecError::eval(file, attr.line, e))?;
                variable.default = Some(value);
            }
            "description" => {
                let value = ctx
                    .evaluate(&attr.expr)
                    .map_err(|e| JobspecError::eval(file, attr.line, e))?;
                let text = String::try_from(value)
                    .map_err(|e| JobspecError::decode(file, attr.line, e.for_field("description")))?;
                variable.description = Some(text);
            }
            "type" => {
                variable.var_type = match &attr.expr {
                    Expression::Reference(path) if path.len() == 1 => match path[0].as_str() {
                        "any" => VariableType::Any,
                        "string" => VariableType::String,
                        "number" => VariableType::Number,
                        "bool" => VariableType::Bool,
                        other => {
                            return Err(JobspecError::decode(
                                file,
                                attr.line,
                                DecodeError::UnsupportedField {
                                    block: context,
                                    kind: "type",
                                    name: other.to_string(),
                                },
                            ));
                        }
                    },
                    other => {
                        return Err(JobspecError::decode(
                            file,
                            attr.line,
                            DecodeError::UnsupportedField {
                                block: context,
                                kind: "type",
                                name: other.to_string(),
                            },
                        ));
                    }
                };
            }
            other => {
                return Err(JobspecError::decode(
                    file,
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

    Ok(variable)
}

/// Build the `vars` namespace: declared defaults, then environment
/// overrides, then argument overrides, later sources winning.
///
/// Overrides for undeclared names are accepted as strings.
pub fn collect(
    file: &str,
    body: &Body,
    config: &ParseConfig,
    registry: &FunctionRegistry,
) -> Result<Value, JobspecError> {
    let declared = declarations(file, body, registry)?;
    let mut vars: IndexMap<String, Value> = IndexMap::new();

    for variable in &declared {
        if let Some(default) = &variable.default {
            vars.insert(variable.name.clone(), default.clone());
        }
    }

    let env_overrides = config.env_vars();
    let mut arg_overrides: Vec<(&str, &str)> = config
        .arg_vars
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    // HashMap order is unspecified; keep insertion of new names stable.
    arg_overrides.sort_by(|a, b| a.0.cmp(b.0));

    for (name, raw) in env_overrides.chain(arg_overrides) {
        let declaration = declared.iter().find(|v| v.name == name);
        let value = match declaration {
            Some(variable) => convert_override(file, variable, raw)?,
            None => {
                trace!(variable = name, "override for undeclared variable");
                Value::String(raw.to_string())
            }
        };
        vars.insert(name.to_string(), value);
    }

    debug!(declared = declared.len(), bound = vars.len(), "collected variables");
    Ok(Value::Map(vars))
}

fn convert_override(file: &str, variable: &Variable, raw: &str) -> Result<Value, JobspecError> {
    let mismatch = |expected: &'static str| {
        JobspecError::decode(
            file,
            variable.line,
            DecodeError::TypeMismatch {
                field: variable.name.clone(),
                expected,
                found: "string",
            },
        )
    };

    match variable.var_type {
        VariableType::Any | VariableType::String => Ok(Value::String(raw.to_string())),
        VariableType::Number => raw
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| mismatch("number")),
        VariableType::Bool => match raw.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(mismatch("bool")),
        },
    }
}
