use thiserror::Error;

/// The main error type for job specification parsing.
///
/// Every variant that originates from a document carries the document name
/// and the line it was raised on, so a caller can point at the offending
/// source without re-reading it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobspecError {
    #[error("[jobspec] Syntax Error in {file} at {line}:{column}: {message}{}", hint_suffix(.hint))]
    Syntax {
        file: String,
        message: String,
        line: usize,
        column: usize,
        hint: Option<String>,
    },

    /// An expression failed to evaluate.
    #[error("[jobspec] Evaluation Error in {file} at line {line}: {source}")]
    Eval {
        file: String,
        line: usize,
        source: EvalError,
    },

    /// The evaluated tree does not fit the job model.
    #[error("[jobspec] Decode Error in {file} at line {line}: {source}")]
    Decode {
        file: String,
        line: usize,
        source: DecodeError,
    },

    #[error("[jobspec] Export Error: {message}")]
    Export { message: String },
}

/// Failures raised while evaluating a single expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Call to unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("Call to '{name}' rejected: {reason}")]
    FunctionDisabled { name: String, reason: String },

    #[error("Invalid arguments to {target}: {message}")]
    InvalidArguments { target: String, message: String },

    #[error("Cannot iterate over a value of type {type_name}")]
    NotIterable { type_name: &'static str },

    /// Soft failure: callers that allow pass-through keep the source text instead.
    #[error("Unknown variable '{path}'")]
    UnknownVariable { path: String },
}

/// Failures raised while mapping the block tree onto the job model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Missing required field '{field}' in {block}")]
    MissingField { block: String, field: String },

    #[error("Field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unsupported {kind} '{name}' in {block}")]
    UnsupportedField {
        block: String,
        kind: &'static str,
        name: String,
    },

    #[error("Block '{block_type}' expects {expected} label(s), got {found}")]
    InvalidLabels {
        block_type: String,
        expected: usize,
        found: usize,
    },
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref().map_or(String::new(), |h| format!(" Hint: {}", h))
}

impl JobspecError {
    pub fn eval(file: &str, line: usize, source: EvalError) -> Self {
        JobspecError::Eval {
            file: file.to_string(),
            line,
            source,
        }
    }

    pub fn decode(file: &str, line: usize, source: DecodeError) -> Self {
        JobspecError::Decode {
            file: file.to_string(),
            line,
            source,
        }
    }
}

impl EvalError {
    pub fn invalid(target: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::InvalidArguments {
            target: target.into(),
            message: message.into(),
        }
    }
}

impl DecodeError {
    /// Conversions are raised without knowing which field they belong to.
    pub(crate) fn for_field(self, name: &str) -> Self {
        match self {
            DecodeError::TypeMismatch {
                expected, found, ..
            } => DecodeError::TypeMismatch {
                field: name.to_string(),
                expected,
                found,
            },
            other => other,
        }
    }
}
