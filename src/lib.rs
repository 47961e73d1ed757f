pub mod ast;
pub mod config;
pub mod decode;
pub mod dynamic;
pub mod error;
pub mod eval;
pub mod export;
pub mod functions;
pub mod job;
pub mod lexer;
pub mod parser;
pub mod utils;
pub mod value;

use std::collections::HashMap;

use tracing::debug;

pub use ast::{Body, Expression};
pub use config::ParseConfig;
pub use error::{DecodeError, EvalError, JobspecError};
pub use eval::EvalContext;
pub use functions::FunctionRegistry;
pub use job::{Constraint, Job, Resources, Task, TaskGroup};
pub use value::Value;

/// Parse a job document with filesystem functions disabled and no
/// variable overrides. Unresolved references pass through as `${...}` text.
///
/// # Example
/// ```
/// let job = jobspec::parse(
///     "input.hcl",
///     r#"
/// job "example" {
///   datacenters = [for s in ["dc1", "dc2"] : upper(s)]
/// }
/// "#,
/// )?;
/// assert_eq!(job.datacenters, vec!["DC1", "DC2"]);
/// # Ok::<(), jobspec::JobspecError>(())
/// ```
pub fn parse(name: &str, text: &str) -> Result<Job, JobspecError> {
    parse_with_config(&ParseConfig::new(name, text))
}

/// Parse with variable overrides bound under `vars` and an explicit
/// filesystem switch.
pub fn parse_with_overrides(
    name: &str,
    text: &str,
    overrides: &HashMap<String, String>,
    filesystem_enabled: bool,
) -> Result<Job, JobspecError> {
    let config = ParseConfig::new(name, text)
        .with_vars(overrides)
        .allow_fs(filesystem_enabled);
    parse_with_config(&config)
}

/// Run the whole pipeline: parse, collect variables, expand dynamic blocks
/// and decode. Nothing partial is returned on error.
pub fn parse_with_config(config: &ParseConfig) -> Result<Job, JobspecError> {
    let file = config.path.as_str();

    let body = parser::parse_body(file, &config.body)?;
    debug!(file, items = body.items.len(), "parsed document");

    let registry = FunctionRegistry::new(config.allow_fs).with_base_dir(config.base_dir());
    let vars = config::variables::collect(file, &body, config, &registry)?;

    let ctx = EvalContext::new(&registry)
        .strict(config.strict)
        .with_variable("vars", vars);

    let expanded = dynamic::expand(file, &body, &ctx)?;
    decode::decode(file, &expanded, &ctx)
}
