// Author: Dustin Pilgrim
// License: MIT

use std::collections::HashMap;
use std::path::PathBuf;

use crate::utils::document_dir;

pub mod variables;

pub use variables::{Variable, VariableType, ENV_PREFIX};

/// Everything one parse needs: the document, where relative paths resolve,
/// variable overrides and the evaluation switches.
///
/// # Example
/// ```
/// use jobspec::ParseConfig;
///
/// let config = ParseConfig::new("jobs/web.hcl", "job \"web\" {}")
///     .with_var("region", "eu")
///     .allow_fs(true);
/// assert_eq!(config.base_dir(), std::path::PathBuf::from("jobs"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseConfig {
    /// Document name, used in diagnostics and as the default base directory.
    pub path: String,
    /// Document text.
    pub body: String,
    /// Overrides the directory derived from `path`.
    pub base_dir: Option<PathBuf>,
    /// Variable overrides; these win over everything else.
    pub arg_vars: HashMap<String, String>,
    /// `JOBSPEC_VAR_<name>=<value>` entries; other entries are ignored.
    pub envs: Vec<String>,
    /// Enables `file()` and any other filesystem function.
    pub allow_fs: bool,
    /// Unresolved references become errors instead of passing through.
    pub strict: bool,
}

impl ParseConfig {
    pub fn new(path: impl Into<String>, body: impl Into<String>) -> Self {
        ParseConfig {
            path: path.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arg_vars.insert(name.into(), value.into());
        self
    }

    pub fn with_vars(mut self, vars: &HashMap<String, String>) -> Self {
        self.arg_vars
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn with_env(mut self, entry: impl Into<String>) -> Self {
        self.envs.push(entry.into());
        self
    }

    /// Take `JOBSPEC_VAR_*` overrides from the process environment.
    pub fn with_process_env(mut self) -> Self {
        self.envs.extend(
            std::env::vars()
                .filter(|(k, _)| k.starts_with(ENV_PREFIX))
                .map(|(k, v)| format!("{}={}", k, v)),
        );
        self
    }

    pub fn allow_fs(mut self, allow: bool) -> Self {
        self.allow_fs = allow;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Directory relative paths resolve against.
    pub fn base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.clone(),
            None => document_dir(&self.path),
        }
    }

    /// Variable overrides from `envs`, in order.
    pub fn env_vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.envs.iter().filter_map(|entry| {
            let (key, value) = entry.split_once('=')?;
            let name = key.strip_prefix(ENV_PREFIX)?;
            (!name.is_empty()).then_some((name, value))
        })
    }
}

#[cfg(test)]
mod tests;
