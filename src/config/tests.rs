// Author: Dustin Pilgrim
// License: MIT

#[cfg(test)]
use super::*;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{DecodeError, JobspecError};
use crate::functions::FunctionRegistry;
use crate::parser::parse_body;
use crate::value::Value;

fn vars_for(config: &ParseConfig) -> Result<Value, JobspecError> {
    let registry = FunctionRegistry::new(config.allow_fs);
    let body = parse_body(&config.path, &config.body)?;
    variables::collect(&config.path, &body, config, &registry)
}

fn var<'v>(vars: &'v Value, name: &str) -> Option<&'v Value> {
    vars.as_map().and_then(|m| m.get(name))
}

const DECLS: &str = r#"
variable "region" {
  default     = "global"
  description = "Region to run in"
}

variable "count" {
  type    = number
  default = 1
}

variable "canary" {
  type = bool
}
"#;

#[test]
fn test_base_dir_defaults_to_document_directory() {
    assert_eq!(ParseConfig::new("jobs/web.hcl", "").base_dir(), PathBuf::from("jobs"));
    assert_eq!(ParseConfig::new("web.hcl", "").base_dir(), PathBuf::from("."));
    assert_eq!(
        ParseConfig::new("web.hcl", "").with_base_dir("/srv").base_dir(),
        PathBuf::from("/srv")
    );
}

#[test]
fn test_env_entries_are_filtered_by_prefix() {
    let config = ParseConfig::new("input.hcl", "")
        .with_env("JOBSPEC_VAR_region=eu")
        .with_env("PATH=/usr/bin")
        .with_env("JOBSPEC_VAR_=empty")
        .with_env("JOBSPEC_VAR_noequals");

    let env: Vec<_> = config.env_vars().collect();
    assert_eq!(env, vec![("region", "eu")]);
}

#[test]
fn test_declarations_are_collected() {
    let registry = FunctionRegistry::new(false);
    let body = parse_body("input.hcl", DECLS).unwrap();
    let decls = variables::declarations("input.hcl", &body, &registry).unwrap();

    assert_eq!(decls.len(), 3);
    assert_eq!(decls[0].name, "region");
    assert_eq!(decls[0].description.as_deref(), Some("Region to run in"));
    assert_eq!(decls[1].var_type, VariableType::Number);
    assert_eq!(decls[2].default, None);
}

#[test]
fn test_defaults_seed_the_namespace() {
    let vars = vars_for(&ParseConfig::new("input.hcl", DECLS)).unwrap();
    assert_eq!(var(&vars, "region"), Some(&Value::from("global")));
    assert_eq!(var(&vars, "count"), Some(&Value::Number(1.0)));
    assert_eq!(var(&vars, "canary"), None);
}

#[test]
fn test_env_overrides_defaults_and_args_override_env() {
    let config = ParseConfig::new("input.hcl", DECLS)
        .with_env("JOBSPEC_VAR_region=env-region")
        .with_env("JOBSPEC_VAR_count=3")
        .with_var("count", "7");

    let vars = vars_for(&config).unwrap();
    assert_eq!(var(&vars, "region"), Some(&Value::from("env-region")));
    assert_eq!(var(&vars, "count"), Some(&Value::Number(7.0)));
}

#[test]
fn test_typed_overrides_convert() {
    let mut args = HashMap::new();
    args.insert("canary".to_string(), "true".to_string());
    args.insert("extra".to_string(), "42".to_string());

    let vars = vars_for(&ParseConfig::new("input.hcl", DECLS).with_vars(&args)).unwrap();
    assert_eq!(var(&vars, "canary"), Some(&Value::Bool(true)));
    // Undeclared overrides stay strings.
    assert_eq!(var(&vars, "extra"), Some(&Value::from("42")));
}

#[test]
fn test_bad_typed_override_is_rejected() {
    let config = ParseConfig::new("input.hcl", DECLS).with_var("count", "many");
    let err = vars_for(&config).unwrap_err();
    match err {
        JobspecError::Decode { source, line, .. } => {
            assert_eq!(line, 7);
            assert_eq!(
                source,
                DecodeError::TypeMismatch {
                    field: "count".into(),
                    expected: "number",
                    found: "string",
                }
            );
        }
        other => panic!("Expected decode error, got {:?}", other),
    }
}

#[test]
fn test_defaults_cannot_reference_variables() {
    let input = "variable \"a\" {\n  default = \"x\"\n}\nvariable \"b\" {\n  default = vars.a\n}\n";
    let err = vars_for(&ParseConfig::new("input.hcl", input)).unwrap_err();
    assert!(matches!(err, JobspecError::Eval { line: 5, .. }));
}

#[test]
fn test_duplicate_variable_is_rejected() {
    let input = "variable \"a\" {}\nvariable \"a\" {}\n";
    let err = vars_for(&ParseConfig::new("input.hcl", input)).unwrap_err();
    assert!(matches!(
        err,
        JobspecError::Decode {
            line: 2,
            source: DecodeError::UnsupportedField { kind: "duplicate variable", .. },
            ..
        }
    ));
}

#[test]
fn test_unknown_variable_attribute_is_rejected() {
    let input = "variable \"a\" {\n  sensitive = true\n}\n";
    let err = vars_for(&ParseConfig::new("input.hcl", input)).unwrap_err();
    assert!(err.to_string().contains("Unsupported attribute 'sensitive' in variable \"a\""));
}

#[test]
fn test_unknown_variable_type_is_rejected() {
    let input = "variable \"a\" {\n  type = tuple\n}\n";
    let err = vars_for(&ParseConfig::new("input.hcl", input)).unwrap_err();
    assert!(err.to_string().contains("Unsupported type 'tuple'"));
}
