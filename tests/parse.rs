use std::collections::HashMap;
use std::fs;

use jobspec::{parse, parse_with_config, parse_with_overrides, EvalError, JobspecError, ParseConfig};

fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_vars_and_functions() {
    let hcl = r#"
job "example" {
  datacenters = [for s in ["dc1", "dc2"] : upper(s)]
  region      = vars.region_var
}
"#;

    let job = parse_with_overrides("input.hcl", hcl, &overrides(&[("region_var", "aug")]), true).unwrap();
    assert_eq!(job.datacenters, vec!["DC1", "DC2"]);
    assert_eq!(job.region.as_deref(), Some("aug"));
}

#[test]
fn test_unknown_variables_are_left_intact() {
    let hcl = r#"
job "example" {
  datacenters = [for s in ["dc1", "dc2"] : upper(s)]
  region      = vars.region_var
  meta {
    known_var   = "${vars.region_var}"
    unknown_var = "${UNKNOWN}"
  }
}
"#;

    let job = parse_with_overrides("input.hcl", hcl, &overrides(&[("region_var", "aug")]), true).unwrap();
    assert_eq!(job.meta.len(), 2);
    assert_eq!(job.meta["known_var"], "aug");
    assert_eq!(job.meta["unknown_var"], "${UNKNOWN}");
}

#[test]
fn test_file_function_enabled() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("motd.txt"), "line one\nline two\n").unwrap();
    let name = dir.path().join("input.hcl");

    let hcl = "job \"example\" {\n  region = file(\"motd.txt\")\n}\n";
    let job = parse_with_overrides(&name.to_string_lossy(), hcl, &HashMap::new(), true).unwrap();
    assert_eq!(job.region.as_deref(), Some("line one\nline two\n"));
}

#[test]
fn test_file_function_disabled() {
    let hcl = "job \"example\" {\n  region = file(\"parse.rs\")\n}\n";
    let err = parse_with_overrides("input.hcl", hcl, &HashMap::new(), false).unwrap_err();

    assert!(err.to_string().contains("filesystem function disabled"));
    assert!(matches!(
        err,
        JobspecError::Eval {
            line: 2,
            source: EvalError::FunctionDisabled { .. },
            ..
        }
    ));
}

#[test]
fn test_parse_dynamic_groups() {
    let hcl = r#"
job "example" {

dynamic "group" {
  for_each = ["groupA", "groupB", "groupC"]
  labels   = [group.value]

  content {
    task "simple" {
      driver = "raw_exec"

    }
  }
}
}
"#;

    let job = parse_with_overrides("input.hcl", hcl, &HashMap::new(), true).unwrap();
    let names: Vec<_> = job
        .task_groups
        .iter()
        .map(|g| g.name.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["groupA", "groupB", "groupC"]);
    assert!(job.task_groups.iter().all(|g| g.tasks[0].driver == "raw_exec"));
}

#[test]
fn test_dynamic_groups_from_variables() {
    let hcl = r#"
variable "groups" {
  default = { web = 3, api = 1 }
}

job "example" {
  dynamic "group" {
    for_each = vars.groups
    iterator = g
    labels   = [g.key]

    content {
      count = g.value
      task "main" {
        driver = "exec"
        env {
          ROLE = "${g.key}-${NOMAD_ALLOC_INDEX}"
        }
      }
    }
  }
}
"#;

    let job = parse("input.hcl", hcl).unwrap();
    let web = job.task_group("web").unwrap();
    assert_eq!(web.count, Some(3));
    assert_eq!(web.tasks[0].env["ROLE"], "web-${NOMAD_ALLOC_INDEX}");
    assert_eq!(job.task_group("api").and_then(|g| g.count), Some(1));
}

#[test]
fn test_strict_mode_rejects_unknown_references() {
    let hcl = r#"
job "example" {
  meta {
    unknown_var = "${UNKNOWN}"
  }
}
"#;

    let config = ParseConfig::new("input.hcl", hcl).strict(true);
    let err = parse_with_config(&config).unwrap_err();
    assert!(matches!(
        err,
        JobspecError::Eval {
            line: 4,
            source: EvalError::UnknownVariable { .. },
            ..
        }
    ));

    // The same document passes through when not strict.
    assert!(parse("input.hcl", hcl).is_ok());
}

#[test]
fn test_variable_defaults_and_overrides() {
    let hcl = r#"
variable "region" {
  default = "global"
}

variable "priority" {
  type    = number
  default = 50
}

job "example" {
  region   = vars.region
  priority = vars.priority
}
"#;

    let job = parse("input.hcl", hcl).unwrap();
    assert_eq!(job.region.as_deref(), Some("global"));
    assert_eq!(job.priority, Some(50));

    let config = ParseConfig::new("input.hcl", hcl)
        .with_env("JOBSPEC_VAR_region=from-env")
        .with_env("JOBSPEC_VAR_priority=70");
    let job = parse_with_config(&config).unwrap();
    assert_eq!(job.region.as_deref(), Some("from-env"));
    assert_eq!(job.priority, Some(70));

    let config = config.with_var("region", "from-args");
    let job = parse_with_config(&config).unwrap();
    assert_eq!(job.region.as_deref(), Some("from-args"));
}

#[test]
fn test_for_expression_variables_do_not_leak() {
    let hcl = r#"
job "example" {
  datacenters = [for s in ["a"] : s]
  region      = s
}
"#;

    let job = parse("input.hcl", hcl).unwrap();
    assert_eq!(job.region.as_deref(), Some("${s}"));

    let err = parse_with_config(&ParseConfig::new("input.hcl", hcl).strict(true)).unwrap_err();
    assert!(matches!(err, JobspecError::Eval { line: 4, .. }));
}

#[test]
fn test_syntax_errors_carry_position() {
    let err = parse("broken.hcl", "job \"x\" {\n  region = \n}\n").unwrap_err();
    match err {
        JobspecError::Syntax { file, line, .. } => {
            assert_eq!(file, "broken.hcl");
            assert_eq!(line, 2);
        }
        other => panic!("Expected syntax error, got {:?}", other),
    }
}
