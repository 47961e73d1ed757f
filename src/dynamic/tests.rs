#[cfg(test)]
use super::*;

use crate::functions::FunctionRegistry;
use crate::parser::parse_body;

fn expand_src(input: &str) -> Result<Body, JobspecError> {
    let registry = FunctionRegistry::new(false);
    let ctx = EvalContext::new(&registry);
    let body = parse_body("test.hcl", input)?;
    expand("test.hcl", &body, &ctx)
}

fn labels_of<'a>(body: &'a Body, block_type: &'a str) -> Vec<Vec<String>> {
    body.blocks_of_type(block_type).map(|b| b.labels.clone()).collect()
}

#[test]
fn test_expands_groups_in_order() {
    let input = r#"
dynamic "group" {
  for_each = ["groupA", "groupB", "groupC"]
  labels   = [group.value]

  content {
    count = 1
  }
}
"#;

    let body = expand_src(input).unwrap();
    assert_eq!(
        labels_of(&body, "group"),
        vec![vec!["groupA"], vec!["groupB"], vec!["groupC"]]
    );
    assert_eq!(body.blocks_of_type("dynamic").count(), 0);
}

#[test]
fn test_iterator_references_are_inlined() {
    let input = r#"
dynamic "task" {
  for_each = { web = "nginx", cache = "redis" }
  labels   = [task.key]

  content {
    image = "${task.value}:latest"
    slot  = task.key
    host  = node.unique.name
  }
}
"#;

    let body = expand_src(input).unwrap();
    let tasks: Vec<_> = body.blocks_of_type("task").collect();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].labels, vec!["web"]);

    let slot = tasks[1].body.attribute("slot").map(|a| &a.expr);
    assert_eq!(slot, Some(&Expression::Literal(Value::from("cache"))));

    // References to anything but the iterator stay unevaluated.
    let host = tasks[0].body.attribute("host").map(|a| &a.expr);
    assert_eq!(
        host,
        Some(&Expression::Reference(vec![
            "node".into(),
            "unique".into(),
            "name".into()
        ]))
    );

    let registry = FunctionRegistry::new(false);
    let ctx = EvalContext::new(&registry);
    let image = tasks[1].body.attribute("image").map(|a| ctx.evaluate(&a.expr));
    assert_eq!(image, Some(Ok(Value::from("redis:latest"))));
}

#[test]
fn test_custom_iterator_name() {
    let input = r#"
dynamic "group" {
  for_each = ["a", "b"]
  iterator = g
  labels   = ["grp-${g.value}"]
  content {
    index = g.key
  }
}
"#;

    let body = expand_src(input).unwrap();
    assert_eq!(labels_of(&body, "group"), vec![vec!["grp-a"], vec!["grp-b"]]);

    let second = body.blocks_of_type("group").nth(1).unwrap();
    assert_eq!(
        second.body.attribute("index").map(|a| &a.expr),
        Some(&Expression::Literal(Value::Number(1.0)))
    );
}

#[test]
fn test_nested_dynamic_blocks_expand() {
    let input = r#"
job "example" {
  dynamic "group" {
    for_each = { api = ["a1", "a2"], db = ["d1"] }
    labels   = [group.key]

    content {
      dynamic "task" {
        for_each = group.value
        labels   = [task.value]
        content {
          parent = group.key
        }
      }
    }
  }
}
"#;

    let body = expand_src(input).unwrap();
    let job = body.blocks().next().unwrap();
    let groups: Vec<_> = job.body.blocks_of_type("group").collect();
    assert_eq!(groups.len(), 2);

    assert_eq!(labels_of(&groups[0].body, "task"), vec![vec!["a1"], vec!["a2"]]);
    assert_eq!(labels_of(&groups[1].body, "task"), vec![vec!["d1"]]);

    let parent = groups[1]
        .body
        .blocks_of_type("task")
        .next()
        .and_then(|t| t.body.attribute("parent"))
        .map(|a| &a.expr);
    assert_eq!(parent, Some(&Expression::Literal(Value::from("db"))));
}

#[test]
fn test_expansion_is_idempotent() {
    let input = r#"
job "example" {
  dynamic "group" {
    for_each = ["x", "y"]
    labels   = [group.value]
    content {
      meta {
        name = "${group.value}-${NOMAD_ALLOC_ID}"
      }
    }
  }
}
"#;

    let registry = FunctionRegistry::new(false);
    let ctx = EvalContext::new(&registry);
    let once = expand_src(input).unwrap();
    let twice = expand("test.hcl", &once, &ctx).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_for_expression_shadowing_the_iterator_is_left_alone() {
    let input = r#"
dynamic "group" {
  for_each = ["outer"]
  content {
    names = [for group in ["inner"] : group]
  }
}
"#;

    let body = expand_src(input).unwrap();
    let group = body.blocks_of_type("group").next().unwrap();

    let registry = FunctionRegistry::new(false);
    let ctx = EvalContext::new(&registry);
    let names = group.body.attribute("names").map(|a| ctx.evaluate(&a.expr));
    assert_eq!(names, Some(Ok(Value::List(vec![Value::from("inner")]))));
}

#[test]
fn test_missing_for_each_is_reported() {
    let err = expand_src("dynamic \"group\" {\n  content {}\n}\n").unwrap_err();
    assert!(matches!(
        err,
        JobspecError::Decode {
            source: DecodeError::MissingField { ref field, .. },
            ..
        } if field == "for_each"
    ));
}

#[test]
fn test_missing_content_is_reported() {
    let err = expand_src("dynamic \"group\" {\n  for_each = []\n}\n").unwrap_err();
    assert!(matches!(
        err,
        JobspecError::Decode {
            source: DecodeError::MissingField { ref field, .. },
            ..
        } if field == "content"
    ));
}

#[test]
fn test_unknown_attribute_in_dynamic_is_rejected() {
    let input = "dynamic \"group\" {\n  for_each = []\n  count = 3\n  content {}\n}\n";
    let err = expand_src(input).unwrap_err();
    match err {
        JobspecError::Decode { line, source, .. } => {
            assert_eq!(line, 3);
            assert!(matches!(source, DecodeError::UnsupportedField { kind: "attribute", .. }));
        }
        other => panic!("Expected decode error, got {:?}", other),
    }
}

#[test]
fn test_dynamic_requires_one_label() {
    let err = expand_src("dynamic {\n  for_each = []\n  content {}\n}\n").unwrap_err();
    assert!(matches!(
        err,
        JobspecError::Decode {
            source: DecodeError::InvalidLabels { expected: 1, found: 0, .. },
            ..
        }
    ));
}

#[test]
fn test_dynamic_cannot_produce_dynamic_blocks() {
    let err = expand_src("\ndynamic \"dynamic\" {\n  for_each = [1]\n  content {}\n}\n").unwrap_err();
    match err {
        JobspecError::Decode {
            line,
            source: DecodeError::UnsupportedField { kind, name, .. },
            ..
        } => {
            assert_eq!(line, 2);
            assert_eq!(kind, "block type");
            assert_eq!(name, "dynamic");
        }
        other => panic!("Expected decode error, got {:?}", other),
    }
}

#[test]
fn test_for_each_must_be_iterable() {
    let err = expand_src("dynamic \"group\" {\n  for_each = 3\n  content {}\n}\n").unwrap_err();
    assert!(matches!(
        err,
        JobspecError::Eval {
            source: EvalError::NotIterable { type_name: "number" },
            ..
        }
    ));
}
