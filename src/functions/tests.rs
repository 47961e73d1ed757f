#[cfg(test)]
use super::*;

use std::fs;

fn s(v: &str) -> Value {
    Value::from(v)
}

fn list(items: &[&str]) -> Value {
    Value::List(items.iter().map(|i| s(i)).collect())
}

#[test]
fn test_catalog_contains_every_builtin() {
    let registry = FunctionRegistry::new(false);
    let names: Vec<_> = registry.names().collect();
    for expected in [
        "upper", "lower", "format", "join", "split", "replace", "regex", "concat", "length",
        "merge", "lookup", "coalesce", "range", "file", "env",
    ] {
        assert!(names.contains(&expected), "missing builtin {}", expected);
    }
}

#[test]
fn test_unknown_function_is_rejected() {
    let registry = FunctionRegistry::new(true);
    let err = registry.call("nope", vec![]).unwrap_err();
    assert_eq!(err, EvalError::UnknownFunction { name: "nope".into() });
}

#[test]
fn test_file_disabled_reports_reason() {
    let registry = FunctionRegistry::new(false);
    let err = registry.call("file", vec![s("anything.txt")]).unwrap_err();
    assert!(matches!(err, EvalError::FunctionDisabled { .. }));
    assert!(err.to_string().contains("filesystem function disabled"));
}

#[test]
fn test_file_reads_relative_to_base_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("motd.txt"), "hello from disk").unwrap();

    let registry = FunctionRegistry::new(true).with_base_dir(dir.path());
    let out = registry.call("file", vec![s("motd.txt")]).unwrap();
    assert_eq!(out, s("hello from disk"));
}

#[test]
fn test_file_missing_is_invalid_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FunctionRegistry::new(true).with_base_dir(dir.path());
    let err = registry.call("file", vec![s("absent.txt")]).unwrap_err();
    assert!(matches!(err, EvalError::InvalidArguments { ref target, .. } if target == "file"));
}

#[test]
fn test_arity_is_checked() {
    let registry = FunctionRegistry::new(false);
    let err = registry.call("upper", vec![s("a"), s("b")]).unwrap_err();
    assert!(err.to_string().contains("expected 1 argument(s), got 2"));

    let err = registry.call("concat", vec![]).map(|_| ()).err();
    assert!(err.is_none(), "variadic with zero fixed params accepts no args");
}

#[test]
fn test_argument_types_are_checked() {
    let registry = FunctionRegistry::new(false);
    let err = registry.call("upper", vec![list(&["a"])]).unwrap_err();
    assert!(err.to_string().contains("argument 1 must be a string, got list"));
}

#[test]
fn test_scalars_coerce_to_string_params() {
    let registry = FunctionRegistry::new(false);
    assert_eq!(registry.call("upper", vec![Value::Number(3.0)]).unwrap(), s("3"));
    assert_eq!(registry.call("tostring", vec![Value::Bool(true)]).unwrap(), s("true"));
}

#[test]
fn test_string_functions() {
    let registry = FunctionRegistry::new(false);
    assert_eq!(registry.call("upper", vec![s("dc1")]).unwrap(), s("DC1"));
    assert_eq!(registry.call("lower", vec![s("DC1")]).unwrap(), s("dc1"));
    assert_eq!(registry.call("title", vec![s("hello web-app")]).unwrap(), s("Hello Web-App"));
    assert_eq!(registry.call("trimspace", vec![s("  x \n")]).unwrap(), s("x"));
    assert_eq!(registry.call("trim", vec![s("--x--"), s("-")]).unwrap(), s("x"));
    assert_eq!(registry.call("trimprefix", vec![s("v1.2"), s("v")]).unwrap(), s("1.2"));
    assert_eq!(registry.call("trimsuffix", vec![s("a.hcl"), s(".hcl")]).unwrap(), s("a"));
}

#[test]
fn test_replace_plain_and_regex() {
    let registry = FunctionRegistry::new(false);
    assert_eq!(
        registry.call("replace", vec![s("a-b-c"), s("-"), s("_")]).unwrap(),
        s("a_b_c")
    );
    assert_eq!(
        registry.call("replace", vec![s("web123"), s("/[0-9]+/"), s("")]).unwrap(),
        s("web")
    );
}

#[test]
fn test_regex_returns_match_or_captures() {
    let registry = FunctionRegistry::new(false);
    assert_eq!(
        registry.call("regex", vec![s("[a-z]+"), s("123abc456")]).unwrap(),
        s("abc")
    );
    assert_eq!(
        registry.call("regex", vec![s("(\\d+)\\.(\\d+)"), s("v1.25")]).unwrap(),
        list(&["1", "25"])
    );
    assert!(registry.call("regex", vec![s("z"), s("abc")]).is_err());
}

#[test]
fn test_format_verbs() {
    let registry = FunctionRegistry::new(false);
    let out = registry
        .call("format", vec![s("%s-%d (%v%%)"), s("web"), Value::Number(3.7), Value::Bool(true)])
        .unwrap();
    assert_eq!(out, s("web-3 (true%)"));

    let err = registry.call("format", vec![s("%s %s"), s("one")]).unwrap_err();
    assert!(err.to_string().contains("not enough arguments"));
}

#[test]
fn test_split_and_join() {
    let registry = FunctionRegistry::new(false);
    assert_eq!(
        registry.call("split", vec![s(","), s("a,b,c")]).unwrap(),
        list(&["a", "b", "c"])
    );
    assert_eq!(
        registry.call("split", vec![s(""), s("abc")]).unwrap(),
        list(&["a", "b", "c"])
    );
    assert_eq!(
        registry.call("join", vec![s("-"), list(&["a", "b"])]).unwrap(),
        s("a-b")
    );
}

#[test]
fn test_collection_functions() {
    let registry = FunctionRegistry::new(false);

    assert_eq!(
        registry.call("concat", vec![list(&["a"]), list(&["b", "c"])]).unwrap(),
        list(&["a", "b", "c"])
    );
    assert_eq!(registry.call("length", vec![s("héllo")]).unwrap(), Value::Number(5.0));
    assert_eq!(registry.call("length", vec![list(&["a", "b"])]).unwrap(), Value::Number(2.0));
    assert_eq!(
        registry.call("contains", vec![list(&["a", "b"]), s("b")]).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        registry.call("distinct", vec![list(&["a", "b", "a"])]).unwrap(),
        list(&["a", "b"])
    );
    assert_eq!(
        registry.call("reverse", vec![list(&["a", "b"])]).unwrap(),
        list(&["b", "a"])
    );
}

#[test]
fn test_map_functions() {
    let registry = FunctionRegistry::new(false);
    let mut a = IndexMap::new();
    a.insert("x".to_string(), s("1"));
    a.insert("y".to_string(), s("2"));
    let mut b = IndexMap::new();
    b.insert("y".to_string(), s("3"));

    let merged = registry
        .call("merge", vec![Value::Map(a.clone()), Value::Map(b)])
        .unwrap();
    assert_eq!(merged.as_map().unwrap()["y"], s("3"));

    assert_eq!(registry.call("keys", vec![Value::Map(a.clone())]).unwrap(), list(&["x", "y"]));
    assert_eq!(registry.call("values", vec![Value::Map(a.clone())]).unwrap(), list(&["1", "2"]));
    assert_eq!(
        registry.call("lookup", vec![Value::Map(a.clone()), s("x")]).unwrap(),
        s("1")
    );
    assert_eq!(
        registry.call("lookup", vec![Value::Map(a.clone()), s("z"), s("dflt")]).unwrap(),
        s("dflt")
    );
    assert!(registry.call("lookup", vec![Value::Map(a), s("z")]).is_err());
}

#[test]
fn test_coalesce_skips_null_and_empty() {
    let registry = FunctionRegistry::new(false);
    let out = registry
        .call("coalesce", vec![Value::Null, s(""), s("fallback")])
        .unwrap();
    assert_eq!(out, s("fallback"));
}

#[test]
fn test_range_forms() {
    let registry = FunctionRegistry::new(false);
    let nums = |v: &[f64]| Value::List(v.iter().map(|n| Value::Number(*n)).collect());

    assert_eq!(registry.call("range", vec![Value::Number(3.0)]).unwrap(), nums(&[0.0, 1.0, 2.0]));
    assert_eq!(
        registry.call("range", vec![Value::Number(1.0), Value::Number(3.0)]).unwrap(),
        nums(&[1.0, 2.0])
    );
    assert_eq!(
        registry
            .call("range", vec![Value::Number(4.0), Value::Number(0.0), Value::Number(-2.0)])
            .unwrap(),
        nums(&[4.0, 2.0])
    );
    assert!(registry.call("range", vec![Value::Number(1.0), Value::Number(2.0), Value::Number(0.0)]).is_err());
}

#[test]
fn test_tonumber_and_tobool_accept_strings() {
    let registry = FunctionRegistry::new(false);
    assert_eq!(registry.call("tonumber", vec![s("42")]).unwrap(), Value::Number(42.0));
    assert_eq!(registry.call("tobool", vec![s("true")]).unwrap(), Value::Bool(true));
    assert!(registry.call("tonumber", vec![s("x")]).is_err());
}

#[test]
fn test_env_reads_environment() {
    let registry = FunctionRegistry::new(false);
    let out = registry
        .call("env", vec![s("JOBSPEC_TEST_SURELY_UNSET_VARIABLE")])
        .unwrap();
    assert_eq!(out, s(""));
}
