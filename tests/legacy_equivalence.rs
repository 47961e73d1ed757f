//! Documents without expression features must decode exactly as the legacy
//! parser decoded them. Each `.hcl` fixture is paired with the legacy output
//! recorded as `.json`; fixtures the legacy parser could not read have no
//! recording and are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use jobspec::{parse, Job};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/legacy")
}

fn fixtures() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::read_dir(fixtures_dir())
        .expect("Failed to read fixtures directory")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "hcl"))
        .collect();
    paths.sort();
    paths
}

#[test]
fn test_equivalent_to_legacy_parser() {
    let mut compared = 0;

    for path in fixtures() {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        let recorded = path.with_extension("json");
        if !recorded.exists() {
            eprintln!("skipping {}: not parsable by the legacy parser", name);
            continue;
        }

        let expected: Job = serde_json::from_str(&fs::read_to_string(&recorded).unwrap())
            .unwrap_or_else(|e| panic!("{}: bad recording: {}", name, e));
        let text = fs::read_to_string(&path).unwrap();
        let actual = parse(&name, &text).unwrap_or_else(|e| panic!("{}: {}", name, e));

        assert_eq!(actual, expected, "{} decoded differently from the legacy parser", name);
        compared += 1;
    }

    assert!(compared > 0, "no recorded fixtures were compared");
}

#[test]
fn test_skipped_fixtures_still_parse() {
    for path in fixtures() {
        if path.with_extension("json").exists() {
            continue;
        }
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        let text = fs::read_to_string(&path).unwrap();
        assert!(parse(&name, &text).is_ok(), "{} failed to parse", name);
    }
}
