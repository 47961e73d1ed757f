use std::path::{Path, PathBuf};

/// Format a number the way templates print it: integral values lose the
/// trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Directory that relative paths in a document resolve against.
pub fn document_dir(document_name: &str) -> PathBuf {
    match Path::new(document_name).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Expand "~/" and resolve relative paths against `base_dir`.
pub fn resolve_path(raw_path: &str, base_dir: &Path) -> PathBuf {
    let path_str = raw_path.trim();

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    let p = PathBuf::from(path_str);
    if p.is_absolute() { p } else { base_dir.join(p) }
}

fn indent_width(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

/// Strip the space and tab indentation shared by every non-blank line.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(indent_width)
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            out.push_str(line.trim_start_matches([' ', '\t']));
        } else {
            out.push_str(&line[indent.min(indent_width(line))..]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(8080.0), "8080");
        assert_eq!(format_number(-1.0), "-1");
        assert_eq!(format_number(0.25), "0.25");
    }

    #[test]
    fn test_document_dir_defaults_to_current_directory() {
        assert_eq!(document_dir("input.hcl"), PathBuf::from("."));
        assert_eq!(document_dir("jobs/web.hcl"), PathBuf::from("jobs"));
    }

    #[test]
    fn test_resolve_path_joins_relative_paths() {
        let base = Path::new("/srv/jobs");
        assert_eq!(resolve_path("data.txt", base), PathBuf::from("/srv/jobs/data.txt"));
        assert_eq!(resolve_path("/etc/hosts", base), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn test_dedent_strips_common_indent() {
        let text = "    line one\n      nested\n    line two\n";
        assert_eq!(dedent(text), "line one\n  nested\nline two\n");
    }

    #[test]
    fn test_dedent_counts_only_spaces_and_tabs() {
        let text = " \u{a0}a\n  b\n";
        assert_eq!(dedent(text), "\u{a0}a\n b\n");
        assert_eq!(dedent("\u{3000}x\n  y\n"), "\u{3000}x\n  y\n");
    }
}
