//! Hygiene — source-level budgets for the board crate.
//!
//! Library code hands every failure back to its caller: it must not panic,
//! print, or drop a `Result` on the floor. Output goes through `tracing`.
//! Each pattern below has a budget (zero everywhere). The budget only ever
//! goes down.
#![allow(clippy::absurd_extreme_comparisons)]

use std::fs;
use std::path::Path;

const BUDGETS: &[(&str, usize)] = &[
    // Panics.
    (".unwrap()", 0),
    (".expect(", 0),
    ("panic!(", 0),
    ("unreachable!(", 0),
    ("todo!(", 0),
    ("unimplemented!(", 0),
    // Silent loss.
    ("let _ =", 0),
    (".ok()", 0),
    // Logging goes through tracing.
    ("println!(", 0),
    ("eprintln!(", 0),
    ("dbg!(", 0),
    // Structure.
    ("#[allow(dead_code)]", 0),
];

/// Files compiled only under `cfg(test)`.
const TEST_ONLY: &[&str] = &["test_helpers.rs"];

struct SourceFile {
    path: String,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        let is_test_only = TEST_ONLY.iter().any(|name| path_str.ends_with(name));
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") || is_test_only {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

fn hits_for(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

#[test]
fn source_tree_is_not_empty() {
    assert!(!source_files().is_empty(), "run from the crate root");
}

#[test]
fn pattern_budgets() {
    let files = source_files();
    let mut failures = Vec::new();
    for (pattern, max) in BUDGETS {
        let hits = hits_for(&files, pattern);
        let count: usize = hits.iter().map(|(_, c)| c).sum();
        if count > *max {
            let detail: Vec<String> = hits.iter().map(|(p, c)| format!("    {p}: {c}")).collect();
            failures.push(format!("  `{pattern}`: found {count}, max {max}\n{}", detail.join("\n")));
        }
    }
    assert!(failures.is_empty(), "hygiene budgets exceeded:\n{}", failures.join("\n"));
}

#[test]
fn every_library_error_has_a_code() {
    let files = source_files();
    for file in &files {
        let enums = file.content.matches("thiserror::Error)]\npub enum").count();
        let impls = file.content.matches("impl ErrorCode for").count();
        assert!(impls >= enums, "{}: {enums} error enums but {impls} ErrorCode impls", file.path);
    }
}
