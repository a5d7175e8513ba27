//! Hygiene: production sources of this crate stay free of panicking and
//! error-swallowing shortcuts.
//!
//! Each pattern has a budget (zero here). Adding an occurrence means removing
//! another one first; budgets only shrink.

use std::fs;
use std::path::Path;

/// `(pattern, budget, why it is banned)`
const BUDGETS: [(&str, usize, &str); 9] = [
    (".unwrap()", 0, "panics on None/Err"),
    (".expect(", 0, "panics on None/Err"),
    ("panic!(", 0, "crashes the host"),
    ("unreachable!(", 0, "crashes the host"),
    ("todo!(", 0, "unfinished stub"),
    ("unimplemented!(", 0, "unfinished stub"),
    ("let _ =", 0, "discards a result unseen"),
    (".ok()", 4, "discards an error unseen; env fallbacks in config only"),
    ("#[allow(dead_code)]", 0, "hides unused code"),
];

/// Production `.rs` files under `src/`; `*_test.rs` siblings are skipped.
fn production_sources(dir: &Path, out: &mut Vec<(String, String)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            production_sources(&path, out);
            continue;
        }
        let name = path.to_string_lossy().to_string();
        if path.extension().is_some_and(|e| e == "rs") && !name.ends_with("_test.rs") {
            if let Ok(content) = fs::read_to_string(&path) {
                out.push((name, content));
            }
        }
    }
}

fn count_lines(content: &str, pattern: &str) -> usize {
    content.lines().filter(|line| line.contains(pattern)).count()
}

#[test]
fn pattern_budgets_hold() {
    let mut files = Vec::new();
    production_sources(Path::new("src"), &mut files);
    assert!(!files.is_empty(), "no sources found; run from the crate root");

    let mut failures = Vec::new();
    for (pattern, budget, why) in BUDGETS {
        let hits: Vec<(String, usize)> = files
            .iter()
            .map(|(path, content)| (path.clone(), count_lines(content, pattern)))
            .filter(|(_, count)| *count > 0)
            .collect();
        let total: usize = hits.iter().map(|(_, count)| count).sum();
        if total > budget {
            let listing: Vec<String> = hits.iter().map(|(path, count)| format!("    {path}: {count}")).collect();
            failures.push(format!("`{pattern}` ({why}): found {total}, max {budget}\n{}", listing.join("\n")));
        }
    }
    assert!(failures.is_empty(), "hygiene budgets exceeded:\n{}", failures.join("\n"));
}
