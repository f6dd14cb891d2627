//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The headless core never sleeps, spawns or reads the wall clock
//! - The core stays free of terminal crates
//! - Only the TUI event loop waits on time
//!
//! The helpers below scan production sources; test modules are skipped.

use std::fs;
use std::path::{Path, PathBuf};

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File the pattern was found in
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root, two levels above this package
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// All `.rs` files under `dir`, relative to the workspace root
///
/// # Panics
///
/// Panics if `dir` does not exist, so a moved crate cannot silently pass.
#[must_use]
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let root = workspace_root().join(dir);
    assert!(root.exists(), "missing source directory: {}", root.display());

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Production lines of a source file with comments stripped
///
/// Scanning stops at the first `#[cfg(test)]`; test modules sit at the end
/// of each file in this workspace.
#[must_use]
pub fn production_lines(content: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim_start().starts_with("#[cfg(test)]") {
            break;
        }
        let code = line.split("//").next().unwrap_or(line);
        if !code.trim().is_empty() {
            out.push((idx + 1, code));
        }
    }
    out
}

/// Find production lines under `dir` containing any of `patterns`
///
/// Files for which `exempt` returns true are skipped.
#[must_use]
pub fn find_violations(dir: &str, patterns: &[&str], exempt: impl Fn(&Path) -> bool) -> Vec<Violation> {
    let mut violations = Vec::new();
    for path in rust_files(dir) {
        if exempt(&path) {
            continue;
        }
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        for (line, code) in production_lines(&content) {
            if patterns.iter().any(|p| code.contains(p)) {
                violations.push(Violation {
                    path: path.clone(),
                    line,
                    text: code.trim().to_string(),
                });
            }
        }
    }
    violations
}

/// Print violations and fail with `rule` as the headline
///
/// # Panics
///
/// Panics when `violations` is not empty.
pub fn assert_clean(rule: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s): {rule}", violations.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_and_tests_are_skipped() {
        let source = "let a = 1; // sleep(1)\n/// thread::spawn\nlet b = 2;\n#[cfg(test)]\nmod tests { sleep(1) }\n";
        let lines = production_lines(source);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, 1);
        assert_eq!(lines[1], (3, "let b = 2;"));
    }

    #[test]
    fn test_workspace_root_holds_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }
}
