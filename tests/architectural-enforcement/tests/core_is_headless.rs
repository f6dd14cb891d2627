//! Integration Test: Headless Core
//!
//! `folio/core` is driven by a virtual clock. Its production code must not
//! sleep, spawn threads or tasks, read the wall clock, or touch the terminal.

use std::fs;

use architectural_enforcement::{assert_clean, find_violations, workspace_root};

const CORE_SRC: &str = "folio/core/src";

#[test]
fn test_no_sleep_in_core() {
    let violations = find_violations(CORE_SRC, &["::sleep(", ".sleep("], |_| false);
    assert_clean("Core code sleeps; schedule a task on the Scheduler instead", &violations);
}

#[test]
fn test_no_spawning_in_core() {
    let violations = find_violations(
        CORE_SRC,
        &["thread::spawn", "tokio::spawn", "spawn_blocking"],
        |_| false,
    );
    assert_clean("Core code spawns concurrent work", &violations);
}

#[test]
fn test_no_wall_clock_in_core() {
    let violations = find_violations(CORE_SRC, &["Instant::now", "SystemTime::now"], |_| false);
    assert_clean("Core code reads the wall clock; time comes from the Timeline", &violations);
}

#[test]
fn test_no_terminal_crates_in_core() {
    let violations = find_violations(CORE_SRC, &["ratatui", "crossterm", "tokio"], |_| false);
    assert_clean("Core code references a terminal or runtime crate", &violations);

    let manifest = fs::read_to_string(workspace_root().join("folio/core/Cargo.toml"))
        .expect("core manifest should be readable");
    for forbidden in ["ratatui", "crossterm", "tokio"] {
        assert!(
            !manifest.lines().any(|l| l.trim_start().starts_with(forbidden)),
            "folio-core must not depend on {forbidden}"
        );
    }
}

#[test]
fn test_no_unwrap_in_core() {
    let violations = find_violations(CORE_SRC, &[".unwrap()", ".expect("], |_| false);
    assert_clean("Core production code unwraps; propagate the error", &violations);
}
