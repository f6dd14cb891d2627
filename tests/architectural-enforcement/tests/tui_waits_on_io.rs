//! Integration Test: TUI Sleep Policy
//!
//! The TUI waits on terminal events or the next deadline in one place: the
//! `select!` in the app loop. Every other module is sleep-free.

use architectural_enforcement::{assert_clean, find_violations, rust_files, workspace_root};

#[test]
fn test_sleep_only_in_event_loop() {
    let violations = find_violations("tui/src", &["::sleep(", ".sleep("], |path| {
        path.ends_with("tui/src/app.rs")
    });
    assert_clean("TUI sleeps outside the event loop", &violations);
}

#[test]
fn test_event_loop_sleeps_until_next_wakeup() {
    let app = std::fs::read_to_string(workspace_root().join("tui/src/app.rs"))
        .expect("app.rs should be readable");
    let sleeps: Vec<&str> = app
        .lines()
        .filter(|l| l.contains("sleep(") && !l.trim_start().starts_with("//"))
        .collect();

    assert_eq!(sleeps.len(), 1, "expected exactly one sleep in the app loop");
    assert!(sleeps[0].contains("tokio::time::sleep"));
    assert!(app.contains("next_wakeup()"));
}

#[test]
fn test_no_threads_in_tui() {
    let violations = find_violations("tui/src", &["thread::spawn"], |_| false);
    assert_clean("TUI spawns OS threads", &violations);
    assert!(!rust_files("tui/src").is_empty());
}
