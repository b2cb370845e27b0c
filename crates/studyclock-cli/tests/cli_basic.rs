//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own config directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(home, args, "")
}

fn run_cli_with_input(home: &Path, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_studyclock-cli"))
        .args(args)
        .env("STUDYCLOCK_HOME", home)
        .env_remove("STUDYCLOCK_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait for CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_config_get_default() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "valuation.target_seconds.CT"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "240");
    assert!(home.path().join("config.toml").exists());
}

#[test]
fn test_config_set_persists() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "preferences.auto_start", "true"]);
    assert_eq!(code, 0);

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "preferences.auto_start"]);
    assert_eq!(stdout.trim(), "true");
}

#[test]
fn test_config_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "nope.nothing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));

    let (_, _, code) = run_cli(home.path(), &["config", "set", "preferences.bogus", "1"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_list_json() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["break_policy"]["threshold_min"], 120);
    assert_eq!(parsed["valuation"]["target_seconds"]["MR"], 420);
}

#[test]
fn test_config_reset_needs_confirmation() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["config", "set", "valuation.target_seconds.CT", "999"]);

    let (stdout, _, code) = run_cli_with_input(home.path(), &["config", "reset"], "n\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("cancelled"));
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "valuation.target_seconds.CT"]);
    assert_eq!(stdout.trim(), "999");

    let (_, _, code) = run_cli(home.path(), &["config", "reset", "--yes"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "valuation.target_seconds.CT"]);
    assert_eq!(stdout.trim(), "240");
}

#[test]
fn test_config_export_import() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("tables.csv");
    let file_arg = file.to_str().unwrap();

    run_cli(home.path(), &["config", "set", "valuation.target_seconds.US", "200"]);
    let (_, _, code) = run_cli(home.path(), &["config", "export", file_arg]);
    assert_eq!(code, 0);
    let text = std::fs::read_to_string(&file).unwrap();
    assert!(text.starts_with("setting_type,key,value,kind\n"));
    assert!(text.contains("TargetDuration,US,200,\n"));

    run_cli(home.path(), &["config", "reset", "--yes"]);
    std::fs::write(&file, format!("{text}not,a,valid\n")).unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "import", file_arg]);
    assert_eq!(code, 0);
    assert!(stdout.contains("1 skipped"), "{stdout}");

    let (stdout, _, _) = run_cli(home.path(), &["config", "get", "valuation.target_seconds.US"]);
    assert_eq!(stdout.trim(), "200");
}

#[test]
fn test_session_script() {
    let home = tempfile::tempdir().unwrap();
    let script = "select ct contrast\nstart\nadmin\nadmin stop\nstatus\nquit\n";
    let (stdout, stderr, code) = run_cli_with_input(home.path(), &["session"], script);
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.contains("selected CT Contrast (target 5:00"));
    assert!(stdout.contains("session clock started"));
    assert!(stdout.contains("paused at"));
    assert!(stdout.contains("admin started"));
    assert!(stdout.contains("state: working"));
}

#[test]
fn test_session_ends_on_eof() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli_with_input(home.path(), &["session"], "start\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("no study selected"));
    assert!(stdout.contains("state: idle"));
}

#[test]
fn test_completions() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("studyclock-cli"));
}
